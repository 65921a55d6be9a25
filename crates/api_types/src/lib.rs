use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub mod addon {
    use super::*;

    /// The message currently open in the mail client.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MessageContext {
        pub from: String,
        pub subject: String,
        pub date: DateTime<FixedOffset>,
        /// Plain-text body.
        pub body: String,
    }

    /// A form submission or a card action click.
    ///
    /// `form_input` maps input names to their current values; `parameters`
    /// carries the parameters attached to the clicked action.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct FormAction {
        #[serde(default)]
        pub form_input: HashMap<String, String>,
        #[serde(default)]
        pub parameters: HashMap<String, String>,
    }
}

pub mod card {
    use super::*;

    /// A card rendered by the mail client.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Card {
        pub header: CardHeader,
        pub sections: Vec<Section>,
        pub actions: Vec<CardAction>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CardHeader {
        pub title: String,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Section {
        pub widgets: Vec<Widget>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Widget {
        /// Status banner shown at the top of a card.
        Status(Status),
        TextParagraph {
            text: String,
        },
        TextInput {
            name: String,
            title: String,
            value: Option<String>,
        },
        ButtonSet {
            buttons: Vec<Button>,
        },
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Button {
        pub text: String,
        pub on_click: OnClick,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum OnClick {
        /// Invoke a server action with the card's form input.
        Action {
            function: String,
            #[serde(default)]
            parameters: HashMap<String, String>,
        },
        OpenUrl {
            url: String,
        },
    }

    /// Entry of the card's overflow menu.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CardAction {
        pub text: String,
        pub on_click: OnClick,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum StatusKind {
        Success,
        Error,
    }

    impl StatusKind {
        /// Text color used to render the status.
        pub fn color(self) -> &'static str {
            match self {
                Self::Success => "#228B22",
                Self::Error => "#FF0000",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Status {
        pub kind: StatusKind,
        pub text: String,
        pub color: String,
    }
}

pub mod state {
    use super::*;

    /// Expense state of the authenticated user.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseState {
        /// Id the next logged expense will receive.
        pub counter: u64,
        pub active_location: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::card::*;

    #[test]
    fn widgets_are_tagged_by_type() {
        let widget = Widget::TextInput {
            name: "Date".to_string(),
            title: "Date".to_string(),
            value: None,
        };
        let json = serde_json::to_value(&widget).unwrap();
        assert_eq!(json["type"], "text_input");
        assert_eq!(json["name"], "Date");
    }

    #[test]
    fn open_url_round_trips() {
        let click: OnClick =
            serde_json::from_str(r#"{"type":"open_url","url":"https://x.test"}"#).unwrap();
        assert_eq!(
            click,
            OnClick::OpenUrl {
                url: "https://x.test".to_string()
            }
        );
    }
}
