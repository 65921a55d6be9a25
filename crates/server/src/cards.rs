//! Cards rendered back to the mail client.
//!
//! Every function here is pure: the caller reads the counter and the active
//! spreadsheet beforehand and passes them in.

use std::collections::HashMap;

use api_types::card::{
    Button, Card, CardAction, CardHeader, OnClick, Section, Status, StatusKind, Widget,
};
use engine::fields::{AMOUNT, DATE, DESCRIPTION, SHEET_NAME, SPREADSHEET_URL};

/// Name of the action parameter carrying the status across a clear.
pub const STATUS_PARAM: &str = "Status";

pub const SUBMIT_ACTION: &str = "submitForm";
pub const EDIT_ACTION: &str = "editForm";
pub const NEW_SHEET_ACTION: &str = "createExpensesSheet";
pub const CLEAR_ACTION: &str = "clearForm";
pub const CLEAR_EDIT_ACTION: &str = "clearEditForm";

const ERROR_PREFIX: &str = "Error: ";

/// Values shown in the form inputs of a card.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prefills {
    pub date: Option<String>,
    pub amount: Option<String>,
    pub description: Option<String>,
    pub spreadsheet_url: Option<String>,
}

impl Prefills {
    /// Carry the submitted values over to the next card.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let value = |field: &str| form.get(field).filter(|v| !v.is_empty()).cloned();
        Self {
            date: value(DATE),
            amount: value(AMOUNT),
            description: value(DESCRIPTION),
            spreadsheet_url: value(SPREADSHEET_URL),
        }
    }
}

/// Status banner; its kind is derived from the `Error: ` prefix.
pub fn status(text: &str) -> Status {
    let kind = if text.starts_with(ERROR_PREFIX) {
        StatusKind::Error
    } else {
        StatusKind::Success
    };
    Status {
        kind,
        text: text.to_string(),
        color: kind.color().to_string(),
    }
}

/// Format a failure as a status string.
pub fn error_status(message: impl std::fmt::Display) -> String {
    format!("{ERROR_PREFIX}{message}")
}

/// The "Log Your Expense" card.
pub fn expenses_card(prefills: &Prefills, status_text: Option<&str>, counter: u64) -> Card {
    let mut sections = status_section(status_text);

    let mut form = vec![paragraph(format!("Expense ID #{counter}"))];
    form.push(input(DATE, prefills.date.as_deref()));
    form.push(input(AMOUNT, prefills.amount.as_deref()));
    form.push(input(DESCRIPTION, prefills.description.as_deref()));
    form.push(input(SPREADSHEET_URL, prefills.spreadsheet_url.as_deref()));
    form.push(buttons(vec![action_button("Submit", SUBMIT_ACTION)]));
    sections.push(Section { widgets: form });

    sections.push(Section {
        widgets: vec![
            input(SHEET_NAME, None),
            buttons(vec![action_button("New Sheet", NEW_SHEET_ACTION)]),
        ],
    });

    Card {
        header: header("Log Your Expense"),
        sections,
        actions: vec![clear_action(CLEAR_ACTION, status_text)],
    }
}

/// The "Edit Your Expense" card for the most recent record, `latest`.
pub fn edit_card(
    prefills: &Prefills,
    status_text: Option<&str>,
    latest: Option<u64>,
    active_location: Option<&str>,
) -> Card {
    let mut sections = status_section(status_text);

    let title = match latest {
        Some(id) => format!("Expense ID #{id}"),
        None => "No expense logged yet".to_string(),
    };
    let mut form = vec![paragraph(title)];
    form.push(input(DATE, prefills.date.as_deref()));
    form.push(input(AMOUNT, prefills.amount.as_deref()));
    form.push(input(DESCRIPTION, prefills.description.as_deref()));
    form.push(buttons(vec![action_button("Edit", EDIT_ACTION)]));
    sections.push(Section { widgets: form });

    if let Some(url) = active_location {
        sections.push(Section {
            widgets: vec![buttons(vec![Button {
                text: "Open Spreadsheet".to_string(),
                on_click: OnClick::OpenUrl {
                    url: url.to_string(),
                },
            }])],
        });
    }

    Card {
        header: header("Edit Your Expense"),
        sections,
        actions: vec![clear_action(CLEAR_EDIT_ACTION, status_text)],
    }
}

fn header(title: &str) -> CardHeader {
    CardHeader {
        title: title.to_string(),
    }
}

fn status_section(status_text: Option<&str>) -> Vec<Section> {
    status_text
        .filter(|text| !text.is_empty())
        .map(|text| Section {
            widgets: vec![Widget::Status(status(text))],
        })
        .into_iter()
        .collect()
}

fn paragraph(text: String) -> Widget {
    Widget::TextParagraph { text }
}

fn input(name: &str, value: Option<&str>) -> Widget {
    Widget::TextInput {
        name: name.to_string(),
        title: name.to_string(),
        value: value.map(ToString::to_string),
    }
}

fn buttons(buttons: Vec<Button>) -> Widget {
    Widget::ButtonSet { buttons }
}

fn action_button(text: &str, function: &str) -> Button {
    Button {
        text: text.to_string(),
        on_click: OnClick::Action {
            function: function.to_string(),
            parameters: HashMap::new(),
        },
    }
}

fn clear_action(function: &str, status_text: Option<&str>) -> CardAction {
    let parameters = HashMap::from([(
        STATUS_PARAM.to_string(),
        status_text.unwrap_or_default().to_string(),
    )]);
    CardAction {
        text: "Clear form".to_string(),
        on_click: OnClick::Action {
            function: function.to_string(),
            parameters,
        },
    }
}
