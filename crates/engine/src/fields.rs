//! Form field names and the validated set of expense values.

use std::collections::HashMap;

use crate::{EngineError, ResultEngine};

pub const DATE: &str = "Date";
pub const AMOUNT: &str = "Amount";
pub const DESCRIPTION: &str = "Description";
pub const SPREADSHEET_URL: &str = "Spreadsheet URL";
pub const SHEET_NAME: &str = "Sheet Name";

/// Header of the id column of an expenses spreadsheet.
pub const ID_HEADER: &str = "Expense ID";

/// Fields stored in a row after the id cell, in column order.
pub const EXPENSE_FIELDS: [&str; 3] = [DATE, AMOUNT, DESCRIPTION];

/// Values of one expense, all guaranteed non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseFields {
    date: String,
    amount: String,
    description: String,
}

impl ExpenseFields {
    /// Validate the three values in column order.
    ///
    /// The error names the first empty field.
    pub fn new(date: &str, amount: &str, description: &str) -> ResultEngine<Self> {
        Ok(Self {
            date: non_empty(DATE, Some(date))?.to_string(),
            amount: non_empty(AMOUNT, Some(amount))?.to_string(),
            description: non_empty(DESCRIPTION, Some(description))?.to_string(),
        })
    }

    /// Extract the expense values from a submitted form.
    pub fn from_form(form: &HashMap<String, String>) -> ResultEngine<Self> {
        Ok(Self {
            date: required(form, DATE)?.to_string(),
            amount: required(form, AMOUNT)?.to_string(),
            description: required(form, DESCRIPTION)?.to_string(),
        })
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Row cells following the id cell.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.amount.clone(),
            self.description.clone(),
        ]
    }
}

/// Validate a create form: expense values first, then the spreadsheet URL.
pub fn parse_create_form(form: &HashMap<String, String>) -> ResultEngine<(String, ExpenseFields)> {
    let fields = ExpenseFields::from_form(form)?;
    let location = required(form, SPREADSHEET_URL)?.to_string();
    Ok((location, fields))
}

/// Return the value of `field`, failing when it is absent or blank.
pub fn required<'a>(form: &'a HashMap<String, String>, field: &str) -> ResultEngine<&'a str> {
    non_empty(field, form.get(field).map(String::as_str))
}

pub(crate) fn non_empty<'a>(field: &str, value: Option<&'a str>) -> ResultEngine<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(EngineError::missing(field)),
    }
}
