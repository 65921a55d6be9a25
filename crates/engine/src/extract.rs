//! Prefill values derived from the email a user is reading.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use crate::Amount;

static DOLLAR_AMOUNT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\$[\d,]+\.\d\d")
        .map_err(|err| tracing::error!("dollar amount regex init failed: {err}"))
        .ok()
});

/// Largest dollar amount (`$1,234.56` style) found in `text`, formatted
/// without thousands separators.
///
/// Returns `None` when nothing matches or every match is zero.
pub fn largest_amount(text: &str) -> Option<String> {
    let regex = DOLLAR_AMOUNT.as_ref()?;
    regex
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<Amount>().ok())
        .max()
        .filter(|amount| !amount.is_zero())
        .map(|amount| amount.to_string())
}

/// Date the message was received, as `M/D/YYYY`.
pub fn received_date(date: DateTime<FixedOffset>) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Expense description built from the sender and the subject.
pub fn expense_description(sender: &str, subject: &str) -> String {
    format!("{sender} | {subject}")
}
