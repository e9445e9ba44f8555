//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a record count, e.g. `1 record`, `40 records`.
///
/// Usage in templates: `{{ total|records }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn records(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let count = count.to_string();
    let noun = if count == "1" { "record" } else { "records" };
    Ok(format!("{count} {noun}"))
}
