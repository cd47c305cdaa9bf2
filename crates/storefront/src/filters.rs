//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Formats a badge count, capping large values.
///
/// Usage in templates: `{{ header.cart_count|badge }}`
#[askama::filter_fn]
pub fn badge(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = count.to_string();
    Ok(match text.parse::<u64>() {
        Ok(n) if n > 99 => "99+".to_string(),
        _ => text,
    })
}
