//! Currency, number and date formatting

use crate::locale::{currency_digits, Locale, SymbolPosition};
use crate::{FormatError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Format an amount as a localized currency string
///
/// # Examples
/// ```
/// use doc_format::format_currency;
/// assert_eq!(format_currency(1234.56, "USD", "en-US").unwrap(), "$1,234.56");
/// assert_eq!(format_currency(-5.0, "USD", "en-US").unwrap(), "-$5.00");
/// ```
///
/// # Errors
/// Returns [`FormatError::InvalidCurrency`] when `currency` is not a
/// three-letter code.
pub fn format_currency(amount: f64, currency: &str, locale: &str) -> Result<String> {
    let code = currency.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(FormatError::InvalidCurrency(currency.to_string()));
    }

    let locale = Locale::resolve(locale);

    if amount.is_nan() {
        return Ok("NaN".to_string());
    }

    let symbol = locale.currency_symbol(&code);
    let number = if amount.is_infinite() {
        "∞".to_string()
    } else {
        render_decimal(amount.abs(), currency_digits(&code), locale)
    };
    let sign = if amount < 0.0 && !is_rounded_zero(amount, currency_digits(&code)) {
        "-"
    } else {
        ""
    };

    let body = match locale.symbol_position {
        SymbolPosition::Prefix if symbol.chars().all(|c| c.is_ascii_alphabetic()) => {
            format!("{symbol}\u{a0}{number}")
        }
        SymbolPosition::Prefix => format!("{symbol}{number}"),
        SymbolPosition::PrefixSpaced => format!("{symbol}\u{a0}{number}"),
        SymbolPosition::Suffix => format!("{number}\u{a0}{symbol}"),
    };

    Ok(format!("{sign}{body}"))
}

/// Format an ISO-8601 date or date-time as a long localized date
///
/// The calendar date is taken as written in the input (no conversion to the
/// local time zone).
///
/// # Examples
/// ```
/// use doc_format::format_date_long;
/// assert_eq!(format_date_long("2024-07-30", "de-DE").unwrap(), "30. Juli 2024");
/// ```
pub fn format_date_long(iso: &str, locale: &str) -> Result<String> {
    let date = parse_iso_date(iso)?;
    Ok(Locale::resolve(locale).long_date(date.year(), date.month(), date.day()))
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` or an RFC 3339 timestamp
pub fn parse_iso_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M") {
        return Ok(dt.date());
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| FormatError::InvalidDate(format!("{text}. Expected YYYY-MM-DD")))
}

/// Render a non-negative number with fixed precision using locale separators
fn render_decimal(abs_n: f64, precision: u8, locale: &Locale) -> String {
    let multiplier = 10_f64.powi(precision as i32);
    let scaled = (abs_n * multiplier).round();

    let int_part = (scaled / multiplier).floor();
    let frac_part = (scaled - int_part * multiplier).round() as u64;

    let int_str = format_with_thousands(
        &format!("{int_part:.0}"),
        locale.group,
        locale.min_grouping_digits,
    );

    if precision > 0 {
        format!(
            "{int_str}{}{:0>width$}",
            locale.decimal,
            frac_part,
            width = precision as usize
        )
    } else {
        int_str
    }
}

fn is_rounded_zero(amount: f64, precision: u8) -> bool {
    (amount.abs() * 10_f64.powi(precision as i32)).round() == 0.0
}

/// Insert group separators into a string of integer digits
///
/// Grouping only applies once the integer part has at least
/// `3 + min_grouping` digits.
fn format_with_thousands(digits: &str, sep: &str, min_grouping: usize) -> String {
    if sep.is_empty() || digits.len() < 3 + min_grouping {
        return digits.to_string();
    }

    let mut result = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push_str(sep);
        }
        result.push(c);
    }

    result
}
