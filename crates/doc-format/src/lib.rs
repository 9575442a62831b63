//! Doc Format - locale-aware formatting for rendered documents
//!
//! This crate provides:
//! - Localized currency formatting (symbols, separators, fraction digits)
//! - Locale-aware digit grouping (`1,234.56`, `1.234,56`, `1234,56`)
//! - Long localized dates (`30 de julio de 2024`, `July 30, 2024`)
//!
//! # Example
//!
//! ```
//! use doc_format::{format_currency, format_date_long};
//!
//! assert_eq!(format_currency(1234.5, "USD", "en-US").unwrap(), "$1,234.50");
//! assert_eq!(format_date_long("2024-07-30", "en-US").unwrap(), "July 30, 2024");
//! ```

mod formatter;
mod locale;

pub use formatter::{format_currency, format_date_long, parse_iso_date};
pub use locale::{currency_digits, Locale, SymbolPosition, DEFAULT_LOCALE};

use thiserror::Error;

/// Errors that can occur during formatting
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for formatting operations
pub type Result<T> = std::result::Result<T, FormatError>;
