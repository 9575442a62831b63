//! Locale table for currency and date formatting

/// Locale used when a requested tag is unknown
pub const DEFAULT_LOCALE: &str = "en-US";

/// Where the currency symbol goes relative to the number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPosition {
    /// `$1,234.56` (a no-break space is inserted when the symbol is alphabetic)
    Prefix,
    /// `R$ 1.234,56`
    PrefixSpaced,
    /// `1.234,56 €`
    Suffix,
}

/// Long date layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePattern {
    /// `July 30, 2024`
    MonthDayYear,
    /// `30 July 2024`
    DayMonthYear,
    /// `30. Juli 2024`
    DayDotMonthYear,
    /// `30 de julio de 2024`
    DayDeMonthDeYear,
    /// `2024年7月30日`
    Cjk,
}

const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const MONTHS_DE: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

const MONTHS_IT: [&str; 12] = [
    "gennaio",
    "febbraio",
    "marzo",
    "aprile",
    "maggio",
    "giugno",
    "luglio",
    "agosto",
    "settembre",
    "ottobre",
    "novembre",
    "dicembre",
];

const MONTHS_PT: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Currency symbols as rendered by `en-US`
const DEFAULT_SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("JPY", "¥"),
    ("MXN", "MX$"),
    ("BRL", "R$"),
    ("CAD", "CA$"),
    ("AUD", "A$"),
    ("CNY", "CN¥"),
    ("INR", "₹"),
];

/// Formatting conventions of one locale
#[derive(Debug, Clone, Copy)]
pub struct Locale {
    /// BCP 47 tag
    pub tag: &'static str,
    /// Thousands separator
    pub group: &'static str,
    /// Decimal separator
    pub decimal: &'static str,
    /// Integer digits required before grouping kicks in (`es-ES` writes `1234`)
    pub min_grouping_digits: usize,
    /// Currency symbol placement
    pub symbol_position: SymbolPosition,
    symbols: &'static [(&'static str, &'static str)],
    months: &'static [&'static str; 12],
    date_pattern: DatePattern,
}

const LOCALES: &[Locale] = &[
    Locale {
        tag: "en-US",
        group: ",",
        decimal: ".",
        min_grouping_digits: 1,
        symbol_position: SymbolPosition::Prefix,
        symbols: &[],
        months: &MONTHS_EN,
        date_pattern: DatePattern::MonthDayYear,
    },
    Locale {
        tag: "en-GB",
        group: ",",
        decimal: ".",
        min_grouping_digits: 1,
        symbol_position: SymbolPosition::Prefix,
        symbols: &[("USD", "US$")],
        months: &MONTHS_EN,
        date_pattern: DatePattern::DayMonthYear,
    },
    Locale {
        tag: "es-ES",
        group: ".",
        decimal: ",",
        min_grouping_digits: 2,
        symbol_position: SymbolPosition::Suffix,
        symbols: &[("USD", "US$")],
        months: &MONTHS_ES,
        date_pattern: DatePattern::DayDeMonthDeYear,
    },
    Locale {
        tag: "es-MX",
        group: ",",
        decimal: ".",
        min_grouping_digits: 1,
        symbol_position: SymbolPosition::Prefix,
        symbols: &[("MXN", "$"), ("USD", "USD")],
        months: &MONTHS_ES,
        date_pattern: DatePattern::DayDeMonthDeYear,
    },
    Locale {
        tag: "de-DE",
        group: ".",
        decimal: ",",
        min_grouping_digits: 1,
        symbol_position: SymbolPosition::Suffix,
        symbols: &[],
        months: &MONTHS_DE,
        date_pattern: DatePattern::DayDotMonthYear,
    },
    Locale {
        tag: "fr-FR",
        group: "\u{202f}",
        decimal: ",",
        min_grouping_digits: 1,
        symbol_position: SymbolPosition::Suffix,
        symbols: &[("USD", "$US"), ("GBP", "£GB")],
        months: &MONTHS_FR,
        date_pattern: DatePattern::DayMonthYear,
    },
    Locale {
        tag: "it-IT",
        group: ".",
        decimal: ",",
        min_grouping_digits: 1,
        symbol_position: SymbolPosition::Suffix,
        symbols: &[],
        months: &MONTHS_IT,
        date_pattern: DatePattern::DayMonthYear,
    },
    Locale {
        tag: "pt-BR",
        group: ".",
        decimal: ",",
        min_grouping_digits: 1,
        symbol_position: SymbolPosition::PrefixSpaced,
        symbols: &[("USD", "US$")],
        months: &MONTHS_PT,
        date_pattern: DatePattern::DayDeMonthDeYear,
    },
    Locale {
        tag: "ja-JP",
        group: ",",
        decimal: ".",
        min_grouping_digits: 1,
        symbol_position: SymbolPosition::Prefix,
        symbols: &[("JPY", "￥"), ("CNY", "元")],
        months: &MONTHS_EN,
        date_pattern: DatePattern::Cjk,
    },
];

impl Locale {
    /// Look up a locale by tag
    ///
    /// Matching is case-insensitive and accepts `_` as separator. A bare
    /// language (`es`) or an unknown region (`es-AR`) resolves to the first
    /// locale of that language; anything else falls back to `en-US`.
    pub fn resolve(tag: &str) -> &'static Locale {
        let normalized = tag.trim().replace('_', "-");

        if let Some(locale) = LOCALES
            .iter()
            .find(|l| l.tag.eq_ignore_ascii_case(&normalized))
        {
            return locale;
        }

        let language = normalized.split('-').next().unwrap_or_default();
        LOCALES
            .iter()
            .find(|l| {
                l.tag
                    .split('-')
                    .next()
                    .is_some_and(|lang| lang.eq_ignore_ascii_case(language))
            })
            .unwrap_or(&LOCALES[0])
    }

    /// Symbol used for an ISO 4217 code in this locale (the code itself when unknown)
    pub fn currency_symbol<'a>(&self, code: &'a str) -> &'a str {
        self.symbols
            .iter()
            .chain(DEFAULT_SYMBOLS.iter())
            .find(|(c, _)| *c == code)
            .map(|(_, symbol)| *symbol)
            .unwrap_or(code)
    }

    /// Render a calendar date in the locale's long form
    pub fn long_date(&self, year: i32, month: u32, day: u32) -> String {
        let month_idx = (month.saturating_sub(1)) as usize;
        let month_name = self.months.get(month_idx).unwrap_or(&"");

        match self.date_pattern {
            DatePattern::MonthDayYear => format!("{month_name} {day}, {year}"),
            DatePattern::DayMonthYear => format!("{day} {month_name} {year}"),
            DatePattern::DayDotMonthYear => format!("{day}. {month_name} {year}"),
            DatePattern::DayDeMonthDeYear => format!("{day} de {month_name} de {year}"),
            DatePattern::Cjk => format!("{year}年{month}月{day}日"),
        }
    }
}

/// Number of fraction digits used for a currency
pub fn currency_digits(code: &str) -> u8 {
    match code {
        "JPY" | "KRW" | "CLP" | "VND" | "ISK" => 0,
        "BHD" | "KWD" | "OMR" | "TND" => 3,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_exact_and_case() {
        assert_eq!(Locale::resolve("de-DE").tag, "de-DE");
        assert_eq!(Locale::resolve("es_es").tag, "es-ES");
    }

    #[test]
    fn test_resolve_language_fallback() {
        assert_eq!(Locale::resolve("es").tag, "es-ES");
        assert_eq!(Locale::resolve("pt-PT").tag, "pt-BR");
        assert_eq!(Locale::resolve("xx-YY").tag, DEFAULT_LOCALE);
    }

    #[test]
    fn test_currency_symbol_overrides() {
        assert_eq!(Locale::resolve("en-US").currency_symbol("USD"), "$");
        assert_eq!(Locale::resolve("en-GB").currency_symbol("USD"), "US$");
        assert_eq!(Locale::resolve("es-MX").currency_symbol("MXN"), "$");
        assert_eq!(Locale::resolve("en-US").currency_symbol("CHF"), "CHF");
    }

    #[test]
    fn test_long_date_patterns() {
        assert_eq!(Locale::resolve("en-US").long_date(2024, 7, 30), "July 30, 2024");
        assert_eq!(Locale::resolve("en-GB").long_date(2024, 7, 30), "30 July 2024");
        assert_eq!(Locale::resolve("de-DE").long_date(2024, 3, 1), "1. März 2024");
        assert_eq!(Locale::resolve("ja-JP").long_date(2024, 7, 30), "2024年7月30日");
    }

    #[test]
    fn test_currency_digits() {
        assert_eq!(currency_digits("JPY"), 0);
        assert_eq!(currency_digits("EUR"), 2);
    }
}
