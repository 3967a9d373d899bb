use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Gbp,
    Eur,
    Usd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub flag: &'static str,
}

/// Display order; the first entry is the default currency.
pub const CURRENCIES: [CurrencyInfo; 3] = [
    CurrencyInfo { code: "GBP", name: "British Pound", symbol: "£", flag: "🇬🇧" },
    CurrencyInfo { code: "EUR", name: "Euro", symbol: "€", flag: "🇪🇺" },
    CurrencyInfo { code: "USD", name: "US Dollar", symbol: "$", flag: "🇺🇸" },
];

pub fn lookup(code: &str) -> Option<&'static CurrencyInfo> {
    let code = code.trim();
    CURRENCIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

pub fn default_currency() -> &'static CurrencyInfo {
    &CURRENCIES[0]
}

/// Symbol for `code`, or the default currency's symbol when the code is unknown.
pub fn symbol_for(code: &str) -> &'static str {
    lookup(code).unwrap_or_else(default_currency).symbol
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Usd];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }

    pub fn info(self) -> &'static CurrencyInfo {
        lookup(self.code()).unwrap_or_else(default_currency)
    }

    pub fn symbol(self) -> &'static str {
        self.info().symbol
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownCurrency(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("eur").map(|c| c.symbol), Some("€"));
        assert_eq!(lookup(" GBP ").map(|c| c.name), Some("British Pound"));
    }

    #[test]
    fn unknown_code_falls_back_to_pound() {
        assert!(lookup("JPY").is_none());
        assert_eq!(symbol_for("JPY"), "£");
        assert_eq!(symbol_for(""), "£");
    }

    #[test]
    fn parses_and_displays_codes() {
        assert_eq!("usd".parse::<Currency>().ok(), Some(Currency::Usd));
        assert_eq!(Currency::Eur.to_string(), "EUR");
        assert!("XYZ".parse::<Currency>().is_err());
    }

    #[test]
    fn serializes_as_iso_code() {
        let json = serde_json::to_string(&Currency::Gbp).unwrap();
        assert_eq!(json, "\"GBP\"");
    }
}
