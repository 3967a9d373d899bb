use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bank::PayeeRecord;
use crate::currency::Currency;

/// A quantity or unit price as typed into the form.
///
/// `Empty` is a cleared field and is not the same as `Number(0.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Amount {
    Number(f64),
    #[default]
    Empty,
}

impl Amount {
    /// Parses form input. Blank, non-numeric and non-finite text is `Empty`.
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Amount::Number(n),
            _ => Amount::Empty,
        }
    }

    pub fn as_number(self) -> Option<f64> {
        match self {
            Amount::Number(n) => Some(n),
            Amount::Empty => None,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(n) => write!(f, "{n}"),
            Amount::Empty => Ok(()),
        }
    }
}

// Snapshots write the empty marker as "" so the cleared state survives a round trip.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Amount::Number(n) => serializer.serialize_f64(*n),
            Amount::Empty => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Amount::Number(n),
            Raw::Text(text) => Amount::parse(&text),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub description: String,
    pub quantity: Amount,
    pub unit_price: Amount,
    /// Derived from quantity and unit price; never edited directly.
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Issuer {
    /// Mirrors the selected payee's name.
    pub company_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub vat_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    pub address: String,
    pub email: String,
}

/// Payment instructions. Which fields are shown depends on the invoice currency;
/// fields belonging to other schemes may hold stale values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub account_name: String,
    pub sort_code: String,
    pub account_number: String,
    pub iban: String,
    pub swift_bic: String,
}

impl PaymentDetails {
    pub fn from_payee(payee: &PayeeRecord) -> Self {
        let mut details = PaymentDetails::default();
        details.overwrite_with(payee);
        details
    }

    /// Copies the fields the payee carries, leaving the rest untouched.
    pub fn overwrite_with(&mut self, payee: &PayeeRecord) {
        self.account_name = payee.name.clone();
        if let Some(sort_code) = &payee.sort_code {
            self.sort_code = sort_code.clone();
        }
        if let Some(account_number) = &payee.account_number {
            self.account_number = account_number.clone();
        }
        if let Some(iban) = &payee.iban {
            self.iban = iban.clone();
        }
        if let Some(swift_bic) = &payee.swift_bic {
            self.swift_bic = swift_bic.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_number: String,
    pub issue_date: String,
    pub due_date: String,
    pub issuer: Issuer,
    pub client: Client,
    pub payment: PaymentDetails,
    pub currency: Currency,
    pub items: Vec<Item>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_treats_blank_and_garbage_as_empty() {
        assert_eq!(Amount::parse(""), Amount::Empty);
        assert_eq!(Amount::parse("   "), Amount::Empty);
        assert_eq!(Amount::parse("abc"), Amount::Empty);
        assert_eq!(Amount::parse("NaN"), Amount::Empty);
        assert_eq!(Amount::parse("inf"), Amount::Empty);
        assert_eq!(Amount::parse(" 3 "), Amount::Number(3.0));
        assert_eq!(Amount::parse("0"), Amount::Number(0.0));
    }

    #[test]
    fn empty_displays_blank() {
        assert_eq!(Amount::Empty.to_string(), "");
        assert_eq!(Amount::Number(2.5).to_string(), "2.5");
        assert_eq!(Amount::parse(&Amount::Empty.to_string()), Amount::Empty);
    }

    #[test]
    fn amount_json_keeps_empty_marker() {
        let item = Item {
            description: "Desk".into(),
            quantity: Amount::Empty,
            unit_price: Amount::Number(50.0),
            total: 50.0,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["quantity"], "");
        assert_eq!(json["unit_price"], 50.0);

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn overwrite_keeps_fields_the_payee_lacks() {
        let mut details = PaymentDetails {
            account_name: "Old".into(),
            sort_code: "11-22-33".into(),
            account_number: "12345678".into(),
            iban: String::new(),
            swift_bic: String::new(),
        };
        let payee = PayeeRecord {
            name: "New".into(),
            sort_code: None,
            account_number: None,
            iban: Some("DE00 1234".into()),
            swift_bic: None,
        };
        details.overwrite_with(&payee);
        assert_eq!(details.account_name, "New");
        assert_eq!(details.iban, "DE00 1234");
        assert_eq!(details.sort_code, "11-22-33");
    }
}
