//! Sample payee catalogue, keyed by currency.
//!
//! Catalogue entries are fixed sample identities. `random_invalid` produces
//! records that have the right shape for the currency's scheme but carry no
//! valid checksum.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::generator;

/// Which payment-instruction fields a currency uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentScheme {
    /// Sort code + account number.
    SortCode,
    Iban,
    /// IBAN + SWIFT/BIC.
    IbanSwift,
}

impl PaymentScheme {
    pub fn for_currency(currency: Currency) -> Self {
        match currency {
            Currency::Gbp => PaymentScheme::SortCode,
            Currency::Eur => PaymentScheme::Iban,
            Currency::Usd => PaymentScheme::IbanSwift,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeeRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift_bic: Option<String>,
}

struct Entry {
    name: &'static str,
    sort_code: Option<&'static str>,
    account_number: Option<&'static str>,
    iban: Option<&'static str>,
    swift_bic: Option<&'static str>,
}

const fn uk(name: &'static str, sort_code: &'static str, account_number: &'static str) -> Entry {
    Entry {
        name,
        sort_code: Some(sort_code),
        account_number: Some(account_number),
        iban: None,
        swift_bic: None,
    }
}

const fn sepa(name: &'static str, iban: &'static str) -> Entry {
    Entry { name, sort_code: None, account_number: None, iban: Some(iban), swift_bic: None }
}

const fn swift(name: &'static str, iban: &'static str, bic: &'static str) -> Entry {
    Entry { name, sort_code: None, account_number: None, iban: Some(iban), swift_bic: Some(bic) }
}

const GBP_PAYEES: &[Entry] = &[
    uk("British Heart Foundation (BHF)", "20-03-53", "90845388"),
    uk("Islamic Relief UK", "20-07-71", "10966177"),
    uk("Right to Life Charitable Trust", "40-52-40", "00013088"),
    uk("Hope After Harm (Thames Valley Partnership)", "20-85-73", "30726133"),
    uk("Groundwork (GVA Charity)", "60-02-35", "67387640"),
    uk("MWL NHS Charity", "60-70-80", "10003274"),
    uk("Doctors for Nepal (Brighton)", "30-91-25", "00284204"),
    uk("Friends of NAS UK", "60-13-15", "44894074"),
    uk("Withy Trees Welfare & Education", "16-20-16", "10256436"),
    uk("The Kvell Project", "30-94-35", "12782160"),
    uk("Friends of Earls Hall Schools", "30-97-84", "00325889"),
    uk("Lighthouse Gospel Ministries", "20-66-51", "43228118"),
];

const EUR_PAYEES: &[Entry] = &[
    sepa("Stiftung Lesefreunde Rheinland", "DE27 3705 0198 0004 8163 92"),
    sepa("Association Jardins Partagés de Lyon", "FR14 2004 1010 0505 0001 3M02 606"),
    sepa("Fondazione Amici del Borgo", "IT60 X054 2811 1010 0000 0123 456"),
    sepa("Stichting Fietsbank Utrecht", "NL91 ABNA 0417 1643 00"),
];

const USD_PAYEES: &[Entry] = &[
    swift("Harbor Light Community Fund", "DE44 5001 0517 5407 3249 31", "INGDDEFFXXX"),
    swift("Open Fields Relief Network", "FR76 3000 6000 0112 3456 7890 189", "AGRIFRPP"),
    swift("Riverside Literacy Alliance", "NL02 ABNA 0123 4567 89", "ABNANL2A"),
];

impl Entry {
    fn to_record(&self) -> PayeeRecord {
        PayeeRecord {
            name: self.name.to_string(),
            sort_code: self.sort_code.map(str::to_string),
            account_number: self.account_number.map(str::to_string),
            iban: self.iban.map(str::to_string),
            swift_bic: self.swift_bic.map(str::to_string),
        }
    }
}

fn entries(currency: Currency) -> &'static [Entry] {
    match currency {
        Currency::Gbp => GBP_PAYEES,
        Currency::Eur => EUR_PAYEES,
        Currency::Usd => USD_PAYEES,
    }
}

/// Catalogue entries for `currency`, in display order.
pub fn by_currency(currency: Currency) -> Vec<PayeeRecord> {
    entries(currency).iter().map(Entry::to_record).collect()
}

/// Catalogue lookup by raw code. Unsupported codes yield an empty list.
pub fn by_code(code: &str) -> Vec<PayeeRecord> {
    code.parse::<Currency>().map(by_currency).unwrap_or_default()
}

/// First catalogue entry, the payee a fresh invoice starts with.
pub fn default_payee(currency: Currency) -> Option<PayeeRecord> {
    entries(currency).first().map(Entry::to_record)
}

/// Pseudo-country IBAN layouts: (country, segment shapes after the check digits).
/// `'9'` is a random digit, `'A'` a random upper-case letter.
const IBAN_LAYOUTS: [(&str, &[&str]); 3] = [
    ("DE", &["99999999", "9999999999"]),
    ("FR", &["99999", "99999", "99999999999"]),
    ("IT", &["A", "999", "A", "999999999999999"]),
];

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn fill_pattern<R: Rng + ?Sized>(pattern: &str, rng: &mut R) -> String {
    pattern
        .chars()
        .map(|c| match c {
            '9' => char::from(b'0' + rng.gen_range(0..10u8)),
            'A' => char::from(LETTERS[rng.gen_range(0..LETTERS.len())]),
            other => other,
        })
        .collect()
}

/// Splits `raw` into space-separated blocks of four characters.
pub fn group_in_fours(raw: &str) -> String {
    raw.chars()
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

fn random_iban<R: Rng + ?Sized>(rng: &mut R) -> String {
    let (country, segments) = IBAN_LAYOUTS.choose(rng).copied().unwrap_or(IBAN_LAYOUTS[0]);
    let check = format!("{:02}", rng.gen_range(0..100));
    let body: String = segments.iter().map(|s| fill_pattern(s, rng)).collect();
    group_in_fours(&format!("{country}{check}{body}"))
}

fn random_swift<R: Rng + ?Sized>(rng: &mut R) -> String {
    let country = ["DE", "FR", "IT", "NL", "US"].choose(rng).copied().unwrap_or("US");
    format!("{}{}{}", fill_pattern("AAAA", rng), country, fill_pattern("A9", rng))
}

fn random_sort_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{:02}-{:02}-{:02}",
        rng.gen_range(0..99),
        rng.gen_range(0..99),
        rng.gen_range(0..99)
    )
}

/// A plausible-looking, unvalidated payee for `currency`. Fresh on every call.
pub fn random_invalid<R: Rng + ?Sized>(currency: Currency, rng: &mut R) -> PayeeRecord {
    let name = generator::company_name(rng);
    match PaymentScheme::for_currency(currency) {
        PaymentScheme::SortCode => PayeeRecord {
            name,
            sort_code: Some(random_sort_code(rng)),
            account_number: Some(format!("{:08}", rng.gen_range(0..99_999_999u32))),
            iban: None,
            swift_bic: None,
        },
        PaymentScheme::Iban => PayeeRecord {
            name,
            sort_code: None,
            account_number: None,
            iban: Some(random_iban(rng)),
            swift_bic: None,
        },
        PaymentScheme::IbanSwift => PayeeRecord {
            name,
            sort_code: None,
            account_number: None,
            iban: Some(random_iban(rng)),
            swift_bic: Some(random_swift(rng)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use regex::Regex;

    #[test]
    fn every_currency_has_a_default_payee() {
        for currency in Currency::ALL {
            let first = default_payee(currency).expect("catalogue is empty");
            assert_eq!(first, by_currency(currency)[0]);
        }
    }

    #[test]
    fn catalogue_shapes_match_scheme() {
        for record in by_currency(Currency::Gbp) {
            assert!(record.sort_code.is_some() && record.account_number.is_some());
            assert!(record.iban.is_none());
        }
        for record in by_currency(Currency::Eur) {
            assert!(record.iban.is_some() && record.swift_bic.is_none());
        }
        for record in by_currency(Currency::Usd) {
            assert!(record.iban.is_some() && record.swift_bic.is_some());
        }
    }

    #[test]
    fn unsupported_code_is_empty() {
        assert!(by_code("CHF").is_empty());
        assert_eq!(by_code("gbp").len(), 12);
    }

    #[test]
    fn groups_in_blocks_of_four() {
        assert_eq!(group_in_fours("DE12345678"), "DE12 3456 78");
        assert_eq!(group_in_fours(""), "");
    }

    fn assert_iban_shape(iban: &str) {
        let layouts = [
            Regex::new(r"^DE\d{20}$").unwrap(),
            Regex::new(r"^FR\d{23}$").unwrap(),
            Regex::new(r"^IT\d{2}[A-Z]\d{3}[A-Z]\d{15}$").unwrap(),
        ];
        let compact: String = iban.chars().filter(|c| *c != ' ').collect();
        assert!(layouts.iter().any(|re| re.is_match(&compact)), "{iban}");

        let blocks: Vec<&str> = iban.split(' ').collect();
        let (last, full) = blocks.split_last().unwrap();
        assert!(full.iter().all(|block| block.len() == 4), "{iban}");
        assert!((1..=4).contains(&last.len()), "{iban}");
        assert_eq!(group_in_fours(&compact), iban);
    }

    #[test]
    fn random_iban_matches_a_known_layout() {
        let mut rng = StdRng::seed_from_u64(7);
        for currency in [Currency::Eur, Currency::Usd] {
            for _ in 0..50 {
                let record = random_invalid(currency, &mut rng);
                assert_iban_shape(&record.iban.unwrap());
            }
        }
    }

    #[test]
    fn random_usd_payee_has_swift() {
        let mut rng = StdRng::seed_from_u64(11);
        let record = random_invalid(Currency::Usd, &mut rng);
        let bic = record.swift_bic.unwrap();
        assert_eq!(bic.len(), 8);
        assert!(bic[..6].chars().all(|c| c.is_ascii_uppercase()));
    }
}
