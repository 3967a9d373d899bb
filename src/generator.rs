//! Synthetic invoice data.

use chrono::{Duration, Local, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::bank;
use crate::currency::Currency;
use crate::model::{Amount, Client, Invoice, Issuer, Item, PaymentDetails};
use crate::totals;

const DATE_FORMAT: &str = "%d/%m/%Y";
const ITEMS_PER_INVOICE: usize = 2;

const FIRST_NAMES: &[&str] = &[
    "Amelia", "Oliver", "Isla", "George", "Ava", "Noah", "Freya", "Arthur", "Priya", "Mohammed",
    "Grace", "Leo", "Sofia", "Harry", "Chloe", "Kwame", "Niamh", "Tomasz", "Ella", "Rhys",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Jones", "Taylor", "Brown", "Williams", "Wilson", "Johnson", "Davies", "Patel",
    "Robinson", "Wright", "Thompson", "Evans", "Walker", "White", "Roberts", "Green", "Hall",
    "Khan", "Okafor", "Murphy", "Kowalski",
];

const COMPANY_SUFFIXES: &[&str] = &["Ltd", "LLC", "Group", "and Sons", "Inc", "Partners", "& Co"];

const STREETS: &[&str] = &[
    "High Street", "Station Road", "Church Lane", "Victoria Road", "Mill Lane", "Park Avenue",
    "Queens Road", "Kings Way", "The Green", "Manor Close",
];

const TOWNS: &[&str] = &[
    "Bristol", "Leeds", "Norwich", "Cardiff", "York", "Brighton", "Exeter", "Sheffield",
    "Reading", "Dundee",
];

const ADJECTIVES: &[&str] = &[
    "Handcrafted", "Ergonomic", "Rustic", "Sleek", "Refined", "Practical", "Recycled", "Generic",
    "Gorgeous", "Licensed", "Modern", "Tasty",
];

const MATERIALS: &[&str] = &[
    "Wooden", "Steel", "Cotton", "Granite", "Bamboo", "Plastic", "Bronze", "Rubber", "Frozen",
    "Concrete",
];

const PRODUCTS: &[&str] = &[
    "Chair", "Table", "Keyboard", "Lamp", "Towels", "Bike", "Shirt", "Gloves", "Cheese",
    "Sausages", "Hat", "Computer", "Ball", "Soap",
];

const MAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];

fn pick<R: Rng + ?Sized>(words: &'static [&'static str], rng: &mut R) -> &'static str {
    words.choose(rng).copied().unwrap_or_default()
}

pub fn company_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    match rng.gen_range(0..3) {
        0 => format!("{} {}", pick(LAST_NAMES, rng), pick(COMPANY_SUFFIXES, rng)),
        1 => format!("{} - {}", pick(LAST_NAMES, rng), pick(LAST_NAMES, rng)),
        _ => format!(
            "{}, {} and {}",
            pick(LAST_NAMES, rng),
            pick(LAST_NAMES, rng),
            pick(LAST_NAMES, rng)
        ),
    }
}

pub fn full_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", pick(FIRST_NAMES, rng), pick(LAST_NAMES, rng))
}

pub fn street_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{} {}, {}",
        rng.gen_range(1..200),
        pick(STREETS, rng),
        pick(TOWNS, rng)
    )
}

pub fn email<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}.{}{}@{}",
        pick(FIRST_NAMES, rng).to_lowercase(),
        pick(LAST_NAMES, rng).to_lowercase(),
        rng.gen_range(1..100),
        pick(MAIL_DOMAINS, rng)
    )
}

fn phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("07{:03} {:06}", rng.gen_range(0..1000), rng.gen_range(0..1_000_000))
}

fn product_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{} {} {}",
        pick(ADJECTIVES, rng),
        pick(MATERIALS, rng),
        pick(PRODUCTS, rng)
    )
}

pub fn random_item<R: Rng + ?Sized>(rng: &mut R) -> Item {
    let quantity = Amount::Number(f64::from(rng.gen_range(1..=10u32)));
    // Two-decimal price, 10.00 ..= 500.00.
    let cents = rng.gen_range(1_000..=50_000u32);
    let unit_price = Amount::Number(f64::from(cents) / 100.0);
    let mut item = Item {
        description: product_name(rng),
        quantity,
        unit_price,
        total: 0.0,
    };
    item.total = totals::item_total(&item);
    item
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// A fresh invoice in `currency`, paid to the currency's first catalogue payee.
pub fn generate<R: Rng + ?Sized>(currency: Currency, rng: &mut R) -> Invoice {
    let today = Local::now().date_naive();
    let issued = today - Duration::days(rng.gen_range(0..30));
    let due = today + Duration::days(rng.gen_range(1..=30));

    let payee = bank::default_payee(currency);
    let payment = payee.as_ref().map(PaymentDetails::from_payee).unwrap_or_default();
    let issuer_name = payee.map(|p| p.name).unwrap_or_else(|| company_name(rng));

    Invoice {
        invoice_number: format!("INV-{}", rng.gen_range(1000..=9999)),
        issue_date: format_date(issued),
        due_date: format_date(due),
        issuer: Issuer {
            company_name: issuer_name,
            address: street_address(rng),
            phone: phone(rng),
            email: email(rng),
            vat_number: format!("GB{}", rng.gen_range(100_000_000..=999_999_999u32)),
        },
        client: Client {
            name: full_name(rng),
            address: street_address(rng),
            email: email(rng),
        },
        payment,
        currency,
        items: (0..ITEMS_PER_INVOICE).map(|_| random_item(rng)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_invoice_uses_first_payee() {
        let mut rng = StdRng::seed_from_u64(1);
        let invoice = generate(Currency::Eur, &mut rng);
        let payee = bank::default_payee(Currency::Eur).unwrap();
        assert_eq!(invoice.currency, Currency::Eur);
        assert_eq!(invoice.issuer.company_name, payee.name);
        assert_eq!(invoice.payment.account_name, payee.name);
        assert_eq!(Some(invoice.payment.iban.clone()), payee.iban);
    }

    #[test]
    fn generated_items_are_consistent() {
        let mut rng = StdRng::seed_from_u64(2);
        let invoice = generate(Currency::Gbp, &mut rng);
        assert_eq!(invoice.items.len(), ITEMS_PER_INVOICE);
        for item in &invoice.items {
            let (Amount::Number(q), Amount::Number(p)) = (item.quantity, item.unit_price) else {
                panic!("generator produced an empty amount");
            };
            assert!((1.0..=10.0).contains(&q));
            assert!((10.0..=500.0).contains(&p));
            assert_eq!(item.total, q * p);
        }
    }

    #[test]
    fn header_fields_have_expected_shape() {
        let mut rng = StdRng::seed_from_u64(3);
        let invoice = generate(Currency::Gbp, &mut rng);
        let number: u32 = invoice.invoice_number.trim_start_matches("INV-").parse().unwrap();
        assert!((1000..=9999).contains(&number));
        assert!(NaiveDate::parse_from_str(&invoice.issue_date, DATE_FORMAT).is_ok());
        assert!(NaiveDate::parse_from_str(&invoice.due_date, DATE_FORMAT).is_ok());
        assert!(invoice.issuer.vat_number.starts_with("GB"));
        assert_eq!(invoice.issuer.vat_number.len(), 11);
    }
}
