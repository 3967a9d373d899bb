//! How user actions turn one invoice snapshot into the next.

use rand::Rng;
use tracing::{debug, warn};

use crate::bank::{self, PayeeRecord};
use crate::currency::Currency;
use crate::generator;
use crate::model::{Amount, Invoice};
use crate::totals;

/// Scalar invoice fields that can be edited directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    InvoiceNumber,
    IssueDate,
    DueDate,
    CompanyName,
    ClientName,
    ClientAddress,
    ClientEmail,
    AccountName,
    SortCode,
    AccountNumber,
    Iban,
    SwiftBic,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::InvoiceNumber,
        Field::IssueDate,
        Field::DueDate,
        Field::CompanyName,
        Field::ClientName,
        Field::ClientAddress,
        Field::ClientEmail,
        Field::AccountName,
        Field::SortCode,
        Field::AccountNumber,
        Field::Iban,
        Field::SwiftBic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::InvoiceNumber => "Invoice Number",
            Field::IssueDate => "Issue Date",
            Field::DueDate => "Due Date",
            Field::CompanyName => "Company Name",
            Field::ClientName => "Client Name",
            Field::ClientAddress => "Client Address",
            Field::ClientEmail => "Client Email",
            Field::AccountName => "Account Name",
            Field::SortCode => "Sort Code",
            Field::AccountNumber => "Account Number",
            Field::Iban => "IBAN",
            Field::SwiftBic => "SWIFT/BIC",
        }
    }

    pub fn get(self, invoice: &Invoice) -> &str {
        match self {
            Field::InvoiceNumber => &invoice.invoice_number,
            Field::IssueDate => &invoice.issue_date,
            Field::DueDate => &invoice.due_date,
            Field::CompanyName => &invoice.issuer.company_name,
            Field::ClientName => &invoice.client.name,
            Field::ClientAddress => &invoice.client.address,
            Field::ClientEmail => &invoice.client.email,
            Field::AccountName => &invoice.payment.account_name,
            Field::SortCode => &invoice.payment.sort_code,
            Field::AccountNumber => &invoice.payment.account_number,
            Field::Iban => &invoice.payment.iban,
            Field::SwiftBic => &invoice.payment.swift_bic,
        }
    }

    fn slot(self, invoice: &mut Invoice) -> &mut String {
        match self {
            Field::InvoiceNumber => &mut invoice.invoice_number,
            Field::IssueDate => &mut invoice.issue_date,
            Field::DueDate => &mut invoice.due_date,
            Field::CompanyName => &mut invoice.issuer.company_name,
            Field::ClientName => &mut invoice.client.name,
            Field::ClientAddress => &mut invoice.client.address,
            Field::ClientEmail => &mut invoice.client.email,
            Field::AccountName => &mut invoice.payment.account_name,
            Field::SortCode => &mut invoice.payment.sort_code,
            Field::AccountNumber => &mut invoice.payment.account_number,
            Field::Iban => &mut invoice.payment.iban,
            Field::SwiftBic => &mut invoice.payment.swift_bic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Description,
    Quantity,
    UnitPrice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayeeChoice {
    Record(PayeeRecord),
    /// Synthesize a fresh unvalidated payee for the invoice currency.
    RandomInvalid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    EditField(Field, String),
    /// Item index, field, raw text from the form.
    EditItem(usize, ItemField, String),
    SelectPayee(PayeeChoice),
    SwitchCurrency(Currency),
    Regenerate { preserve_bank_details: bool },
    Download,
}

impl Action {
    /// Whether the action changes the invoice (and therefore needs a re-render).
    pub fn is_transition(&self) -> bool {
        !matches!(self, Action::Download)
    }
}

/// Applies `action` to `current` and returns the next snapshot.
pub fn apply<R: Rng + ?Sized>(current: &Invoice, action: Action, rng: &mut R) -> Invoice {
    let mut next = current.clone();
    match action {
        Action::EditField(field, value) => {
            *field.slot(&mut next) = value;
        }
        Action::EditItem(index, field, value) => {
            let Some(item) = next.items.get_mut(index) else {
                warn!(index, items = current.items.len(), "edit for missing line item ignored");
                return next;
            };
            match field {
                ItemField::Description => item.description = value,
                ItemField::Quantity => {
                    item.quantity = Amount::parse(&value);
                    item.total = totals::item_total(item);
                }
                ItemField::UnitPrice => {
                    item.unit_price = Amount::parse(&value);
                    item.total = totals::item_total(item);
                }
            }
        }
        Action::SelectPayee(choice) => {
            let payee = match choice {
                PayeeChoice::Record(record) => record,
                PayeeChoice::RandomInvalid => bank::random_invalid(next.currency, rng),
            };
            use_payee(&mut next, &payee);
        }
        Action::SwitchCurrency(currency) => {
            next.currency = currency;
            match bank::default_payee(currency) {
                Some(payee) => use_payee(&mut next, &payee),
                None => debug!(%currency, "no catalogue payee; payment details left as-is"),
            }
        }
        Action::Regenerate { preserve_bank_details } => {
            next = regenerate(current, preserve_bank_details, rng);
        }
        Action::Download => {}
    }
    next
}

fn use_payee(invoice: &mut Invoice, payee: &PayeeRecord) {
    invoice.payment.overwrite_with(payee);
    invoice.issuer.company_name = payee.name.clone();
}

/// Fresh invoice in the current currency; client contact details always carry
/// over, payment details (with currency and payee name) only on request.
/// Line items never carry over.
fn regenerate<R: Rng + ?Sized>(
    current: &Invoice,
    preserve_bank_details: bool,
    rng: &mut R,
) -> Invoice {
    let mut fresh = generator::generate(current.currency, rng);
    fresh.client = current.client.clone();
    if preserve_bank_details {
        fresh.payment = current.payment.clone();
        fresh.currency = current.currency;
        fresh.issuer.company_name = current.issuer.company_name.clone();
    }
    fresh
}
