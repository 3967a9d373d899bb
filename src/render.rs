//! Turning an invoice snapshot into a PDF.
//!
//! The invoice is flattened into a [`DocumentView`] of display strings, the
//! view is rendered through the tera template into Typst source, and a
//! [`PdfEngine`] compiles that source into bytes.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use serde::Serialize;
use tera::{Context, Tera, Value};
use tracing::{debug, info};

use crate::bank::PaymentScheme;
use crate::error::{Error, Result};
use crate::model::Invoice;
use crate::totals::{self, Totals};

// Embed template at compile time to ensure availability
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/invoice.tera");
const TEMPLATE_NAME: &str = "invoice.tera";

/// Compiles document source into PDF bytes.
pub trait PdfEngine: Send + Sync {
    /// `job` names the compilation; it is unique per render.
    fn compile(&self, source: &str, job: &str) -> Result<Vec<u8>>;
}

/// Shells out to the `typst` CLI.
#[derive(Debug, Clone)]
pub struct TypstEngine {
    binary: PathBuf,
    scratch_dir: PathBuf,
}

impl TypstEngine {
    pub fn new(binary: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into(), scratch_dir: scratch_dir.into() }
    }

    /// Whether the configured binary can be run at all.
    pub fn is_installed(&self) -> bool {
        Command::new(&self.binary).arg("--version").output().is_ok()
    }
}

impl PdfEngine for TypstEngine {
    fn compile(&self, source: &str, job: &str) -> Result<Vec<u8>> {
        fs::create_dir_all(&self.scratch_dir)?;
        let typ_path = self.scratch_dir.join(format!("{job}.typ"));
        let pdf_path = self.scratch_dir.join(format!("{job}.pdf"));
        fs::write(&typ_path, source)?;

        let output = Command::new(&self.binary)
            .arg("compile")
            .arg(&typ_path)
            .arg(&pdf_path)
            .output()
            .map_err(|e| Error::Engine { job: job.to_string(), reason: e.to_string() })?;

        let result = if output.status.success() {
            fs::read(&pdf_path).map_err(Error::from)
        } else {
            Err(Error::Engine {
                job: job.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        };

        fs::remove_file(&typ_path).ok();
        fs::remove_file(&pdf_path).ok();
        result
    }
}

/// A rendered document. The core treats the bytes as opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    /// `None` for the placeholder document.
    pub invoice_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRow {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankRow {
    pub label: &'static str,
    pub value: String,
}

/// Everything the template prints, already formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView {
    pub placeholder: bool,
    pub company_name: String,
    pub invoice_number: String,
    pub issue_date: String,
    pub due_date: String,
    pub client_name: String,
    pub client_address: String,
    pub client_email: String,
    pub rows: Vec<ItemRow>,
    pub subtotal: String,
    pub tax_percent: String,
    pub tax: String,
    pub total: String,
    pub bank_rows: Vec<BankRow>,
}

impl DocumentView {
    pub fn placeholder() -> Self {
        Self {
            placeholder: true,
            company_name: String::new(),
            invoice_number: String::new(),
            issue_date: String::new(),
            due_date: String::new(),
            client_name: String::new(),
            client_address: String::new(),
            client_email: String::new(),
            rows: Vec::new(),
            subtotal: String::new(),
            tax_percent: String::new(),
            tax: String::new(),
            total: String::new(),
            bank_rows: Vec::new(),
        }
    }

    pub fn of(invoice: &Invoice) -> Self {
        let code = invoice.currency.code();
        let money = |value: f64| totals::format_money(value, code);

        let rows = invoice
            .items
            .iter()
            .map(|item| ItemRow {
                description: item.description.clone(),
                quantity: totals::effective_quantity(item.quantity).to_string(),
                unit_price: money(totals::effective_unit_price(item.unit_price)),
                total: money(item.total),
            })
            .collect();

        let sums = Totals::of(&invoice.items);

        Self {
            placeholder: false,
            company_name: invoice.issuer.company_name.clone(),
            invoice_number: invoice.invoice_number.clone(),
            issue_date: invoice.issue_date.clone(),
            due_date: invoice.due_date.clone(),
            client_name: invoice.client.name.clone(),
            client_address: invoice.client.address.clone(),
            client_email: invoice.client.email.clone(),
            rows,
            subtotal: money(sums.subtotal),
            tax_percent: format!("{}", (totals::TAX_RATE * 100.0).round()),
            tax: money(sums.tax),
            total: money(sums.total),
            bank_rows: bank_rows(invoice),
        }
    }
}

fn bank_rows(invoice: &Invoice) -> Vec<BankRow> {
    let payment = &invoice.payment;
    let mut rows = vec![BankRow { label: "Account Name", value: payment.account_name.clone() }];
    match PaymentScheme::for_currency(invoice.currency) {
        PaymentScheme::SortCode => {
            rows.push(BankRow { label: "Sort Code", value: payment.sort_code.clone() });
            rows.push(BankRow { label: "Account Number", value: payment.account_number.clone() });
        }
        PaymentScheme::Iban => {
            rows.push(BankRow { label: "IBAN", value: payment.iban.clone() });
        }
        PaymentScheme::IbanSwift => {
            rows.push(BankRow { label: "IBAN", value: payment.iban.clone() });
            rows.push(BankRow { label: "SWIFT/BIC", value: payment.swift_bic.clone() });
        }
    }
    rows.push(BankRow { label: "Reference", value: invoice.invoice_number.clone() });
    rows
}

/// Escapes a value for use inside a Typst string literal.
pub fn escape_typst(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

fn typst_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(escape_typst(s))),
        other => Ok(Value::String(escape_typst(&other.to_string()))),
    }
}

/// `invoice-{number}`, with path separators replaced.
pub fn file_stem(invoice_number: &str) -> String {
    let safe: String = invoice_number
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("invoice-{safe}")
}

pub fn file_name(invoice_number: &str) -> String {
    format!("{}.pdf", file_stem(invoice_number))
}

/// Writes `artifact` into `dir` under `file_name`, returning the full path.
pub fn save(artifact: &Artifact, dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, &artifact.bytes)?;
    info!(path = %path.display(), bytes = artifact.bytes.len(), "saved invoice PDF");
    Ok(path)
}

pub struct Renderer<E> {
    tera: Tera,
    engine: E,
}

impl<E: PdfEngine> Renderer<E> {
    /// Renderer with the built-in template.
    pub fn new(engine: E) -> Result<Self> {
        Self::with_template(engine, DEFAULT_TEMPLATE)
    }

    /// Renderer with a custom template body.
    pub fn with_template(engine: E, template: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.register_filter("typst", typst_filter);
        tera.add_raw_template(TEMPLATE_NAME, template)?;
        Ok(Self { tera, engine })
    }

    /// Renderer reading `invoice.tera` from `dir`, written there first if missing.
    pub fn from_dir(engine: E, dir: &Path) -> Result<Self> {
        let path = dir.join(TEMPLATE_NAME);
        if !path.exists() {
            info!(path = %path.display(), "writing default invoice template");
            fs::create_dir_all(dir)?;
            fs::write(&path, DEFAULT_TEMPLATE)?;
        }
        let template = fs::read_to_string(&path)?;
        Self::with_template(engine, &template)
    }

    /// Typst source for `invoice`, or the placeholder document for `None`.
    pub fn source(&self, invoice: Option<&Invoice>) -> Result<String> {
        let view = invoice.map(DocumentView::of).unwrap_or_else(DocumentView::placeholder);
        let context = Context::from_serialize(&view)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }

    pub fn render(&self, invoice: Option<&Invoice>, job: &str) -> Result<Artifact> {
        let started = Instant::now();
        let source = self.source(invoice)?;
        let bytes = self.engine.compile(&source, job)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(job, bytes = bytes.len(), elapsed_ms, "rendered");
        Ok(Artifact { bytes, invoice_number: invoice.map(|i| i.invoice_number.clone()) })
    }
}
