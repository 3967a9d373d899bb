use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, Color, Table};
use inquire::{Confirm, InquireError, Select, Text};
use tracing_subscriber::EnvFilter;

use sample_invoice::bank;
use sample_invoice::currency::{self, CURRENCIES};
use sample_invoice::render::{self, DocumentView};
use sample_invoice::settings::{self, AppSettings, Theme};
use sample_invoice::totals::{self, Totals};
use sample_invoice::{
    Action, Currency, Field, Invoice, ItemField, PayeeChoice, Renderer, Result, Session,
    TypstEngine,
};

// ==========================================
// Constants
// ==========================================
const RANDOM_PAYEE_OPT: &str = "🎲 Random (invalid) details";
const PREVIEW_FILE: &str = "preview.pdf";

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(
    name = "sample-invoice",
    version,
    about = "Generate fake invoices for layout and payment-flow testing"
)]
struct Cli {
    /// Override the output directory from settings
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive editing session with a live PDF preview
    New {
        /// GBP, EUR or USD (defaults to the saved preference)
        #[arg(long)]
        currency: Option<String>,
    },
    /// Generate one random invoice and save it as a PDF
    Generate {
        #[arg(long)]
        currency: Option<String>,
        /// Use random unvalidated bank details instead of the first catalogue payee
        #[arg(long)]
        random_payee: bool,
        /// Open the PDF after saving
        #[arg(long)]
        open: bool,
        /// Also write the invoice data as JSON
        #[arg(long)]
        json: bool,
    },
    /// List sample payees for a currency
    Payees {
        #[arg(long)]
        currency: Option<String>,
    },
    /// List supported currencies
    Currencies,
    /// Show or set the colour theme (system, light, dark)
    Theme { theme: Option<String> },
    /// Configure output directory and defaults
    Config,
}

// ==========================================
// Main Function
// ==========================================

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = AppSettings::load();
    let output_dir = cli.output.clone().unwrap_or_else(|| settings.output_path());

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::New { currency } => {
            let currency = resolve_currency(currency.as_deref(), &settings)?;
            interactive_session(&settings, &output_dir, currency)
        }
        Commands::Generate { currency, random_payee, open, json } => {
            let currency = resolve_currency(currency.as_deref(), &settings)?;
            generate_once(&settings, &output_dir, currency, random_payee, open, json)
        }
        Commands::Payees { currency } => {
            let currency = resolve_currency(currency.as_deref(), &settings)?;
            list_payees(currency);
            Ok(())
        }
        Commands::Currencies => {
            list_currencies();
            Ok(())
        }
        Commands::Theme { theme } => match theme {
            Some(name) => {
                let theme: Theme = name.parse()?;
                settings.set_theme(theme, &settings::config_path())?;
                println!("✅ Theme set to {theme}.");
                Ok(())
            }
            None => {
                println!("🎨 Current theme: {}", settings.theme);
                Ok(())
            }
        },
        Commands::Config => setup_config_wizard(settings),
    }
}

fn resolve_currency(arg: Option<&str>, settings: &AppSettings) -> Result<Currency> {
    match arg {
        Some(code) => code.parse(),
        None => Ok(settings.currency),
    }
}

/// Typst renderer using `<output>/templates/invoice.tera`, so the layout can be customised.
fn build_renderer(settings: &AppSettings, output_dir: &Path) -> Result<Renderer<TypstEngine>> {
    let engine = TypstEngine::new(&settings.typst_bin, settings::scratch_dir());
    if !engine.is_installed() {
        println!(
            "⚠️  '{}' is not installed; PDF output is unavailable (brew install typst).",
            settings.typst_bin
        );
    }
    Renderer::from_dir(engine, &output_dir.join("templates"))
}

// ==========================================
// 1. Interactive Session
// ==========================================

#[derive(Clone, Copy)]
enum MenuChoice {
    EditField,
    EditItem,
    ChoosePayee,
    SwitchCurrency,
    RegenerateKeepBank,
    Regenerate,
    Download,
    ExportJson,
    Quit,
}

const MENU: [(&str, MenuChoice); 9] = [
    ("✏️  Edit a field", MenuChoice::EditField),
    ("🧾 Edit a line item", MenuChoice::EditItem),
    ("🏦 Choose payee", MenuChoice::ChoosePayee),
    ("💱 Switch currency", MenuChoice::SwitchCurrency),
    ("🔄 Regenerate (keep bank details)", MenuChoice::RegenerateKeepBank),
    ("🔄 Regenerate", MenuChoice::Regenerate),
    ("📥 Download PDF", MenuChoice::Download),
    ("💾 Export JSON", MenuChoice::ExportJson),
    ("🚪 Quit", MenuChoice::Quit),
];

fn interactive_session(
    settings: &AppSettings,
    output_dir: &Path,
    currency: Currency,
) -> Result<()> {
    let renderer = build_renderer(settings, output_dir)?;
    let mut session = Session::new(renderer, currency).with_output_dir(output_dir);
    session.mount();
    session.refresh();
    write_preview(&session, output_dir);

    loop {
        print_invoice(session.invoice(), settings.theme);

        let labels: Vec<&str> = MENU.iter().map(|(label, _)| *label).collect();
        let menu = Select::new("What next?", labels).with_page_size(MENU.len());
        let choice = match menu.raw_prompt() {
            Ok(option) => MENU[option.index].1,
            Err(e) if is_cancel(&e) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let action = match prompt_action(choice, session.invoice()) {
            Ok(Some(action)) => action,
            Ok(None) => match choice {
                MenuChoice::ExportJson => {
                    export_json(session.invoice(), output_dir)?;
                    continue;
                }
                MenuChoice::Quit => return Ok(()),
                _ => continue,
            },
            Err(e) if is_cancel(&e) => continue,
            Err(e) => return Err(e.into()),
        };

        if matches!(action, Action::Download) {
            session.dispatch(action);
            report_download(&session);
            continue;
        }
        session.dispatch(action);
        write_preview(&session, output_dir);
    }
}

fn is_cancel(e: &InquireError) -> bool {
    matches!(e, InquireError::OperationCanceled | InquireError::OperationInterrupted)
}

/// Asks for the details of `choice`. `None` means the choice is not an invoice transition.
fn prompt_action(
    choice: MenuChoice,
    invoice: &Invoice,
) -> std::result::Result<Option<Action>, InquireError> {
    let action = match choice {
        MenuChoice::EditField => {
            let options: Vec<String> = Field::ALL
                .iter()
                .map(|f| format!("{}: {}", f.label(), f.get(invoice)))
                .collect();
            let picked = Select::new("Field to edit:", options).with_page_size(12).raw_prompt()?;
            let field = Field::ALL[picked.index];
            let value = Text::new(&format!("{}:", field.label()))
                .with_initial_value(field.get(invoice))
                .prompt()?;
            Action::EditField(field, value)
        }
        MenuChoice::EditItem => {
            if invoice.items.is_empty() {
                println!("❌ This invoice has no line items.");
                return Ok(None);
            }
            let options: Vec<String> = invoice
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{}. {}", i + 1, item.description))
                .collect();
            let index = Select::new("Line item:", options).raw_prompt()?.index;
            let item = &invoice.items[index];

            let fields = [
                ("Description", ItemField::Description, item.description.clone()),
                ("Quantity", ItemField::Quantity, item.quantity.to_string()),
                ("Unit Price", ItemField::UnitPrice, item.unit_price.to_string()),
            ];
            let labels: Vec<String> = fields
                .iter()
                .map(|(label, _, value)| format!("{label}: {value}"))
                .collect();
            let picked = Select::new("Item field:", labels).raw_prompt()?;
            let (label, field, current) = &fields[picked.index];
            let value = Text::new(&format!("{label} (leave empty to clear):"))
                .with_initial_value(current)
                .prompt()?;
            Action::EditItem(index, *field, value)
        }
        MenuChoice::ChoosePayee => {
            let payees = bank::by_currency(invoice.currency);
            let mut options = vec![RANDOM_PAYEE_OPT.to_string()];
            options.extend(payees.iter().map(|p| p.name.clone()));
            let index = Select::new("Payee:", options).with_page_size(10).raw_prompt()?.index;
            let choice = match index {
                0 => PayeeChoice::RandomInvalid,
                n => PayeeChoice::Record(payees[n - 1].clone()),
            };
            Action::SelectPayee(choice)
        }
        MenuChoice::SwitchCurrency => {
            let options: Vec<String> = CURRENCIES
                .iter()
                .map(|c| format!("{} {} ({})", c.flag, c.code, c.name))
                .collect();
            let index = Select::new("Currency:", options).raw_prompt()?.index;
            Action::SwitchCurrency(Currency::ALL[index])
        }
        MenuChoice::RegenerateKeepBank => Action::Regenerate { preserve_bank_details: true },
        MenuChoice::Regenerate => Action::Regenerate { preserve_bank_details: false },
        MenuChoice::Download => Action::Download,
        MenuChoice::ExportJson | MenuChoice::Quit => return Ok(None),
    };
    Ok(Some(action))
}

fn write_preview(session: &Session<TypstEngine>, output_dir: &Path) {
    if let Some(artifact) = session.preview().artifact() {
        match render::save(artifact, output_dir, PREVIEW_FILE) {
            Ok(path) => println!("👀 Preview updated: {}", path.display()),
            Err(e) => eprintln!("⚠️  Could not write preview: {e}"),
        }
    }
}

fn report_download(session: &Session<TypstEngine>) {
    match session.last_download() {
        Some(path) => {
            println!("✅ PDF saved: {}", path.display());
            if Confirm::new("Open it now?").with_default(false).prompt().unwrap_or(false) {
                open_and_reveal(path);
            }
        }
        None => println!("❌ No PDF available yet."),
    }
}

fn export_json(invoice: &Invoice, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.json", render::file_stem(&invoice.invoice_number)));
    let json = serde_json::to_string_pretty(invoice)?;
    fs::write(&path, json)?;
    println!("✅ JSON saved: {}", path.display());
    Ok(())
}

// ==========================================
// 2. One-shot Generation
// ==========================================

fn generate_once(
    settings: &AppSettings,
    output_dir: &Path,
    currency: Currency,
    random_payee: bool,
    open: bool,
    json: bool,
) -> Result<()> {
    let renderer = build_renderer(settings, output_dir)?;
    let mut session = Session::new(renderer, currency).with_output_dir(output_dir);
    if random_payee {
        session.dispatch(Action::SelectPayee(PayeeChoice::RandomInvalid));
    } else {
        session.refresh();
    }
    print_invoice(session.invoice(), settings.theme);

    if json {
        export_json(session.invoice(), output_dir)?;
    }

    println!("\n🔨 Compiling PDF...");
    session.dispatch(Action::Download);
    match session.last_download() {
        Some(path) => {
            println!("✅ PDF Generated: {}", path.display());
            if open {
                open_and_reveal(path);
            }
        }
        None => println!("❌ Compilation failed."),
    }
    Ok(())
}

// ==========================================
// 3. Tables
// ==========================================

fn accent(theme: Theme) -> Option<Color> {
    match theme {
        Theme::System => None,
        Theme::Light => Some(Color::Rgb { r: 4, g: 120, b: 87 }),
        Theme::Dark => Some(Color::Rgb { r: 110, g: 231, b: 183 }),
    }
}

fn tinted(text: String, theme: Theme) -> Cell {
    let cell = Cell::new(text).add_attribute(Attribute::Bold);
    match accent(theme) {
        Some(color) => cell.fg(color),
        None => cell,
    }
}

fn print_invoice(invoice: &Invoice, theme: Theme) {
    let code = invoice.currency.code();

    let mut header = Table::new();
    header.set_header(vec![Cell::new("Invoice"), Cell::new(&invoice.invoice_number)]);
    header.add_row(vec!["Issue Date", invoice.issue_date.as_str()]);
    header.add_row(vec!["Due Date", invoice.due_date.as_str()]);
    header.add_row(vec!["Company", invoice.issuer.company_name.as_str()]);
    header.add_row(vec!["Bill To", invoice.client.name.as_str()]);
    header.add_row(vec!["", invoice.client.address.as_str()]);
    header.add_row(vec!["", invoice.client.email.as_str()]);
    header.add_row(vec!["Currency", code]);

    let mut items = Table::new();
    items.set_header(vec!["#", "Description", "Qty", "Unit Price", "Total"]);
    for (i, item) in invoice.items.iter().enumerate() {
        let unit_price = match item.unit_price.as_number() {
            Some(price) => totals::format_money(price, code),
            None => String::new(),
        };
        items.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&item.description),
            Cell::new(item.quantity.to_string()),
            Cell::new(unit_price),
            Cell::new(totals::format_money(item.total, code)),
        ]);
    }

    let sums = Totals::of(&invoice.items);
    items.add_row(vec![
        Cell::new(""),
        Cell::new("Subtotal"),
        Cell::new(""),
        Cell::new(""),
        Cell::new(totals::format_money(sums.subtotal, code)),
    ]);
    items.add_row(vec![
        Cell::new(""),
        Cell::new(format!("VAT ({}%)", (totals::TAX_RATE * 100.0).round())),
        Cell::new(""),
        Cell::new(""),
        Cell::new(totals::format_money(sums.tax, code)),
    ]);
    items.add_row(vec![
        Cell::new(""),
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        tinted(totals::format_money(sums.total, code), theme),
    ]);

    let mut bank_table = Table::new();
    bank_table.set_header(vec!["Bank Details", ""]);
    for row in DocumentView::of(invoice).bank_rows {
        bank_table.add_row(vec![Cell::new(row.label), Cell::new(row.value)]);
    }

    println!("\n{header}");
    println!("{items}");
    println!("{bank_table}");
}

fn list_payees(currency: Currency) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Name", "Sort Code", "Account Number", "IBAN", "SWIFT/BIC"]);
    for (i, payee) in bank::by_currency(currency).iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&payee.name),
            Cell::new(payee.sort_code.as_deref().unwrap_or("")),
            Cell::new(payee.account_number.as_deref().unwrap_or("")),
            Cell::new(payee.iban.as_deref().unwrap_or("")),
            Cell::new(payee.swift_bic.as_deref().unwrap_or("")),
        ]);
    }
    println!("\n--- Sample Payees ({} {}) ---", currency.info().flag, currency);
    println!("{table}");
}

fn list_currencies() {
    let mut table = Table::new();
    table.set_header(vec!["", "Code", "Name", "Symbol"]);
    for c in CURRENCIES.iter() {
        table.add_row(vec![c.flag, c.code, c.name, c.symbol]);
    }
    println!("{table}");
    println!("Default: {}", currency::default_currency().code);
}

// ==========================================
// 4. Config & Utilities
// ==========================================

fn setup_config_wizard(mut settings: AppSettings) -> Result<()> {
    println!("\n⚙️  --- Configuration Setup ---");

    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Output Directory")
        .pick_folder();

    settings.output_dir = if let Some(path) = picked_path {
        path.to_string_lossy().to_string()
    } else {
        println!("❌ No folder selected. Falling back to manual input.");
        Text::new("Enter Output Directory:").with_default(&settings.output_dir).prompt()?
    };

    let currency_options: Vec<&str> = CURRENCIES.iter().map(|c| c.code).collect();
    let code = Select::new("Default currency:", currency_options).prompt()?;
    settings.currency = code.parse()?;

    settings.typst_bin = Text::new("Typst binary:").with_default(&settings.typst_bin).prompt()?;

    let path = settings.save()?;
    println!("✅ Settings saved to {}", path.display());
    Ok(())
}

// Helper: Open file and reveal in Finder/Explorer
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn().ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path).spawn().ok();
}
