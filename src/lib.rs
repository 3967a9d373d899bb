pub mod bank;
pub mod currency;
pub mod error;
pub mod generator;
pub mod model;
pub mod render;
pub mod session;
pub mod settings;
pub mod totals;
pub mod update;

pub use currency::Currency;
pub use error::{Error, Result};
pub use model::{Amount, Invoice, Item};
pub use render::{Artifact, PdfEngine, Renderer, TypstEngine};
pub use session::Session;
pub use settings::{AppSettings, Theme};
pub use update::{Action, Field, ItemField, PayeeChoice};
