use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use sample_invoice::render::{self, PdfEngine, Renderer};
use sample_invoice::{Action, Currency, Error, Field, ItemField, Result, Session};

/// Returns the Typst source as the "PDF" so tests can read what was rendered.
#[derive(Default)]
struct EchoEngine {
    calls: Arc<AtomicUsize>,
}

impl PdfEngine for EchoEngine {
    fn compile(&self, source: &str, _job: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(source.as_bytes().to_vec())
    }
}

/// Makes the render for revision 1 slow so it finishes after revision 2.
struct SlowFirstEngine;

impl PdfEngine for SlowFirstEngine {
    fn compile(&self, source: &str, job: &str) -> Result<Vec<u8>> {
        if job.ends_with("-1") {
            thread::sleep(Duration::from_millis(200));
        }
        Ok(source.as_bytes().to_vec())
    }
}

/// Fails for every job after the first.
struct FlakyEngine {
    calls: AtomicUsize,
}

impl PdfEngine for FlakyEngine {
    fn compile(&self, source: &str, job: &str) -> Result<Vec<u8>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(source.as_bytes().to_vec())
        } else {
            Err(Error::Engine { job: job.to_string(), reason: "boom".into() })
        }
    }
}

fn session<E: PdfEngine + 'static>(engine: E) -> Session<E> {
    Session::with_rng(Renderer::new(engine).unwrap(), Currency::Gbp, StdRng::seed_from_u64(42))
}

fn preview_text<E: PdfEngine + 'static>(session: &Session<E>) -> String {
    String::from_utf8(session.preview().artifact().unwrap().bytes.clone()).unwrap()
}

#[test]
fn mount_shows_placeholder_then_refresh_shows_invoice() {
    let mut session = session(EchoEngine::default());
    session.mount();
    assert!(preview_text(&session).contains("Loading..."));
    assert!(!session.is_settled());

    session.refresh();
    let text = preview_text(&session);
    assert!(text.contains(&session.invoice().invoice_number));
    assert!(session.is_settled());
}

#[test]
fn every_transition_renders_once_and_download_does_not_render() {
    let engine = EchoEngine::default();
    let calls = Arc::clone(&engine.calls);
    let mut session = session(engine);
    session.refresh();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    session.dispatch(Action::EditField(Field::ClientName, "Grace Hopper".into()));
    session.dispatch(Action::EditItem(0, ItemField::Quantity, "".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(preview_text(&session).contains("Grace Hopper"));

    let revision = session.revision();
    let before = session.invoice().clone();
    session.dispatch(Action::Download);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(session.revision(), revision);
    assert_eq!(session.invoice(), &before);
}

#[test]
fn stale_background_render_does_not_overwrite_newer_one() {
    let mut session = session(SlowFirstEngine);
    let slow = session
        .dispatch_in_background(Action::EditField(Field::ClientName, "First Edit".into()))
        .unwrap();
    let fast = session
        .dispatch_in_background(Action::EditField(Field::ClientName, "Second Edit".into()))
        .unwrap();

    fast.join().unwrap();
    session.collect_renders();
    slow.join().unwrap();
    session.collect_renders();

    assert_eq!(session.preview().revision(), Some(2));
    assert!(session.is_settled());
    let text = preview_text(&session);
    assert!(text.contains("Second Edit"));
    assert!(!text.contains("First Edit"));
}

#[test]
fn failed_render_keeps_previous_artifact() {
    let mut session = session(FlakyEngine { calls: AtomicUsize::new(0) });
    session.refresh();
    let before = session.preview().artifact().cloned();

    session.dispatch(Action::EditField(Field::ClientName, "Not Rendered".into()));
    assert_eq!(session.invoice().client.name, "Not Rendered");
    assert_eq!(session.preview().artifact().cloned(), before);
    assert!(!session.is_settled());
}

#[test]
fn download_saves_current_preview_under_invoice_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(EchoEngine::default());
    assert_eq!(session.download(dir.path()).unwrap(), None);
    session.mount();
    assert_eq!(session.download(dir.path()).unwrap(), None);

    session.dispatch(Action::EditField(Field::InvoiceNumber, "INV-7777".into()));
    let path = session.download(dir.path()).unwrap().unwrap();
    assert_eq!(path.file_name().unwrap(), "invoice-INV-7777.pdf");
    assert_eq!(fs::read(&path).unwrap(), session.preview().artifact().unwrap().bytes);
    assert_eq!(render::file_name("INV-7777"), "invoice-INV-7777.pdf");
}

#[test]
fn download_action_writes_pdf_into_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(EchoEngine::default()).with_output_dir(dir.path());
    session.dispatch(Action::Download);
    assert_eq!(session.last_download(), None);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

    session.refresh();
    let number = session.invoice().invoice_number.clone();
    let before = session.invoice().clone();
    session.dispatch(Action::Download);

    let expected = dir.path().join(format!("invoice-{number}.pdf"));
    assert_eq!(session.last_download(), Some(expected.as_path()));
    assert_eq!(fs::read(&expected).unwrap(), session.preview().artifact().unwrap().bytes);
    assert_eq!(session.invoice(), &before);
}

#[test]
fn download_is_named_after_the_rendered_invoice() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(FlakyEngine { calls: AtomicUsize::new(0) })
        .with_output_dir(dir.path());
    session.refresh();
    let rendered = session.invoice().invoice_number.clone();

    session.dispatch(Action::EditField(Field::InvoiceNumber, "INV-0001".into()));
    session.dispatch(Action::Download);
    let path = session.last_download().unwrap();
    assert_eq!(path.file_name().unwrap().to_str().unwrap(), format!("invoice-{rendered}.pdf"));
}
