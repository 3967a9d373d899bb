//! The editing session: one current invoice, one current preview.
//!
//! Every transition re-renders the whole document. Renders may run on worker
//! threads and finish out of order; the preview keeps whichever result belongs
//! to the newest revision and drops the rest.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::currency::Currency;
use crate::error::Result;
use crate::generator;
use crate::model::Invoice;
use crate::render::{self, Artifact, PdfEngine, Renderer};
use crate::update::{self, Action};

/// The most recently accepted render.
#[derive(Debug, Default)]
pub struct Preview {
    shown: Option<(u64, Artifact)>,
}

impl Preview {
    /// Accepts `artifact` only if it is newer than the one shown.
    pub fn offer(&mut self, revision: u64, artifact: Artifact) -> bool {
        if let Some((shown, _)) = &self.shown {
            if *shown >= revision {
                debug!(revision, shown = *shown, "dropping stale render");
                return false;
            }
        }
        self.shown = Some((revision, artifact));
        true
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.shown.as_ref().map(|(_, artifact)| artifact)
    }

    pub fn revision(&self) -> Option<u64> {
        self.shown.as_ref().map(|(revision, _)| *revision)
    }
}

type RenderResult = (u64, Result<Artifact>);

pub struct Session<E> {
    invoice: Invoice,
    revision: u64,
    preview: Preview,
    renderer: Arc<Renderer<E>>,
    rng: StdRng,
    output_dir: Option<PathBuf>,
    last_download: Option<PathBuf>,
    results_tx: Sender<RenderResult>,
    results_rx: Receiver<RenderResult>,
}

fn job_name(revision: u64) -> String {
    format!("render-{}-{}", std::process::id(), revision)
}

impl<E: PdfEngine + 'static> Session<E> {
    /// Starts a session on a freshly generated invoice. Nothing is rendered yet.
    pub fn new(renderer: Renderer<E>, currency: Currency) -> Self {
        Self::with_rng(renderer, currency, StdRng::from_entropy())
    }

    pub fn with_rng(renderer: Renderer<E>, currency: Currency, mut rng: StdRng) -> Self {
        let invoice = generator::generate(currency, &mut rng);
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            invoice,
            revision: 0,
            preview: Preview::default(),
            renderer: Arc::new(renderer),
            rng,
            output_dir: None,
            last_download: None,
            results_tx,
            results_rx,
        }
    }

    /// Directory that [`Action::Download`] saves into.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// Path written by the most recent successful [`Action::Download`].
    pub fn last_download(&self) -> Option<&Path> {
        self.last_download.as_deref()
    }

    /// True once the preview shows the current revision of the invoice.
    /// The placeholder never counts.
    pub fn is_settled(&self) -> bool {
        self.revision > 0 && self.preview.revision() == Some(self.revision)
    }

    /// Shows the placeholder document if nothing has rendered yet.
    pub fn mount(&mut self) {
        if self.preview.artifact().is_some() {
            return;
        }
        match self.renderer.render(None, &job_name(0)) {
            Ok(artifact) => {
                self.preview.offer(0, artifact);
            }
            Err(e) => warn!(error = %e, "placeholder render failed"),
        }
    }

    /// Renders the current invoice synchronously.
    pub fn refresh(&mut self) {
        self.revision += 1;
        self.render_now();
    }

    /// Applies `action` and renders the result before returning.
    /// [`Action::Download`] saves the current preview instead.
    pub fn dispatch(&mut self, action: Action) -> &Invoice {
        if matches!(action, Action::Download) {
            self.download_now();
        } else if self.advance(action) {
            self.render_now();
        }
        &self.invoice
    }

    /// Applies `action` and renders on a worker thread. Call
    /// [`collect_renders`](Self::collect_renders) to pick up the result.
    pub fn dispatch_in_background(&mut self, action: Action) -> Option<JoinHandle<()>> {
        if matches!(action, Action::Download) {
            self.download_now();
            return None;
        }
        if !self.advance(action) {
            return None;
        }
        let revision = self.revision;
        let snapshot = self.invoice.clone();
        let renderer = Arc::clone(&self.renderer);
        let results = self.results_tx.clone();
        Some(thread::spawn(move || {
            let result = renderer.render(Some(&snapshot), &job_name(revision));
            // The session may be gone already; nothing to report to.
            results.send((revision, result)).ok();
        }))
    }

    /// Drains finished background renders into the preview. Returns how many were accepted.
    pub fn collect_renders(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok((revision, result)) = self.results_rx.try_recv() {
            match result {
                Ok(artifact) => {
                    if self.preview.offer(revision, artifact) {
                        accepted += 1;
                    }
                }
                Err(e) => warn!(revision, error = %e, "render failed; keeping previous preview"),
            }
        }
        accepted
    }

    /// Saves the current preview as `invoice-{number}.pdf` in `dir`, named after
    /// the invoice it was rendered from. Returns `None` while only the
    /// placeholder (or nothing) has been rendered.
    pub fn download(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let Some(artifact) = self.preview.artifact() else {
            warn!("download requested before any render finished");
            return Ok(None);
        };
        let Some(number) = artifact.invoice_number.as_deref() else {
            warn!("download requested while the placeholder is shown");
            return Ok(None);
        };
        render::save(artifact, dir, &render::file_name(number)).map(Some)
    }

    fn download_now(&mut self) {
        self.last_download = None;
        let Some(dir) = self.output_dir.clone() else {
            warn!("download requested without an output directory");
            return;
        };
        match self.download(&dir) {
            Ok(path) => self.last_download = path,
            Err(e) => warn!(error = %e, "download failed"),
        }
    }

    fn advance(&mut self, action: Action) -> bool {
        if !action.is_transition() {
            return false;
        }
        self.invoice = update::apply(&self.invoice, action, &mut self.rng);
        self.revision += 1;
        true
    }

    fn render_now(&mut self) {
        match self.renderer.render(Some(&self.invoice), &job_name(self.revision)) {
            Ok(artifact) => {
                self.preview.offer(self.revision, artifact);
            }
            Err(e) => {
                let revision = self.revision;
                warn!(revision, error = %e, "render failed; keeping previous preview");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(tag: &str) -> Artifact {
        Artifact { bytes: tag.as_bytes().to_vec(), invoice_number: Some(tag.to_string()) }
    }

    #[test]
    fn newer_render_replaces_older() {
        let mut preview = Preview::default();
        assert!(preview.offer(1, artifact("one")));
        assert!(preview.offer(3, artifact("three")));
        assert_eq!(preview.revision(), Some(3));
    }

    #[test]
    fn late_stale_render_is_dropped() {
        let mut preview = Preview::default();
        assert!(preview.offer(2, artifact("two")));
        assert!(!preview.offer(1, artifact("one")));
        assert!(!preview.offer(2, artifact("two again")));
        assert_eq!(preview.artifact(), Some(&artifact("two")));
    }
}
