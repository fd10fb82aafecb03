// # Import Service - Batch Controller
//
// One worker task processes batch requests strictly sequentially: the next
// bundle's workflow begins only after the previous one reached its outcome.
// Cancellation is honored between bundles; a bundle in flight always runs to
// completion.

use crate::config::ImportConfig;
use crate::events::{EventHandle, ImportEvent, ReportLevel, Reporter};
use crate::host::HostLibrary;
use crate::import::orchestrator::import_bundle;
use crate::import::scanner::{scan_for_bundles, BUNDLE_MARKER};
use crate::import::types::{BatchSummary, ImportRequest};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Error)]
pub enum StartError {
    #[error("an import batch is already running")]
    Busy,
    #[error("import service is shut down")]
    Closed,
}

/// Handle for starting/cancelling batches and subscribing to events.
#[derive(Clone)]
pub struct ImportServiceHandle {
    request_tx: mpsc::UnboundedSender<ImportRequest>,
    events: EventHandle,
    busy: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
}

impl ImportServiceHandle {
    /// Start a batch run over `root`. Rejected while another run is in flight.
    pub fn start_batch(&self, root: PathBuf, folders: Vec<String>) -> Result<(), StartError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(StartError::Busy);
        }
        self.cancel.store(false, Ordering::SeqCst);

        self.request_tx
            .send(ImportRequest::RunBatch { root, folders })
            .map_err(|_| {
                self.busy.store(false, Ordering::SeqCst);
                StartError::Closed
            })
    }

    /// Ask a running batch to stop before its next bundle. The bundle in
    /// flight always runs to its conclusion.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Subscribe to status/progress/log events.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ImportEvent> {
        self.events.subscribe()
    }

    /// Stop the worker once the current batch (if any) finishes.
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(ImportRequest::Shutdown);
    }
}

/// Import service worker. Created and spawned through [`ImportService::start`].
pub struct ImportService {
    host: Arc<dyn HostLibrary>,
    config: ImportConfig,
    reporter: Reporter,
    request_rx: mpsc::UnboundedReceiver<ImportRequest>,
    busy: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
}

impl ImportService {
    /// Spawn the service worker on the current runtime, returning the handle
    /// for sending requests.
    pub fn start(host: Arc<dyn HostLibrary>, config: ImportConfig) -> ImportServiceHandle {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let busy = Arc::new(AtomicBool::new(false));
        let cancel = Arc::new(AtomicBool::new(false));

        let service = ImportService {
            host,
            config,
            reporter: Reporter::new(event_tx),
            request_rx,
            busy: busy.clone(),
            cancel: cancel.clone(),
        };
        tokio::spawn(service.listen_for_requests());

        ImportServiceHandle {
            request_tx,
            events: EventHandle::new(event_rx),
            busy,
            cancel,
        }
    }

    async fn listen_for_requests(mut self) {
        info!("import service started");

        while let Some(request) = self.request_rx.recv().await {
            match request {
                ImportRequest::RunBatch { root, folders } => {
                    let summary = self.run_batch(&root, &folders).await;
                    // Busy must be clear by the time the terminal event is observable.
                    self.busy.store(false, Ordering::SeqCst);
                    self.reporter.finished(summary);
                }
                ImportRequest::Shutdown => break,
            }
        }

        info!("import service stopped");
    }

    async fn run_batch(&self, root: &Path, folders: &[String]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        if !root.is_dir() {
            self.reporter.status(
                ReportLevel::Error,
                format!("selected root {} does not exist", root.display()),
            );
            return summary;
        }

        self.reporter.status(
            ReportLevel::Info,
            format!("searching for {BUNDLE_MARKER} folders..."),
        );

        let bundles = match scan_for_bundles(root) {
            Ok(bundles) => bundles,
            Err(err) => {
                self.reporter
                    .status(ReportLevel::Error, format!("scan failed: {err}"));
                return summary;
            }
        };

        if bundles.is_empty() {
            self.reporter.status(
                ReportLevel::Warning,
                format!("no {BUNDLE_MARKER} folders found; nothing to do"),
            );
            return summary;
        }

        summary.total = bundles.len();
        self.reporter.status(
            ReportLevel::Info,
            format!("found {} bundle(s), importing...", bundles.len()),
        );
        self.reporter.log(
            ReportLevel::Info,
            format!("starting batch import of {} bundle(s)", bundles.len()),
        );

        let total = bundles.len();
        for (index, bundle) in bundles.iter().enumerate() {
            // Cancellation is only honored between bundles.
            if self.cancel.load(Ordering::SeqCst) {
                self.reporter.status(
                    ReportLevel::Warning,
                    format!("batch cancelled after {index} of {total} bundle(s)"),
                );
                break;
            }

            let outcome = import_bundle(
                self.host.as_ref(),
                &self.config,
                &self.reporter,
                root,
                bundle,
                folders,
            )
            .await;

            summary.processed += 1;
            if outcome.imported {
                summary.imported += 1;
            } else {
                summary.failed += 1;
            }
            if outcome.cleaned {
                summary.cleaned += 1;
            }

            self.reporter.progress(index + 1, total);
        }

        self.reporter.status(
            ReportLevel::Info,
            format!("batch finished: {} bundle(s) processed", summary.processed),
        );
        summary
    }
}
