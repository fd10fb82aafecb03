//! Status, progress, and log events emitted by the import core.
//!
//! The UI collaborator (terminal front-end, plugin panel, ...) subscribes
//! through an [`EventHandle`] and renders the stream however it likes; the
//! core never touches a screen itself.

use crate::import::BatchSummary;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

type SubscriptionId = u64;

/// Severity attached to status and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Warning,
    Error,
}

/// Events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum ImportEvent {
    /// Status-bar message.
    Status { message: String, level: ReportLevel },
    /// Running bundle count, emitted after each bundle regardless of outcome.
    Progress { current: usize, total: usize },
    /// Timestamped log line.
    Log {
        timestamp: DateTime<Local>,
        message: String,
        level: ReportLevel,
    },
    /// Terminal event of a batch run.
    Finished { summary: BatchSummary },
}

/// Sends events into the service channel and mirrors them to `tracing`.
#[derive(Clone)]
pub struct Reporter {
    tx: mpsc::UnboundedSender<ImportEvent>,
}

impl Reporter {
    pub fn new(tx: mpsc::UnboundedSender<ImportEvent>) -> Self {
        Self { tx }
    }

    pub fn status(&self, level: ReportLevel, message: impl Into<String>) {
        let message = message.into();
        self.trace(level, &message);
        let _ = self.tx.send(ImportEvent::Status { message, level });
    }

    pub fn progress(&self, current: usize, total: usize) {
        let _ = self.tx.send(ImportEvent::Progress { current, total });
    }

    pub fn log(&self, level: ReportLevel, message: impl Into<String>) {
        let message = message.into();
        self.trace(level, &message);
        let _ = self.tx.send(ImportEvent::Log {
            timestamp: Local::now(),
            message,
            level,
        });
    }

    pub fn finished(&self, summary: BatchSummary) {
        let _ = self.tx.send(ImportEvent::Finished { summary });
    }

    fn trace(&self, level: ReportLevel, message: &str) {
        match level {
            ReportLevel::Info => info!("{message}"),
            ReportLevel::Warning => warn!("{message}"),
            ReportLevel::Error => error!("{message}"),
        }
    }
}

/// Handle for subscribing to import events.
///
/// Subscriptions are automatically removed when the receiver is dropped.
#[derive(Clone)]
pub struct EventHandle {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<ImportEvent>>>>,
    next_id: Arc<AtomicU64>,
}

impl EventHandle {
    /// Create a handle and spawn the dispatch task on the current runtime.
    pub fn new(mut event_rx: mpsc::UnboundedReceiver<ImportEvent>) -> Self {
        let subscriptions: Arc<Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<ImportEvent>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let subscriptions_clone = subscriptions.clone();

        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let mut subs = subscriptions_clone.lock().unwrap();
                let mut dropped = Vec::new();

                for (id, tx) in subs.iter() {
                    // If send fails, receiver was dropped - mark for removal
                    if tx.send(event.clone()).is_err() {
                        dropped.push(*id);
                    }
                }

                for id in dropped {
                    subs.remove(&id);
                }
            }
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to all events of the owning service.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ImportEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions.lock().unwrap().insert(id, tx);
        rx
    }
}
