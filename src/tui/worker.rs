//! Background workers for non-blocking network and file work.
//!
//! The TUI main loop never blocks: searches, image encoding and health
//! probes each run on a short-lived thread and report back over a channel.
//! There is no cancellation; a superseded result is simply dropped.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::adapters::image_file::{expand_home, load_image_file};
use crate::application::SearchService;
use crate::domain::{HealthStatus, ImagePayload, SearchInput, SearchOutcome};
use crate::ports::SearchBackend;

/// Result of a background search.
#[derive(Debug, Clone)]
pub enum SearchProgress {
    /// Search finished with results (possibly none)
    Complete(SearchOutcome),
    /// Search failed; message is shown in place of results
    Error(String),
}

/// Result of a background image conversion.
#[derive(Debug, Clone)]
pub enum ImageLoadProgress {
    Ready { path: String, payload: ImagePayload },
    Error { path: String, message: String },
}

/// Handle to a running worker.
pub struct WorkerHandle<T> {
    rx: Receiver<T>,
    _handle: JoinHandle<()>,
}

impl<T> WorkerHandle<T> {
    /// Try to receive the worker's message (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

pub type SearchWorkerHandle = WorkerHandle<SearchProgress>;
pub type ImageLoadHandle = WorkerHandle<ImageLoadProgress>;
pub type HealthHandle = WorkerHandle<Result<HealthStatus, String>>;

fn spawn_worker<T, F>(job: F) -> WorkerHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        // The receiver may be gone if the UI dropped this worker.
        let _ = tx.send(job());
    });

    WorkerHandle {
        rx,
        _handle: handle,
    }
}

/// Runs one search request in the background.
pub struct SearchWorker;

impl SearchWorker {
    /// Spawn a background search.
    pub fn spawn<B>(service: Arc<SearchService<B>>, input: SearchInput) -> SearchWorkerHandle
    where
        B: SearchBackend + 'static,
    {
        spawn_worker(move || match service.search(&input) {
            Ok(outcome) => SearchProgress::Complete(outcome),
            Err(e) => {
                tracing::warn!("Search failed: {}", e);
                SearchProgress::Error(e.to_string())
            }
        })
    }
}

/// Reads and base64-encodes a query image in the background.
pub struct ImageLoadWorker;

impl ImageLoadWorker {
    /// `path` is reported back unchanged so the form can match the result
    /// against the path it is waiting for.
    pub fn spawn(path: String, max_bytes: u64) -> ImageLoadHandle {
        spawn_worker(move || match load_image_file(&expand_home(&path), max_bytes) {
            Ok(payload) => ImageLoadProgress::Ready { path, payload },
            Err(e) => {
                tracing::warn!("Image load failed: {}", e);
                ImageLoadProgress::Error {
                    path,
                    message: e.to_string(),
                }
            }
        })
    }
}

/// Probes backend health in the background.
pub struct HealthWorker;

impl HealthWorker {
    pub fn spawn<B>(service: Arc<SearchService<B>>) -> HealthHandle
    where
        B: SearchBackend + 'static,
    {
        spawn_worker(move || service.health().map_err(|e| e.to_string()))
    }
}
