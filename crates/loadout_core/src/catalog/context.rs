use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::ItemCatalog;
use crate::core_api::{CoreError, CoreErrorCode};

type Job = Box<dyn FnOnce(&dyn ItemCatalog) + Send>;

/// Serial execution context that owns the item catalog.
///
/// The catalog lives on a single worker thread and every request runs there,
/// one at a time, in submission order. Callers hand over a closure and get the
/// result back through a [`Pending`] handle or a completion callback; the
/// calling thread is never used to touch the catalog.
pub struct CatalogContext {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl CatalogContext {
    pub fn spawn<C>(catalog: C) -> Result<Self, CoreError>
    where
        C: ItemCatalog + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name("item-catalog".to_string())
            .spawn(move || {
                for job in receiver {
                    job(&catalog);
                }
                debug!("item catalog context stopped");
            })
            .map_err(|e| {
                CoreError::new(
                    CoreErrorCode::CatalogUnavailable,
                    format!("failed to start item catalog context: {e}"),
                )
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queue `request` on the catalog context.
    pub fn submit<T, F>(&self, request: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ItemCatalog) -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.submit_with(request, move |result| {
            // The receiver may already be gone; the caller stopped caring.
            let _ = tx.send(result);
        });
        Pending { receiver: rx }
    }

    /// Queue `request` and hand its result to `on_complete` once it has run.
    /// If the context has already shut down the callback is never invoked.
    pub fn submit_with<T, F, K>(&self, request: F, on_complete: K)
    where
        T: Send + 'static,
        F: FnOnce(&dyn ItemCatalog) -> T + Send + 'static,
        K: FnOnce(T) + Send + 'static,
    {
        let Some(sender) = self.sender.as_ref() else {
            warn!("dropping catalog request: context is shut down");
            return;
        };
        let job: Job = Box::new(move |catalog: &dyn ItemCatalog| on_complete(request(catalog)));
        if sender.send(job).is_err() {
            warn!("dropping catalog request: context worker has exited");
        }
    }
}

impl Drop for CatalogContext {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued jobs and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("item catalog context panicked");
        }
    }
}

/// Result of a request submitted to a [`CatalogContext`].
#[derive(Debug)]
pub struct Pending<T> {
    receiver: Receiver<T>,
}

impl<T> Pending<T> {
    /// Non-blocking poll. `None` while the request is still queued or running.
    pub fn try_take(&self) -> Option<Result<T, CoreError>> {
        match self.receiver.try_recv() {
            Ok(value) => Some(Ok(value)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(CoreError::catalog_unavailable())),
        }
    }

    /// Block until the request has run.
    pub fn wait(self) -> Result<T, CoreError> {
        self.receiver
            .recv()
            .map_err(|_| CoreError::catalog_unavailable())
    }
}
