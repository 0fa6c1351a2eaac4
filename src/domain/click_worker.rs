//! Fire-and-forget click recording.
//!
//! The redirect path hands events to a [`ClickRecorder`], which enqueues them
//! on a bounded channel without waiting. [`run_click_worker`] drains the
//! channel and persists each event on its own task, with at most
//! `concurrency` inserts in flight.
//!
//! Failures are logged and dropped: a click is never retried and nothing is
//! reported back to the request that produced it. A full queue drops the
//! click rather than slowing the redirect down.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::ClickRepository;

/// Sending half of the click pipeline.
#[derive(Clone)]
pub struct ClickRecorder {
    sender: mpsc::Sender<ClickEvent>,
}

impl ClickRecorder {
    /// Creates a recorder and the receiver to hand to [`run_click_worker`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ClickEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Wraps an existing sender.
    pub fn new(sender: mpsc::Sender<ClickEvent>) -> Self {
        Self { sender }
    }

    /// Schedules a click for persistence and returns immediately.
    ///
    /// Events without a link id are discarded here.
    pub fn record(&self, event: ClickEvent) {
        if event.link_id.is_none() {
            debug!("Skipping click for unknown link");
            return;
        }

        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                warn!("Click queue is full, dropping click");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                warn!("Click queue is closed, dropping click");
            }
        }
    }

    /// Returns `true` once the worker has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Remaining free slots in the queue.
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}

/// Persists click events until every [`ClickRecorder`] has been dropped.
///
/// In-flight inserts are awaited before the function returns.
pub async fn run_click_worker<R>(
    mut receiver: mpsc::Receiver<ClickEvent>,
    repository: Arc<R>,
    concurrency: usize,
) where
    R: ClickRepository + ?Sized + 'static,
{
    let concurrency = concurrency.max(1);
    let permits = Arc::new(Semaphore::new(concurrency));

    while let Some(event) = receiver.recv().await {
        let Some(new_click) = event.into_new_click() else {
            continue;
        };

        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };

        let repository = repository.clone();
        tokio::spawn(async move {
            let link_id = new_click.link_id;
            match repository.record_click(new_click).await {
                Ok(_) => {
                    metrics::counter!("clicks_recorded_total").increment(1);
                    debug!(link_id, "Click recorded");
                }
                Err(e) => {
                    metrics::counter!("clicks_failed_total").increment(1);
                    warn!(link_id, error = %e, "Failed to record click, dropping it");
                }
            }
            drop(permit);
        });
    }

    // Wait for in-flight inserts by reclaiming every permit.
    let _ = permits.acquire_many(concurrency as u32).await;
    info!("Click worker stopped");
}
