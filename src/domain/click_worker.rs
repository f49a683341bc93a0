//! Background worker draining the click queue into the click sink.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::ClickRepository;

/// Attempts per event before it is given up on.
const MAX_ATTEMPTS: usize = 3;

/// Consumes click events until every sender is dropped.
///
/// At most `concurrency` writes are in flight at once. Each event is retried
/// with exponential backoff; a final failure is logged and counted but never
/// stops the worker.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    repository: Arc<dyn ClickRepository>,
    concurrency: usize,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    info!(concurrency, "Click worker started");

    while let Some(event) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let repository = repository.clone();

        tokio::spawn(async move {
            let _permit = permit;
            persist_click(repository.as_ref(), event).await;
        });
    }

    // Wait for in-flight writes before reporting shutdown.
    let _ = semaphore.acquire_many(concurrency.max(1) as u32).await;
    info!("Click worker stopped");
}

async fn persist_click(repository: &dyn ClickRepository, event: ClickEvent) {
    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(MAX_ATTEMPTS - 1);

    let link_id = event.link_id;
    let result = Retry::spawn(strategy, || repository.record_click(event.clone())).await;

    match result {
        Ok(()) => {
            counter!("clicks_recorded_total").increment(1);
            debug!(link_id, "Click recorded");
        }
        Err(e) => {
            counter!("clicks_failed_total").increment(1);
            error!(link_id, error = %e, "Failed to record click after retries");
        }
    }
}
