//! Detached click tracking for the redirect path.

use metrics::counter;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;

/// Hands click events to the background worker without waiting.
///
/// [`ClickRecorder::track_click`] never blocks, never fails, and never alters
/// the response it is called from. A full or closed queue drops the event
/// and logs it.
#[derive(Debug, Clone)]
pub struct ClickRecorder {
    sender: mpsc::Sender<ClickEvent>,
}

impl ClickRecorder {
    pub fn new(sender: mpsc::Sender<ClickEvent>) -> Self {
        Self { sender }
    }

    /// Queues `event` for persistence.
    pub fn track_click(&self, event: ClickEvent) {
        match self.sender.try_send(event) {
            Ok(()) => debug!("Click event queued"),
            Err(TrySendError::Full(event)) => {
                counter!("clicks_dropped_total", "reason" => "queue_full").increment(1);
                warn!(link_id = event.link_id, "Click queue full, dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                counter!("clicks_dropped_total", "reason" => "queue_closed").increment(1);
                warn!(link_id = event.link_id, "Click queue closed, dropping event");
            }
        }
    }

    /// Returns true if the worker side of the queue has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Remaining free slots in the queue.
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_track_click_queues_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let recorder = ClickRecorder::new(tx);

        recorder.track_click(ClickEvent::new(1));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.link_id, 1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_silently() {
        let (tx, mut rx) = mpsc::channel(1);
        let recorder = ClickRecorder::new(tx);

        recorder.track_click(ClickEvent::new(1));
        recorder.track_click(ClickEvent::new(2));

        assert_eq!(rx.recv().await.unwrap().link_id, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_queue_drops_silently() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let recorder = ClickRecorder::new(tx);

        assert!(recorder.is_closed());
        recorder.track_click(ClickEvent::new(1));
    }
}
