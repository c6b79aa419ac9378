//! Single-slot, latest-wins frame handoff between a producer task and the
//! frame loop.
//!
//! The producer never blocks and never queues: publishing overwrites any
//! frame the consumer has not picked up yet, and that frame counts as
//! dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use handpad_hand_model::frame::HandFrame;

/// Create a connected publisher/subscriber pair.
pub fn frame_slot() -> (FramePublisher, FrameSubscriber) {
    let (tx, rx) = watch::channel(None);
    let published = Arc::new(AtomicU64::new(0));
    (
        FramePublisher {
            tx,
            published: published.clone(),
        },
        FrameSubscriber {
            rx,
            published,
            consumed: 0,
        },
    )
}

/// Producer half. Dropping it closes the slot.
#[derive(Debug)]
pub struct FramePublisher {
    tx: watch::Sender<Option<HandFrame>>,
    published: Arc<AtomicU64>,
}

impl FramePublisher {
    /// Replace the slot contents with `frame`.
    ///
    /// Returns `false` once the subscriber is gone.
    pub fn publish(&self, frame: HandFrame) -> bool {
        self.published.fetch_add(1, Ordering::SeqCst);
        self.tx.send_replace(Some(frame));
        self.tx.receiver_count() > 0
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }
}

/// Result of one wait on the slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotRecv {
    Frame(HandFrame),
    /// Nothing new arrived within the timeout.
    Timeout,
    /// The publisher is gone and every frame has been delivered.
    Closed,
}

/// Consumer half.
#[derive(Debug)]
pub struct FrameSubscriber {
    rx: watch::Receiver<Option<HandFrame>>,
    published: Arc<AtomicU64>,
    consumed: u64,
}

impl FrameSubscriber {
    /// Wait at most `timeout` for a frame newer than the last one taken.
    pub async fn recv(&mut self, timeout: Duration) -> SlotRecv {
        match tokio::time::timeout(timeout, self.rx.changed()).await {
            Err(_) => SlotRecv::Timeout,
            Ok(Err(_)) => SlotRecv::Closed,
            Ok(Ok(())) => {
                let latest = self.rx.borrow_and_update().clone();
                match latest {
                    Some(frame) => {
                        self.consumed += 1;
                        SlotRecv::Frame(frame)
                    }
                    None => SlotRecv::Timeout,
                }
            }
        }
    }

    /// Take the pending frame without waiting.
    pub fn try_recv(&mut self) -> Option<HandFrame> {
        if !self.rx.has_changed().unwrap_or(false) {
            return None;
        }
        let frame = self.rx.borrow_and_update().clone();
        if frame.is_some() {
            self.consumed += 1;
        }
        frame
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Frames overwritten before the subscriber saw them.
    pub fn dropped(&self) -> u64 {
        let pending = u64::from(self.rx.has_changed().unwrap_or(false));
        self.published
            .load(Ordering::SeqCst)
            .saturating_sub(self.consumed + pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_latest_frame_wins() {
        let (publisher, mut subscriber) = frame_slot();
        for t in 1..=3 {
            assert!(publisher.publish(HandFrame::empty(t)));
        }

        assert_eq!(subscriber.recv(WAIT).await, SlotRecv::Frame(HandFrame::empty(3)));
        assert_eq!(subscriber.dropped(), 2);
        assert_eq!(subscriber.consumed(), 1);
    }

    #[tokio::test]
    async fn test_times_out_without_new_frame() {
        let (publisher, mut subscriber) = frame_slot();
        publisher.publish(HandFrame::empty(1));
        assert!(matches!(subscriber.recv(WAIT).await, SlotRecv::Frame(_)));
        assert_eq!(subscriber.recv(WAIT).await, SlotRecv::Timeout);
    }

    #[tokio::test]
    async fn test_last_frame_survives_close() {
        let (publisher, mut subscriber) = frame_slot();
        publisher.publish(HandFrame::empty(7));
        drop(publisher);

        assert_eq!(subscriber.recv(WAIT).await, SlotRecv::Frame(HandFrame::empty(7)));
        assert_eq!(subscriber.recv(WAIT).await, SlotRecv::Closed);
        assert_eq!(subscriber.dropped(), 0);
    }

    #[test]
    fn test_try_recv() {
        let (publisher, mut subscriber) = frame_slot();
        assert_eq!(subscriber.try_recv(), None);
        publisher.publish(HandFrame::empty(1));
        assert_eq!(subscriber.try_recv(), Some(HandFrame::empty(1)));
        assert_eq!(subscriber.try_recv(), None);
    }

    #[test]
    fn test_publish_reports_missing_subscriber() {
        let (publisher, subscriber) = frame_slot();
        drop(subscriber);
        assert!(!publisher.publish(HandFrame::empty(1)));
        assert_eq!(publisher.published(), 1);
    }
}
