//! Per-job event log with live fan-out
//!
//! Every appended event is recorded in the job's log and pushed to each live
//! subscriber. Subscribing replays the log and attaches the live channel under
//! the same lock as `append`, so a subscriber sees every event exactly once and
//! in sequence order.
//!
//! Subscriber channels are unbounded: a slow reader never blocks the engine or
//! other readers. Senders whose receiver is gone are pruned on the next append.

use futures::Stream;
use memos_common::{JobEvent, Notification};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::trace;

/// Identifier of one live subscriber
pub type SubscriberId = u64;

#[derive(Default)]
struct Feed {
    log: Vec<JobEvent>,
    subscribers: Vec<(SubscriberId, mpsc::UnboundedSender<JobEvent>)>,
    next_subscriber: SubscriberId,
}

/// Append-only event log for one job
#[derive(Default)]
pub struct EventBroadcaster {
    feed: Mutex<Feed>,
}

/// Receiving end of a subscription: the replayed log followed by live events
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::UnboundedReceiver<JobEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a notification, record it and deliver it to live subscribers
    pub fn append(&self, notification: Notification) -> JobEvent {
        let mut feed = self.lock();
        let event = JobEvent::stamp(feed.log.len() as u64 + 1, notification);
        feed.log.push(event.clone());

        feed.subscribers.retain(|(id, tx)| {
            let delivered = tx.send(event.clone()).is_ok();
            if !delivered {
                trace!(subscriber = id, "Pruned closed subscriber");
            }
            delivered
        });

        event
    }

    /// Replay the log into a new channel and attach it for live events
    pub fn subscribe(&self) -> Subscription {
        let mut feed = self.lock();
        let (tx, receiver) = mpsc::unbounded_channel();

        for event in &feed.log {
            // Receiver is held locally, send cannot fail
            let _ = tx.send(event.clone());
        }

        let id = feed.next_subscriber;
        feed.next_subscriber += 1;
        feed.subscribers.push((id, tx));

        Subscription { id, receiver }
    }

    /// Detach a subscriber; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut feed = self.lock();
        let before = feed.subscribers.len();
        feed.subscribers.retain(|(sid, _)| *sid != id);
        feed.subscribers.len() != before
    }

    /// Subscribe and wrap the channel in a stream that detaches on drop
    pub fn live(self: &Arc<Self>) -> LiveEvents {
        let Subscription { id, receiver } = self.subscribe();
        LiveEvents {
            broadcaster: Arc::clone(self),
            id,
            receiver,
        }
    }

    /// Copy of every event appended so far
    pub fn history(&self) -> Vec<JobEvent> {
        self.lock().log.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Feed> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stream of one subscriber's events
///
/// Dropping it (for example when an SSE client disconnects) unsubscribes.
pub struct LiveEvents {
    broadcaster: Arc<EventBroadcaster>,
    id: SubscriberId,
    receiver: mpsc::UnboundedReceiver<JobEvent>,
}

impl LiveEvents {
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl Stream for LiveEvents {
    type Item = JobEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<JobEvent>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for LiveEvents {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_sequence_numbers_start_at_one() {
        let events = EventBroadcaster::new();
        assert_eq!(events.append(Notification::log("a")).seq, 1);
        assert_eq!(events.append(Notification::log("b")).seq, 2);
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_replay_then_live_in_order() {
        let events = EventBroadcaster::new();
        events.append(Notification::log("e1"));
        events.append(Notification::log("e2"));

        let mut sub = events.subscribe();
        events.append(Notification::log("e3"));

        let mut seen = Vec::new();
        while let Ok(event) = sub.receiver.try_recv() {
            seen.push(event.message);
        }
        assert_eq!(seen, vec!["e1", "e2", "e3"]);
    }

    #[tokio::test]
    async fn test_closed_subscribers_are_pruned() {
        let events = EventBroadcaster::new();
        let sub = events.subscribe();
        assert_eq!(events.subscriber_count(), 1);

        drop(sub);
        events.append(Notification::log("after close"));
        assert_eq!(events.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_live_stream_unsubscribes_on_drop() {
        let events = Arc::new(EventBroadcaster::new());
        events.append(Notification::started("go", 1));

        let mut live = events.live();
        let first = live.next().await.unwrap();
        assert_eq!(first.seq, 1);
        assert_eq!(events.subscriber_count(), 1);

        drop(live);
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_id() {
        let events = EventBroadcaster::new();
        assert!(!events.unsubscribe(42));
    }
}
