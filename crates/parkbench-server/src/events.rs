//! In-process fan-out of roster changes to live subscriber connections.

use serde::Serialize;
use tokio::sync::broadcast;

/// Clients not subscribed at publish time miss the event and fall back to
/// polling at roughly this interval.
pub const POLL_FALLBACK_SECS: u64 = 15;

/// The fixed set of broadcastable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RosterEvent {
    /// The set of active checkins changed; clients should re-fetch the roster.
    RosterChanged {
        /// Unix timestamp (seconds).
        at: i64,
    },
}

/// Typed publish/subscribe over a broadcast channel.
///
/// Each subscriber owns an independent receiver, so a slow, lagging, or
/// dropped listener cannot affect delivery to the others. Delivery is
/// best-effort, at-most-once per currently-subscribed receiver; there is no
/// replay for late subscribers.
#[derive(Debug, Clone)]
pub struct ChangeBroadcaster {
    tx: broadcast::Sender<RosterEvent>,
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(32);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.tx.subscribe()
    }

    /// Hand the event to every current subscriber. Returns how many
    /// receivers it reached; zero when nobody is listening.
    pub fn publish(&self, event: RosterEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let broadcaster = ChangeBroadcaster::new();
        let mut rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();

        let delivered = broadcaster.publish(RosterEvent::RosterChanged { at: 7 });
        assert_eq!(delivered, 2);

        assert_eq!(rx1.recv().await.unwrap(), RosterEvent::RosterChanged { at: 7 });
        assert_eq!(rx2.recv().await.unwrap(), RosterEvent::RosterChanged { at: 7 });
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_affect_others() {
        let broadcaster = ChangeBroadcaster::new();
        let rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();
        drop(rx1);

        broadcaster.publish(RosterEvent::RosterChanged { at: 9 });
        assert_eq!(rx2.recv().await.unwrap(), RosterEvent::RosterChanged { at: 9 });
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let broadcaster = ChangeBroadcaster::new();
        assert_eq!(broadcaster.publish(RosterEvent::RosterChanged { at: 1 }), 0);
    }
}
