//! Event bus built on `tokio::broadcast` with a bounded replay ring.
//!
//! Subscribers that reconnect after missing events (e.g. a dispatcher that
//! restarted) can request a backlog since a known `EventId`; the bus drains
//! its replay buffer before handing control to the live broadcast receiver.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::{Receiver, Sender};
use tracing::error;

use crate::error::{EventBusError, EventBusResult};
use crate::payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId};

/// Shared, cloneable event bus.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    buffer: Arc<Mutex<VecDeque<EventEnvelope>>>,
    next_id: Arc<Mutex<EventId>>,
    replay_capacity: usize,
}

impl EventBus {
    /// Construct a bus with a custom replay capacity.
    #[must_use]
    pub fn with_capacity(replay_capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(replay_capacity.max(1));
        Self {
            sender,
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(replay_capacity))),
            next_id: Arc::new(Mutex::new(1)),
            replay_capacity,
        }
    }

    /// Construct a bus with the default replay capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Publish a new event, returning its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the event kind could not be handed to the broadcast
    /// channel. A publish with zero active subscribers is not an error: the
    /// event is still recorded in the replay buffer.
    pub fn publish(&self, event: Event) -> EventBusResult<EventId> {
        let kind = event.kind();
        let id = {
            let mut next = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
            let id = *next;
            *next = next.saturating_add(1);
            id
        };
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };

        {
            let mut buffer = self.lock_buffer();
            if buffer.len() == self.replay_capacity {
                buffer.pop_front();
            }
            buffer.push_back(envelope.clone());
        }

        if self.sender.receiver_count() == 0 {
            return Ok(id);
        }
        self.sender.send(envelope).map(|_| id).map_err(|_| {
            EventBusError::SendFailed {
                event_id: id,
                event_kind: kind,
            }
        })
    }

    /// Subscribe to events, optionally replaying a backlog since `since_id`.
    #[must_use]
    pub fn subscribe(&self, since_id: Option<EventId>) -> EventStream {
        let receiver = self.sender.subscribe();
        let backlog = since_id.map_or_else(VecDeque::new, |id| {
            self.backlog_since(id).into_iter().collect()
        });
        EventStream { backlog, receiver }
    }

    /// Collect events published after `id`, oldest first.
    #[must_use]
    pub fn backlog_since(&self, id: EventId) -> Vec<EventEnvelope> {
        self.lock_buffer()
            .iter()
            .filter(|env| env.id > id)
            .cloned()
            .collect()
    }

    /// The most recent event id observed, if any have been published.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.lock_buffer().back().map(|env| env.id)
    }

    fn lock_buffer(&self) -> MutexGuard<'_, VecDeque<EventEnvelope>> {
        self.buffer.lock().unwrap_or_else(|e| {
            error!("event bus replay buffer mutex poisoned, recovering");
            e.into_inner()
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A per-subscriber stream that drains its backlog before the live receiver.
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
}

impl EventStream {
    /// Await the next event, draining any backlog first.
    ///
    /// Returns `None` once the bus has been dropped and the backlog is empty.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if let Some(env) = self.backlog.pop_front() {
            return Some(env);
        }
        loop {
            match self.receiver.recv().await {
                Ok(env) => return Some(env),
                Err(RecvError::Lagged(skipped)) => {
                    error!(skipped, "event stream lagged, continuing from live edge");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn sequential_ids_and_replay() {
        let bus = EventBus::with_capacity(8);
        let first = bus
            .publish(Event::SettingsChanged {
                description: "init".into(),
            })
            .expect("publish");
        let second = bus
            .publish(Event::HealthChanged { degraded: vec![] })
            .expect("publish");
        assert_eq!(second, first + 1);
        assert_eq!(bus.last_event_id(), Some(second));

        let backlog = bus.backlog_since(first);
        assert_eq!(backlog.len(), 1);
        assert_eq!(backlog[0].id, second);
    }

    #[tokio::test]
    async fn subscribe_without_since_replays_only_live_events() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe(None);
        let id = bus
            .publish(Event::SettingsChanged {
                description: "x".into(),
            })
            .expect("publish");
        let envelope = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("no timeout")
            .expect("event present");
        assert_eq!(envelope.id, id);
    }

    #[tokio::test]
    async fn subscribe_with_since_drains_backlog_first() {
        let bus = EventBus::with_capacity(8);
        let first = bus
            .publish(Event::SettingsChanged {
                description: "a".into(),
            })
            .expect("publish");
        bus.publish(Event::SettingsChanged {
            description: "b".into(),
        })
        .expect("publish");

        let mut stream = bus.subscribe(Some(first));
        let replayed = stream.next().await.expect("backlog item");
        assert_eq!(replayed.id, first + 1);
    }

    #[tokio::test]
    async fn stream_returns_none_after_sender_dropped() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe(None);
        drop(bus);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn load_test_does_not_stall_publishers() {
        let bus = EventBus::with_capacity(64);
        let mut handles = Vec::new();
        for i in 0..500 {
            let bus = bus.clone();
            handles.push(tokio::spawn(async move {
                bus.publish(Event::SettingsChanged {
                    description: format!("change-{i}"),
                })
            }));
        }
        for handle in handles {
            handle.await.expect("task join").expect("publish");
        }
        assert!(bus.last_event_id().unwrap_or_default() >= 500);
    }
}
