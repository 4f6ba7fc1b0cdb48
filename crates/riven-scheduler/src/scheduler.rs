//! The event manager: a bounded pool of workers draining a per-item priority
//! queue, enforcing at-most-one-in-flight-per-item, and re-enqueueing
//! whatever a service's outcome demands.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use riven_data::ItemRepository;
use riven_events::{Event, EventBus, ItemState};
use riven_media::MediaItem;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::in_progress::InProgressSet;
use crate::queue::{EventQueue, ScheduledEvent};
use crate::router::next_stage;
use crate::service::{Service, ServiceOutcome};
use crate::state::derive_state;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Ties the priority queue, in-progress set, and registered services
/// together and drains ready events onto a bounded worker pool.
pub struct EventManager {
    repo: Arc<ItemRepository>,
    events: EventBus,
    queue: std::sync::Mutex<EventQueue>,
    in_progress: InProgressSet,
    services: HashMap<&'static str, Arc<dyn Service>>,
    notify: Notify,
    shutdown: AtomicBool,
    health: std::sync::Mutex<BTreeSet<String>>,
}

impl EventManager {
    /// Construct a manager with its initial set of registered services.
    #[must_use]
    pub fn new(repo: Arc<ItemRepository>, events: EventBus, services: Vec<Arc<dyn Service>>) -> Self {
        let services: HashMap<&'static str, Arc<dyn Service>> =
            services.into_iter().map(|service| (service.name(), service)).collect();
        Self {
            repo,
            events,
            queue: std::sync::Mutex::new(EventQueue::new()),
            in_progress: InProgressSet::new(),
            services,
            notify: Notify::new(),
            shutdown: AtomicBool::new(false),
            health: std::sync::Mutex::new(BTreeSet::new()),
        }
    }

    /// Enqueue an event, waking a worker if one is idle.
    pub fn enqueue(&self, event: ScheduledEvent) {
        self.lock_queue().push(event);
        self.notify.notify_one();
    }

    /// Number of events currently queued (ready or parked).
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.lock_queue().len()
    }

    /// Spawn `worker_count` background dispatch loops against `self`. The
    /// manager must be wrapped in an `Arc` so workers can outlive this call.
    #[must_use]
    pub fn spawn_workers(self: &Arc<Self>, worker_count: usize) -> Vec<JoinHandle<()>> {
        (0..worker_count.max(1))
            .map(|worker_index| {
                let manager = Arc::clone(self);
                tokio::spawn(async move { manager.run_worker(worker_index).await })
            })
            .collect()
    }

    /// Signal all spawned workers to stop after their current dispatch pass.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    async fn run_worker(self: Arc<Self>, worker_index: usize) {
        let mut poll = tokio::time::interval(POLL_INTERVAL);
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            tokio::select! {
                () = self.notify.notified() => {}
                _ = poll.tick() => {}
            }
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            while self.dispatch_once().await {}
        }
        debug!(worker = worker_index, "dispatch worker shut down");
    }

    /// Dispatch a single ready event if one is available. Returns `true` if
    /// an event was popped (whether or not it ran), so callers can drain the
    /// queue in a tight loop without busy-waiting between pops.
    #[must_use]
    pub async fn dispatch_once(&self) -> bool {
        let now = Utc::now();
        let Some(event) = self.lock_queue().pop_ready(now) else {
            return false;
        };

        if !self.in_progress.try_acquire(event.item_id) {
            // Another worker already owns this item; defer briefly rather than
            // dropping the event.
            self.lock_queue().push(ScheduledEvent::at(
                event.item_id,
                event.emitted_by,
                now + chrono::Duration::milliseconds(50),
            ));
            return true;
        }

        self.process_event(&event).await;
        self.in_progress.release(event.item_id);
        true
    }

    async fn process_event(&self, event: &ScheduledEvent) {
        let state = match derive_state(&self.repo, event.item_id, Utc::now()) {
            Ok(state) => state,
            Err(err) => {
                self.mark_degraded("repository", &err.to_string());
                return;
            }
        };

        let Some(stage) = next_stage(state) else {
            debug!(item_id = %event.item_id, ?state, "item requires no further dispatch");
            return;
        };

        let Some(service) = self.services.get(stage) else {
            warn!(error = %crate::error::SchedulerError::UnknownStage { stage }, "routing failed");
            return;
        };

        let item = match self.repo.get(event.item_id) {
            Ok(item) => item,
            Err(err) => {
                self.mark_degraded("repository", &crate::error::SchedulerError::from(err).to_string());
                return;
            }
        };

        match service.run(item).await {
            Ok(ServiceOutcome::Advance(updated)) => {
                let id = updated.id;
                self.commit(updated, state);
                self.enqueue(ScheduledEvent::now(id, stage));
            }
            Ok(ServiceOutcome::Cooldown(updated, run_at)) => {
                let id = updated.id;
                self.commit(updated, state);
                self.enqueue(ScheduledEvent::at(id, stage, run_at));
            }
            Ok(ServiceOutcome::Fanout(items)) => {
                for updated in items {
                    let id = updated.id;
                    self.commit(updated, state);
                    self.enqueue(ScheduledEvent::now(id, stage));
                }
            }
            Ok(ServiceOutcome::Settled) => {}
            Err(err) => {
                warn!(stage, item_id = %event.item_id, error = %err, "service run failed");
                if let Some(retry_at) = err.cooldown {
                    self.enqueue(ScheduledEvent::at(event.item_id, stage, retry_at));
                } else {
                    self.fail_item(event.item_id, &err.message);
                    if let Err(source) = self.events.publish(Event::ItemFailed {
                        item_id: event.item_id,
                        reason: err.message,
                    }) {
                        let publish_err = crate::error::SchedulerError::EventPublish { item_id: event.item_id, source };
                        warn!(error = %publish_err, "failed to publish item-failed event");
                    }
                }
            }
        }
    }

    /// Stamp `item_id` with a terminal `failed_reason` alias so `derive_state`
    /// routes it to `Failed` on its next dispatch instead of re-running the
    /// service that just rejected it.
    fn fail_item(&self, item_id: Uuid, reason: &str) {
        let reason = serde_json::Value::String(reason.to_string());
        if let Err(err) = self.repo.update(item_id, move |item| {
            item.aliases.extra.insert(crate::state::FAILED_REASON_KEY.to_string(), reason);
        }) {
            self.mark_degraded("repository", &crate::error::SchedulerError::from(err).to_string());
        }
    }

    fn commit(&self, updated: MediaItem, previous: ItemState) {
        let id = updated.id;
        if let Err(err) = self.repo.update(id, move |item| *item = updated) {
            self.mark_degraded("repository", &crate::error::SchedulerError::from(err).to_string());
            return;
        }
        let Ok(current) = derive_state(&self.repo, id, Utc::now()) else {
            return;
        };
        if current != previous {
            if let Err(source) = self.events.publish(Event::ItemStateChanged {
                item_id: id,
                previous: Some(previous),
                state: current,
            }) {
                let err = crate::error::SchedulerError::EventPublish { item_id: id, source };
                warn!(error = %err, "failed to publish item-state-changed event");
            }
        }
    }

    fn mark_degraded(&self, component: &str, detail: &str) {
        let mut health = self.health.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let inserted = health.insert(component.to_string());
        if inserted {
            let degraded: Vec<String> = health.iter().cloned().collect();
            drop(health);
            warn!(component, detail, "scheduler component degraded");
            let _ = self.events.publish(Event::HealthChanged { degraded });
        } else {
            warn!(component, detail, "scheduler component still degraded");
        }
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, EventQueue> {
        self.queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
