//! Per-provider cooldown tracking.
//!
//! Provider-level state changes rarely (a circuit breaker opening), so a
//! single mutex guarding a small map is sufficient; no per-item contention is
//! expected here.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Default circuit-breaker cooldown applied when a provider raises
/// `CircuitBreakerOpen`.
pub const CIRCUIT_BREAKER_COOLDOWN_SECONDS: i64 = 60;

/// Tracks per-provider cooldown deadlines after a circuit breaker trips.
#[derive(Debug, Default)]
pub struct CooldownRegistry {
    deadlines: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl CooldownRegistry {
    /// Construct an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cooldown for `provider` starting now, using the default
    /// circuit-breaker duration.
    pub fn trip(&self, provider: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        let until = now + Duration::seconds(CIRCUIT_BREAKER_COOLDOWN_SECONDS);
        self.lock().insert(provider.to_string(), until);
        until
    }

    /// Whether `provider` is currently cooling down as of `now`.
    #[must_use]
    pub fn is_cooling_down(&self, provider: &str, now: DateTime<Utc>) -> bool {
        self.lock()
            .get(provider)
            .is_some_and(|deadline| *deadline > now)
    }

    /// Clear a provider's cooldown (e.g. after a successful retry).
    pub fn clear(&self, provider: &str) {
        self.lock().remove(provider);
    }

    /// The earliest cooldown deadline across all providers, if any are
    /// currently cooling down.
    #[must_use]
    pub fn earliest_deadline(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.lock()
            .values()
            .filter(|deadline| **deadline > now)
            .min()
            .copied()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.deadlines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_sets_a_sixty_second_cooldown() {
        let registry = CooldownRegistry::new();
        let now = Utc::now();
        let until = registry.trip("realdebrid", now);
        assert_eq!(
            (until - now).num_seconds(),
            CIRCUIT_BREAKER_COOLDOWN_SECONDS
        );
        assert!(registry.is_cooling_down("realdebrid", now));
        assert!(!registry.is_cooling_down("realdebrid", until + Duration::seconds(1)));
    }

    #[test]
    fn earliest_deadline_picks_the_soonest_active_cooldown() {
        let registry = CooldownRegistry::new();
        let now = Utc::now();
        registry.trip("realdebrid", now);
        registry
            .lock()
            .insert("alldebrid".into(), now + Duration::seconds(5));
        let earliest = registry.earliest_deadline(now).expect("one active cooldown");
        assert_eq!(earliest, now + Duration::seconds(5));
    }

    #[test]
    fn clear_removes_the_cooldown() {
        let registry = CooldownRegistry::new();
        let now = Utc::now();
        registry.trip("realdebrid", now);
        registry.clear("realdebrid");
        assert!(!registry.is_cooling_down("realdebrid", now));
    }
}
