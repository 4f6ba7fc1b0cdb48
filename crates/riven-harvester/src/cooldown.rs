//! Attempt-cap and 24-hour cooldown bookkeeping for harvester calls.
//!
//! The harvester is unreliable enough upstream that callers cap retries per
//! item rather than hammering it: after 3 attempts an item is parked for 24
//! hours before another call is considered.

use chrono::{DateTime, Duration, Utc};
use riven_media::Aliases;

const MAX_ATTEMPTS: u8 = 3;
const COOLDOWN_HOURS: i64 = 24;

/// Whether a harvester call should be attempted now for an item carrying
/// `aliases`.
#[must_use]
pub fn should_attempt(aliases: &Aliases, now: DateTime<Utc>) -> bool {
    if aliases.w2p_attempt_count < MAX_ATTEMPTS {
        return true;
    }
    match aliases.w2p_last_attempt {
        Some(last) => now - last >= Duration::hours(COOLDOWN_HOURS),
        None => true,
    }
}

/// Record that a harvester attempt was made at `now`. Once the cooldown
/// window elapses past `MAX_ATTEMPTS`, the counter resets so the item gets a
/// fresh run of attempts.
pub fn record_attempt(aliases: &mut Aliases, now: DateTime<Utc>) {
    let past_cooldown = aliases
        .w2p_last_attempt
        .is_some_and(|last| now - last >= Duration::hours(COOLDOWN_HOURS));
    if aliases.w2p_attempt_count >= MAX_ATTEMPTS && past_cooldown {
        aliases.w2p_attempt_count = 0;
    }
    aliases.w2p_attempt_count = aliases.w2p_attempt_count.saturating_add(1).min(MAX_ATTEMPTS);
    aliases.w2p_last_attempt = Some(now);
}
