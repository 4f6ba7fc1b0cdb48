//! Event topic identifiers used across transports.

use crate::payloads::Event;

/// Machine-friendly discriminator for SSE consumers and log fields.
#[must_use]
pub const fn event_kind(event: &Event) -> &'static str {
    event.kind()
}
