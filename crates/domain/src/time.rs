//! Timestamps for events.

use chrono::{DateTime, Utc};

/// UTC timestamp carried by every [`Event`](crate::event::Event).
pub type Timestamp = DateTime<Utc>;

/// Current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
