//! Injectable time source for open-ended span defaulting.
//!
//! A KML `<TimeSpan>` may omit its `<end>`; the reader then closes the span
//! at "now". The clock is an explicit dependency rather than ambient global
//! state so that repeated parses are deterministic under test.

use chrono::{SecondsFormat, Utc};

/// A source of "now" as date/time text.
pub trait Clock {
    fn now(&self) -> String;
}

/// Wall-clock UTC time, formatted as RFC 3339 (the KML dateTime profile).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// A clock pinned to a single instant.
#[derive(Clone, Debug)]
pub struct FixedClock {
    instant: String,
}

impl FixedClock {
    pub fn new(instant: impl Into<String>) -> Self {
        Self {
            instant: instant.into(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.instant.clone()
    }
}
