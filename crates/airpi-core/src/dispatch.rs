//! Rate-limited hand-off of snapshots to an exporter.
//!
//! The display refreshes on every tick; the exporter only hears from us once
//! more than `interval` has passed since the previous attempt. An attempt
//! counts even when the exporter fails, so a dead collector never turns into
//! a send on every tick.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::export::{Event, EventTags, ExportError, Exporter};
use crate::model::Snapshot;

/// Minimum time between two exports.
pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_secs(1);

/// What happened on a `maybe_dispatch` call.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Too soon since the last attempt; the exporter was not called.
    Skipped,
    /// The exporter accepted the event.
    Sent,
    /// The exporter was called and failed.
    Failed(ExportError),
}

impl DispatchOutcome {
    /// Whether the exporter was called.
    pub fn attempted(&self) -> bool {
        !matches!(self, DispatchOutcome::Skipped)
    }
}

pub struct Dispatcher {
    last_sent: DateTime<Utc>,
    interval: Duration,
    tags: EventTags,
}

impl Dispatcher {
    /// Creates a dispatcher whose clock starts at `started_at`, so the first
    /// export happens once `interval` has elapsed from startup.
    pub fn new(started_at: DateTime<Utc>, interval: Duration, tags: EventTags) -> Self {
        Self {
            last_sent: started_at,
            interval,
            tags,
        }
    }

    pub fn last_sent(&self) -> DateTime<Utc> {
        self.last_sent
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Exports `snapshot` if strictly more than `interval` passed since the
    /// last attempt. `last_sent` moves to `now` after every attempt.
    pub fn maybe_dispatch(
        &mut self,
        now: DateTime<Utc>,
        snapshot: &Snapshot,
        exporter: &mut dyn Exporter,
    ) -> DispatchOutcome {
        // Negative elapsed (clock stepped back) fails to_std and never dispatches.
        let due = now
            .signed_duration_since(self.last_sent)
            .to_std()
            .is_ok_and(|elapsed| elapsed > self.interval);
        if !due {
            return DispatchOutcome::Skipped;
        }

        // Set before sending: a panicking exporter still counts as an attempt.
        self.last_sent = now;
        let event = Event::new(&self.tags, now, snapshot);

        match exporter.send(&event) {
            Ok(()) => {
                debug!("dispatched {} readings", snapshot.len());
                DispatchOutcome::Sent
            }
            Err(e) => {
                warn!("export failed: {}", e);
                DispatchOutcome::Failed(e)
            }
        }
    }
}
