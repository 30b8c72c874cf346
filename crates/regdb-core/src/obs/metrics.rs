use crate::{obs::sink::MetricsEvent, update::UpdateState};
use parking_lot::{Mutex, const_mutex};
use serde::{Deserialize, Serialize};

///
/// MetricsReport
/// Process-wide counters for the write path.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub updates_started: u64,
    pub updates_indexed: u64,
    pub updates_failed: u64,

    pub retry_attempts: u64,
    pub authentication_failures: u64,
    pub validation_blocks: u64,

    // Index maintenance
    pub index_inserts: u64,
    pub index_removes: u64,
}

impl MetricsReport {
    const fn new() -> Self {
        Self {
            updates_started: 0,
            updates_indexed: 0,
            updates_failed: 0,
            retry_attempts: 0,
            authentication_failures: 0,
            validation_blocks: 0,
            index_inserts: 0,
            index_removes: 0,
        }
    }

    pub(crate) fn apply(&mut self, event: MetricsEvent) {
        match event {
            MetricsEvent::UpdateStart => {
                self.updates_started = self.updates_started.saturating_add(1);
            }
            MetricsEvent::UpdateFinish { state } => match state {
                UpdateState::Indexed => {
                    self.updates_indexed = self.updates_indexed.saturating_add(1);
                }
                UpdateState::Failed => {
                    self.updates_failed = self.updates_failed.saturating_add(1);
                }
                _ => {}
            },
            MetricsEvent::RetryAttempt => {
                self.retry_attempts = self.retry_attempts.saturating_add(1);
            }
            MetricsEvent::AuthenticationFailed => {
                self.authentication_failures = self.authentication_failures.saturating_add(1);
            }
            MetricsEvent::ValidationBlocked => {
                self.validation_blocks = self.validation_blocks.saturating_add(1);
            }
            MetricsEvent::IndexDelta { inserts, removes } => {
                self.index_inserts = self.index_inserts.saturating_add(inserts);
                self.index_removes = self.index_removes.saturating_add(removes);
            }
        }
    }
}

static STATE: Mutex<MetricsReport> = const_mutex(MetricsReport::new());

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut MetricsReport) -> R) -> R {
    f(&mut STATE.lock())
}

pub(crate) fn snapshot() -> MetricsReport {
    STATE.lock().clone()
}

pub(crate) fn reset() {
    *STATE.lock() = MetricsReport::new();
}
