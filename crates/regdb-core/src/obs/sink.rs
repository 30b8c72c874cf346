//! Metrics sink boundary.
//!
//! Pipeline logic never touches `obs::metrics` directly; every counter
//! update flows through `MetricsEvent` and `MetricsSink`.
use crate::{
    obs::metrics::{self, MetricsReport},
    update::UpdateState,
};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    UpdateStart,
    UpdateFinish { state: UpdateState },
    RetryAttempt,
    AuthenticationFailed,
    ValidationBlocked,
    IndexDelta { inserts: u64, removes: u64 },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink writing into process-wide counters.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| m.apply(event));
    }
}

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Snapshot of the global counters.
#[must_use]
pub fn metrics_report() -> MetricsReport {
    metrics::snapshot()
}

/// Reset the global counters.
pub fn metrics_reset() {
    metrics::reset();
}

/// Run a closure with a sink override installed on this thread.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let previous = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(previous);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct CaptureSink(RefCell<Vec<MetricsEvent>>);

    impl MetricsSink for CaptureSink {
        fn record(&self, event: MetricsEvent) {
            self.0.borrow_mut().push(event);
        }
    }

    #[test]
    fn override_captures_events_and_is_restored() {
        let capture = Rc::new(CaptureSink::default());

        with_metrics_sink(capture.clone(), || {
            record(MetricsEvent::UpdateStart);
            record(MetricsEvent::IndexDelta {
                inserts: 2,
                removes: 1,
            });
        });

        assert_eq!(
            capture.0.borrow().as_slice(),
            &[
                MetricsEvent::UpdateStart,
                MetricsEvent::IndexDelta {
                    inserts: 2,
                    removes: 1
                }
            ]
        );
        assert!(
            SINK_OVERRIDE.with(|cell| cell.borrow().is_none()),
            "override must be removed after the scope"
        );
    }

    #[test]
    fn report_applies_events() {
        let mut report = MetricsReport::default();

        report.apply(MetricsEvent::UpdateFinish {
            state: UpdateState::Indexed,
        });
        report.apply(MetricsEvent::UpdateFinish {
            state: UpdateState::Failed,
        });
        report.apply(MetricsEvent::IndexDelta {
            inserts: 3,
            removes: 2,
        });

        assert_eq!(report.updates_indexed, 1);
        assert_eq!(report.updates_failed, 1);
        assert_eq!(report.index_inserts, 3);
        assert_eq!(report.index_removes, 2);
    }
}
