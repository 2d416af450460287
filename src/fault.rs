//! Fault Trigger
//!
//! The one piece of "business logic" in this application: log a critical
//! marker, then fail. Deterministic, unconditional, unrecoverable.

use tracing::error;

use crate::error::Error;
use crate::telemetry::{Severity, TelemetrySink};

/// Fixed marker logged immediately before the fault is raised.
///
/// Alert rules in the monitoring backend key off this exact string.
pub const CRASH_MARKER: &str = "INTENTIONAL_CRASH_TRIGGERED: preparing to raise the fault.";

/// Exception type name reported alongside the fault.
pub const FAULT_KIND: &str = "IntentionalCrash";

/// Trigger the intentional fault.
///
/// Emits exactly one critical-severity structured log event, mirrors it to
/// the telemetry sink, and returns the fixed fault. This function never
/// produces a success; the caller must treat the returned error as the
/// guaranteed abnormal end of the current request.
pub fn intentional_crash(sink: &dyn TelemetrySink) -> Error {
    error!(severity = "critical", "{CRASH_MARKER}");
    sink.track_trace(Severity::Critical, CRASH_MARKER);
    Error::IntentionalFault
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{RecordedEvent, RecordingSink};

    #[test]
    fn always_returns_the_fixed_fault() {
        let sink = RecordingSink::new();
        let first = intentional_crash(&sink);
        let second = intentional_crash(&sink);

        assert!(matches!(first, Error::IntentionalFault));
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn emits_exactly_one_critical_trace_per_invocation() {
        let sink = RecordingSink::new();
        let _fault = intentional_crash(&sink);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            RecordedEvent::Trace {
                severity: Severity::Critical,
                message: CRASH_MARKER.to_string(),
            }
        );
    }
}
