use std::fmt;
use std::time::Duration;

use crate::{CallId, Event};

/// The single error type for all protoq operations.
///
/// Every fallible protoq API returns `protoq::Result<T>` (alias for
/// `Result<T, protoq::Error>`). `Timeout` and `UnexpectedEvent` are
/// assertion failures the test driver reports; `ForbiddenMatch` is always
/// fatal to the current test; `DoubleResolution`, `UnknownCall` and
/// `MalformedEvent` are contract violations by the external layer or an
/// adapter and must abort the run rather than be masked. Nothing is
/// retried automatically.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// No matching event arrived before the deadline.
    ///
    /// Carries the still-unsatisfied patterns and the most recently
    /// observed non-matching events to aid diagnosis.
    #[error("timed out after {waited:?}: {report}")]
    Timeout {
        waited: Duration,
        report: TimeoutReport,
    },

    /// An event matched a registered forbidden pattern.
    #[error("forbidden pattern [{pattern}] matched event {event}")]
    ForbiddenMatch { event: Box<Event>, pattern: String },

    /// The external RPC layer delivered a second outcome for a call that
    /// was already resolved.
    #[error("call {0} resolved twice")]
    DoubleResolution(CallId),

    /// The external RPC layer delivered an outcome for a call this
    /// session never issued.
    #[error("outcome delivered for unknown call {0}")]
    UnknownCall(CallId),

    /// An adapter produced an event missing required payload fields.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// `demand` found a queued event that does not match the pattern.
    #[error("expected [{expected}], got event {event}")]
    UnexpectedEvent { event: Box<Event>, expected: String },

    /// The dispatcher queue was torn down while an operation needed it.
    #[error("event queue closed")]
    QueueClosed,

    /// A harness-internal invariant was violated (e.g. a poisoned lock).
    /// Always fatal; never masked or retried.
    #[error("internal harness error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn timeout(waited: Duration, pending: Vec<String>, recent: Vec<String>) -> Self {
        Error::Timeout {
            waited,
            report: TimeoutReport { pending, recent },
        }
    }
}

/// Diagnostic detail attached to [`Error::Timeout`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeoutReport {
    /// Renderings of the patterns still unsatisfied when the deadline hit.
    pub pending: Vec<String>,
    /// Renderings of the last observed events that matched nothing.
    pub recent: Vec<String>,
}

impl fmt::Display for TimeoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pending.is_empty() {
            write!(f, "no event arrived")?;
        } else {
            write!(f, "unsatisfied [{}]", self.pending.join("; "))?;
        }
        if !self.recent.is_empty() {
            write!(f, ", recently observed: {}", self.recent.join(" | "))?;
        }
        Ok(())
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Timeout {
                    waited: a,
                    report: ar,
                },
                Self::Timeout {
                    waited: b,
                    report: br,
                },
            ) => a == b && ar == br,
            (
                Self::ForbiddenMatch {
                    event: a,
                    pattern: ap,
                },
                Self::ForbiddenMatch {
                    event: b,
                    pattern: bp,
                },
            ) => a == b && ap == bp,
            (Self::DoubleResolution(a), Self::DoubleResolution(b)) => a == b,
            (Self::UnknownCall(a), Self::UnknownCall(b)) => a == b,
            (Self::MalformedEvent(a), Self::MalformedEvent(b)) => a == b,
            (
                Self::UnexpectedEvent {
                    event: a,
                    expected: ap,
                },
                Self::UnexpectedEvent {
                    event: b,
                    expected: bp,
                },
            ) => a == b && ap == bp,
            (Self::QueueClosed, Self::QueueClosed) => true,
            (Self::Internal(a), Self::Internal(b)) => a == b,
            _ => false,
        }
    }
}
