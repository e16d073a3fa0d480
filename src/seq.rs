use std::fmt;

/// Monotonic arrival index assigned by the dispatcher at enqueue time.
///
/// Defines the total order of events on the queue and is the tie-breaker
/// for any ordering question between events from different adapters.
/// Sequence numbers start at 0 for a fresh dispatcher and never repeat
/// within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Seq(u64);

impl Seq {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Seq {
    fn from(value: u64) -> Self {
        Seq(value)
    }
}

impl From<Seq> for u64 {
    fn from(value: Seq) -> Self {
        value.0
    }
}

impl fmt::Display for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
