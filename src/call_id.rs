use std::{fmt, hash};
use uuid::Uuid;

/// Correlation id for an asynchronously issued call.
///
/// Chosen by the [`Correlator`](crate::Correlator) when the call is issued
/// and echoed back by the external RPC layer when the outcome arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallId(u128);

impl CallId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_u128())
    }

    pub fn value(&self) -> u128 {
        self.0
    }
}

impl From<u128> for CallId {
    fn from(value: u128) -> Self {
        CallId(value)
    }
}

impl From<CallId> for u128 {
    fn from(value: CallId) -> Self {
        value.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_u128(self.0))
    }
}

impl Default for CallId {
    fn default() -> Self {
        CallId::new()
    }
}
