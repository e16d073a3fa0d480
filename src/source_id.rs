use std::{hash::Hash, sync::Arc};

/// Identifier for an event source (one per adapter).
///
/// Each source adapter — RPC signal listener, RPC call-result listener,
/// wire-stream reader — names itself with a `SourceId` when it requests a
/// sink from the session. The id travels on every event the adapter
/// produces, so assertions and diagnostics can tell origins apart.
///
/// `SourceId` is cheap to clone and safe to serialize. Equality uses string
/// comparison with a fast-path for pointer equality when ids share the same
/// allocation.
///
/// # Example
///
/// ```ignore
/// let bus = session.sink(SourceId::new("rpc-bus"));
/// let stream = session.sink(SourceId::new("xmpp-stream"));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(Arc<str>);

impl SourceId {
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    /// Returns the string representation of this source ID.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for SourceId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for SourceId {}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Hash for SourceId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}
