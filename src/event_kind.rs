use std::fmt;

/// The closed set of event categories the harness understands.
///
/// Every [`Event`](crate::Event) carries exactly one kind, derived from its
/// payload variant. Patterns may filter on kind; absence of a kind filter
/// matches any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// A signal delivered over the control-plane RPC bus.
    SignalDelivery,
    /// The successful return of an asynchronously issued call.
    CallReturn,
    /// The error outcome of an asynchronously issued call.
    CallError,
    /// A parsed inbound stanza from the wire-level protocol stream.
    StreamInbound,
    /// A locally synthesized event (injected delay, log marker).
    Synthetic,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::SignalDelivery => "signal-delivery",
            EventKind::CallReturn => "call-return",
            EventKind::CallError => "call-error",
            EventKind::StreamInbound => "stream-inbound",
            EventKind::Synthetic => "synthetic",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_wire_names() {
        assert_eq!(EventKind::SignalDelivery.to_string(), "signal-delivery");
        assert_eq!(EventKind::CallReturn.to_string(), "call-return");
        assert_eq!(EventKind::CallError.to_string(), "call-error");
        assert_eq!(EventKind::StreamInbound.to_string(), "stream-inbound");
        assert_eq!(EventKind::Synthetic.to_string(), "synthetic");
    }
}
