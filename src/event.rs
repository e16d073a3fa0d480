use std::{fmt, time::SystemTime};

use serde_json::Value;

use crate::{EventKind, Payload, Seq, SourceId};

/// One immutable occurrence on the dispatcher queue.
///
/// Pairs a kind-specific [`Payload`] with its origin adapter, the arrival
/// sequence number the dispatcher assigned at enqueue time, and a
/// nanosecond timestamp. Events are constructed only by the dispatcher;
/// ownership transfers from adapter to dispatcher to whichever expectation
/// consumes the event.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    seq: Seq,
    origin: SourceId,
    timestamp: u64,
    payload: Payload,
}

impl Event {
    pub(crate) fn new(seq: Seq, origin: SourceId, payload: Payload) -> Self {
        Self {
            seq,
            origin,
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default(),
            payload,
        }
    }

    /// Arrival index assigned by the dispatcher. Total order, never reused.
    #[inline]
    pub fn seq(&self) -> Seq {
        self.seq
    }

    /// The adapter that produced this event.
    #[inline]
    pub fn origin(&self) -> &SourceId {
        &self.origin
    }

    /// Enqueue time in nanoseconds since the Unix epoch.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns a reference to the kind-specific payload.
    ///
    /// This is the entry point for matching on payload shape:
    ///
    /// ```ignore
    /// match event.payload() {
    ///     Payload::Signal { member, args } => check(member, args),
    ///     _ => {}
    /// }
    /// ```
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Shorthand for `self.payload().kind()`.
    #[inline]
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Shorthand for `self.payload().field(name)`.
    #[inline]
    pub fn field(&self, name: &str) -> Option<Value> {
        self.payload.field(name)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq && self.payload == other.payload
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("seq", &self.seq)
            .field("origin", &self.origin)
            .field("payload", &self.payload)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.seq, self.origin, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors_delegate_to_payload() {
        let event = Event::new(
            Seq::from(3),
            SourceId::new("rpc-bus"),
            Payload::Signal {
                member: "StatusChanged".into(),
                args: vec![json!(0), json!(1)],
            },
        );

        assert_eq!(event.kind(), EventKind::SignalDelivery);
        assert_eq!(event.field("member"), Some(json!("StatusChanged")));
        assert_eq!(event.seq().value(), 3);
        assert_eq!(event.origin().as_str(), "rpc-bus");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip_preserves_the_event() {
        use crate::{Stanza, StanzaKind};

        let event = Event::new(
            Seq::from(7),
            SourceId::new("xmpp-stream"),
            Payload::Stanza(
                Stanza::new(StanzaKind::Iq)
                    .with_id("h7")
                    .with_from("foo@bar.com/Foo")
                    .with_query("http://jabber.org/protocol/disco#info", "query")
                    .with_field("action", "session-initiate"),
            ),
        );

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(back, event);
        assert_eq!(back.origin(), event.origin());
        assert_eq!(back.timestamp(), event.timestamp());
        assert_eq!(back.field("action"), Some(json!("session-initiate")));
    }

    #[test]
    fn display_names_seq_origin_and_payload() {
        let event = Event::new(
            Seq::from(0),
            SourceId::new("rpc-bus"),
            Payload::Marker { label: "sync".into() },
        );
        assert_eq!(event.to_string(), "#0 [rpc-bus] synthetic sync");
    }
}
