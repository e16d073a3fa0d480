use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::{Event, EventKind, StanzaKind};

type Predicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// A predicate describing which event(s) an expectation is waiting for.
///
/// A pattern has three layers, all optional and all of which must hold:
/// a kind filter, a map of named-field equality constraints (structural
/// equality on [`Payload::field`](crate::Payload::field) lookups), and a
/// free-form predicate for constraints not expressible as field equality.
/// An empty pattern matches every event.
///
/// Patterns are pure value objects: matching has no side effects and is
/// safe to run speculatively against events the caller never consumes.
///
/// # Example
///
/// ```ignore
/// // The next StatusChanged(0, 1) signal
/// let p = Pattern::signal("StatusChanged").with_field("args", json!([0, 1]));
///
/// // A disco request addressed to the remote contact
/// let p = Pattern::stream(StanzaKind::Iq)
///     .with_field("query-ns", "http://jabber.org/protocol/disco#info")
///     .with_field("to", "foo@bar.com/Foo");
///
/// // Open-ended inspection
/// let p = Pattern::of_kind(EventKind::SignalDelivery)
///     .matching(|e| e.field("args").is_some_and(|a| a[0] == json!(true)));
/// ```
#[derive(Clone)]
pub struct Pattern {
    kind: Option<EventKind>,
    fields: BTreeMap<String, Value>,
    predicate: Option<Predicate>,
}

impl Pattern {
    /// A pattern with no constraints. Matches any event.
    pub fn any() -> Self {
        Self {
            kind: None,
            fields: BTreeMap::new(),
            predicate: None,
        }
    }

    /// Match events of the given kind.
    pub fn of_kind(kind: EventKind) -> Self {
        Self {
            kind: Some(kind),
            fields: BTreeMap::new(),
            predicate: None,
        }
    }

    /// Shorthand: a signal delivery with the given member name.
    pub fn signal(member: impl Into<String>) -> Self {
        Self::of_kind(EventKind::SignalDelivery).with_field("member", member.into())
    }

    /// Shorthand: the successful return of the given method.
    pub fn call_return(method: impl Into<String>) -> Self {
        Self::of_kind(EventKind::CallReturn).with_field("method", method.into())
    }

    /// Shorthand: the error outcome of the given method.
    pub fn call_error(method: impl Into<String>) -> Self {
        Self::of_kind(EventKind::CallError).with_field("method", method.into())
    }

    /// Shorthand: an inbound stanza with the given discriminator.
    pub fn stream(kind: StanzaKind) -> Self {
        Self::of_kind(EventKind::StreamInbound).with_field("stanza", kind.to_string())
    }

    /// Shorthand: a synthetic marker with the given label.
    pub fn marker(label: impl Into<String>) -> Self {
        Self::of_kind(EventKind::Synthetic).with_field("label", label.into())
    }

    /// Require a named payload field to equal `value` (deep equality).
    ///
    /// The field must be present on the event for the constraint to hold;
    /// a field the payload variant does not carry never matches.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Add a free-form predicate checked after the kind and field layers.
    pub fn matching<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Returns true if the event satisfies every layer of this pattern.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(kind) = self.kind
            && event.kind() != kind
        {
            return false;
        }
        for (name, expected) in &self.fields {
            match event.field(name) {
                Some(actual) if actual == *expected => {}
                _ => return false,
            }
        }
        match &self.predicate {
            Some(predicate) => predicate(event),
            None => true,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{kind}")?,
            None => write!(f, "any")?,
        }
        for (name, value) in &self.fields {
            write!(f, " {name}={value}")?;
        }
        if self.predicate.is_some() {
            write!(f, " +predicate")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Payload, Seq, SourceId, Stanza};
    use serde_json::json;

    fn event(payload: Payload) -> Event {
        Event::new(Seq::from(0), SourceId::new("test"), payload)
    }

    fn status_changed(args: Vec<Value>) -> Event {
        event(Payload::Signal {
            member: "StatusChanged".into(),
            args,
        })
    }

    #[test]
    fn empty_pattern_matches_anything() {
        assert!(Pattern::any().matches(&status_changed(vec![])));
        assert!(Pattern::any().matches(&event(Payload::Marker { label: "x".into() })));
    }

    #[test]
    fn kind_filter_discriminates() {
        let p = Pattern::of_kind(EventKind::SignalDelivery);
        assert!(p.matches(&status_changed(vec![])));
        assert!(!p.matches(&event(Payload::Marker { label: "x".into() })));
    }

    #[test]
    fn field_constraints_use_deep_equality() {
        let p = Pattern::signal("StatusChanged").with_field("args", json!([1, 1]));
        assert!(p.matches(&status_changed(vec![json!(1), json!(1)])));
        assert!(!p.matches(&status_changed(vec![json!(0), json!(1)])));
        assert!(!p.matches(&status_changed(vec![])));
    }

    #[test]
    fn absent_field_never_matches() {
        // Signals carry no "method" field, so the constraint cannot hold.
        let p = Pattern::any().with_field("method", "RequestHold");
        assert!(!p.matches(&status_changed(vec![])));
    }

    #[test]
    fn predicate_runs_after_field_layers() {
        let p = Pattern::signal("StatusChanged")
            .matching(|e| e.field("args").is_some_and(|a| a == json!([2, 1])));
        assert!(p.matches(&status_changed(vec![json!(2), json!(1)])));
        assert!(!p.matches(&status_changed(vec![json!(1), json!(1)])));
    }

    #[test]
    fn stream_shorthand_constrains_discriminator() {
        let iq = event(Payload::Stanza(
            Stanza::new(StanzaKind::Iq).with_query("jabber:iq:roster", "query"),
        ));
        let presence = event(Payload::Stanza(Stanza::new(StanzaKind::Presence)));

        let p = Pattern::stream(StanzaKind::Iq).with_field("query-ns", "jabber:iq:roster");
        assert!(p.matches(&iq));
        assert!(!p.matches(&presence));
    }

    #[test]
    fn display_renders_constraints() {
        let p = Pattern::signal("SetStreamHeld").with_field("args", json!([true]));
        assert_eq!(
            p.to_string(),
            "signal-delivery args=[true] member=\"SetStreamHeld\""
        );
    }
}
