use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Discriminator for inbound wire-protocol stanzas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StanzaKind {
    /// An info/query request-response stanza.
    Iq,
    /// A presence broadcast.
    Presence,
    /// A message stanza.
    Message,
}

impl fmt::Display for StanzaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StanzaKind::Iq => "iq",
            StanzaKind::Presence => "presence",
            StanzaKind::Message => "message",
        };
        write!(f, "{name}")
    }
}

/// Structured view of one parsed inbound stanza.
///
/// The wire-stream adapter parses each inbound element and hands over this
/// record; the harness never touches raw XML. The common addressing and
/// query fields are first-class so patterns can constrain them by name
/// ("id", "to", "from", "iq-type", "query-ns", "query-name"); anything else
/// the test layer wants to match on goes into `fields`.
///
/// # Example
///
/// ```ignore
/// let disco = Stanza::new(StanzaKind::Iq)
///     .with_to("foo@bar.com/Foo")
///     .with_query("http://jabber.org/protocol/disco#info", "query");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stanza {
    kind: StanzaKind,
    id: Option<String>,
    from: Option<String>,
    to: Option<String>,
    iq_type: Option<String>,
    query_ns: Option<String>,
    query_name: Option<String>,
    fields: BTreeMap<String, Value>,
}

impl Stanza {
    pub fn new(kind: StanzaKind) -> Self {
        Self {
            kind,
            id: None,
            from: None,
            to: None,
            iq_type: None,
            query_ns: None,
            query_name: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Set the iq type ("get", "set", "result", "error").
    pub fn with_iq_type(mut self, iq_type: impl Into<String>) -> Self {
        self.iq_type = Some(iq_type.into());
        self
    }

    /// Set the namespace and element name of the nested query child.
    pub fn with_query(mut self, ns: impl Into<String>, name: impl Into<String>) -> Self {
        self.query_ns = Some(ns.into());
        self.query_name = Some(name.into());
        self
    }

    /// Attach an extra structured field the test layer wants to match on.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> StanzaKind {
        self.kind
    }

    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[inline]
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    #[inline]
    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    #[inline]
    pub fn iq_type(&self) -> Option<&str> {
        self.iq_type.as_deref()
    }

    #[inline]
    pub fn query_ns(&self) -> Option<&str> {
        self.query_ns.as_deref()
    }

    #[inline]
    pub fn query_name(&self) -> Option<&str> {
        self.query_name.as_deref()
    }

    /// Named-field lookup used by pattern constraints.
    ///
    /// The addressing and query fields resolve by their well-known names;
    /// anything else falls through to the extra `fields` map.
    pub(crate) fn field(&self, name: &str) -> Option<Value> {
        let text = |s: &Option<String>| s.clone().map(Value::String);
        match name {
            "stanza" => Some(Value::String(self.kind.to_string())),
            "id" => text(&self.id),
            "from" => text(&self.from),
            "to" => text(&self.to),
            "iq-type" => text(&self.iq_type),
            "query-ns" => text(&self.query_ns),
            "query-name" => text(&self.query_name),
            other => self.fields.get(other).cloned(),
        }
    }
}

impl fmt::Display for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(iq_type) = &self.iq_type {
            write!(f, " type={iq_type}")?;
        }
        if let Some(id) = &self.id {
            write!(f, " id={id}")?;
        }
        if let Some(from) = &self.from {
            write!(f, " from={from}")?;
        }
        if let Some(to) = &self.to {
            write!(f, " to={to}")?;
        }
        if let Some(ns) = &self.query_ns {
            write!(f, " query-ns={ns}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_known_fields_resolve_by_name() {
        let stanza = Stanza::new(StanzaKind::Iq)
            .with_id("h7")
            .with_to("foo@bar.com/Foo")
            .with_iq_type("get")
            .with_query("http://jabber.org/protocol/disco#info", "query");

        assert_eq!(stanza.field("id"), Some(json!("h7")));
        assert_eq!(stanza.field("to"), Some(json!("foo@bar.com/Foo")));
        assert_eq!(stanza.field("iq-type"), Some(json!("get")));
        assert_eq!(
            stanza.field("query-ns"),
            Some(json!("http://jabber.org/protocol/disco#info"))
        );
        assert_eq!(stanza.field("query-name"), Some(json!("query")));
        assert_eq!(stanza.field("from"), None);
    }

    #[test]
    fn extra_fields_fall_through_to_map() {
        let stanza = Stanza::new(StanzaKind::Iq).with_field("action", "session-initiate");
        assert_eq!(stanza.field("action"), Some(json!("session-initiate")));
        assert_eq!(stanza.field("sid"), None);
    }

    #[test]
    fn display_names_discriminator_and_addressing() {
        let stanza = Stanza::new(StanzaKind::Presence).with_from("romeo@montague.lit");
        assert_eq!(stanza.to_string(), "presence from=romeo@montague.lit");
        assert_eq!(Stanza::new(StanzaKind::Message).to_string(), "message");
        assert_eq!(StanzaKind::Iq.to_string(), "iq");
    }
}
