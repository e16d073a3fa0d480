use std::fmt;

use serde_json::Value;

use crate::{Error, EventKind, Result, Stanza};

/// Kind-specific structured data carried by an [`Event`](crate::Event).
///
/// One variant per [`EventKind`]; the variant fixes the record shape so the
/// common fields stay statically typed, while pattern predicates cover
/// genuinely open-ended inspection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    /// A signal delivered by the control-plane bus: member name plus
    /// positional arguments.
    Signal { member: String, args: Vec<Value> },
    /// The return of an async call: method name plus ordered return values.
    CallReturn { method: String, values: Vec<Value> },
    /// The error outcome of an async call.
    CallError {
        method: String,
        name: String,
        message: String,
    },
    /// A parsed inbound wire-protocol stanza.
    Stanza(Stanza),
    /// A locally synthesized marker (injected delay, log marker).
    Marker { label: String },
}

impl Payload {
    /// The event kind this payload variant corresponds to.
    pub fn kind(&self) -> EventKind {
        match self {
            Payload::Signal { .. } => EventKind::SignalDelivery,
            Payload::CallReturn { .. } => EventKind::CallReturn,
            Payload::CallError { .. } => EventKind::CallError,
            Payload::Stanza(_) => EventKind::StreamInbound,
            Payload::Marker { .. } => EventKind::Synthetic,
        }
    }

    /// Named-field lookup used by pattern constraints.
    ///
    /// Returns `None` when the field does not exist on this variant, which
    /// a constraint treats as a non-match. Field names:
    ///
    /// - `Signal`: "member", "args"
    /// - `CallReturn`: "method", "values"
    /// - `CallError`: "method", "error-name", "error-message"
    /// - `Stanza`: "stanza", "id", "from", "to", "iq-type", "query-ns",
    ///   "query-name", plus any extra stanza fields
    /// - `Marker`: "label"
    pub fn field(&self, field: &str) -> Option<Value> {
        match (self, field) {
            (Payload::Signal { member, .. }, "member") => Some(Value::String(member.clone())),
            (Payload::Signal { args, .. }, "args") => Some(Value::Array(args.clone())),
            (Payload::CallReturn { method, .. }, "method") => Some(Value::String(method.clone())),
            (Payload::CallReturn { values, .. }, "values") => Some(Value::Array(values.clone())),
            (Payload::CallError { method, .. }, "method") => Some(Value::String(method.clone())),
            (Payload::CallError { name, .. }, "error-name") => Some(Value::String(name.clone())),
            (Payload::CallError { message, .. }, "error-message") => {
                Some(Value::String(message.clone()))
            }
            (Payload::Stanza(stanza), field) => stanza.field(field),
            (Payload::Marker { label }, "label") => Some(Value::String(label.clone())),
            _ => None,
        }
    }

    /// Check the adapter contract: required fields must be non-empty.
    ///
    /// Runs at push time so a malformed event aborts the run at its source
    /// instead of surfacing later as a mysterious non-match.
    pub(crate) fn validate(&self) -> Result {
        let missing = |what: &str| Err(Error::MalformedEvent(format!("{self}: empty {what}")));
        match self {
            Payload::Signal { member, .. } if member.is_empty() => missing("signal member"),
            Payload::CallReturn { method, .. } if method.is_empty() => missing("method name"),
            Payload::CallError { method, .. } if method.is_empty() => missing("method name"),
            Payload::CallError { name, .. } if name.is_empty() => missing("error name"),
            Payload::Marker { label } if label.is_empty() => missing("marker label"),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Signal { member, args } => {
                write!(f, "signal-delivery {member}{}", render_args(args))
            }
            Payload::CallReturn { method, values } => {
                write!(f, "call-return {method}{}", render_args(values))
            }
            Payload::CallError { method, name, .. } => {
                write!(f, "call-error {method}: {name}")
            }
            Payload::Stanza(stanza) => write!(f, "stream-inbound {stanza}"),
            Payload::Marker { label } => write!(f, "synthetic {label}"),
        }
    }
}

fn render_args(args: &[Value]) -> String {
    if args.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("({})", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StanzaKind;
    use serde_json::json;

    #[test]
    fn kind_follows_variant() {
        let signal = Payload::Signal {
            member: "StatusChanged".into(),
            args: vec![],
        };
        assert_eq!(signal.kind(), EventKind::SignalDelivery);

        let marker = Payload::Marker { label: "sync".into() };
        assert_eq!(marker.kind(), EventKind::Synthetic);

        let stanza = Payload::Stanza(Stanza::new(StanzaKind::Presence));
        assert_eq!(stanza.kind(), EventKind::StreamInbound);
    }

    #[test]
    fn signal_fields_resolve() {
        let signal = Payload::Signal {
            member: "StatusChanged".into(),
            args: vec![json!(1), json!(1)],
        };
        assert_eq!(signal.field("member"), Some(json!("StatusChanged")));
        assert_eq!(signal.field("args"), Some(json!([1, 1])));
        assert_eq!(signal.field("method"), None);
    }

    #[test]
    fn call_error_fields_resolve() {
        let error = Payload::CallError {
            method: "RequestHold".into(),
            name: "NotAvailable".into(),
            message: "no media session".into(),
        };
        assert_eq!(error.field("method"), Some(json!("RequestHold")));
        assert_eq!(error.field("error-name"), Some(json!("NotAvailable")));
        assert_eq!(error.field("error-message"), Some(json!("no media session")));
    }

    #[test]
    fn validate_rejects_empty_required_fields() {
        let bad_signal = Payload::Signal {
            member: String::new(),
            args: vec![],
        };
        assert!(matches!(
            bad_signal.validate(),
            Err(Error::MalformedEvent(_))
        ));

        let bad_error = Payload::CallError {
            method: "RequestHold".into(),
            name: String::new(),
            message: String::new(),
        };
        assert!(matches!(bad_error.validate(), Err(Error::MalformedEvent(_))));

        let good = Payload::Marker { label: "sync".into() };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn display_is_compact() {
        let signal = Payload::Signal {
            member: "SetStreamHeld".into(),
            args: vec![json!(true)],
        };
        assert_eq!(signal.to_string(), "signal-delivery SetStreamHeld(true)");
    }
}
