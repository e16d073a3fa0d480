use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use crate::{CallId, Error, EventSink, Payload, Result, Seq};

/// The seam to the external RPC collaborator.
///
/// `submit` must hand the call to the transport without blocking the
/// caller (queueing is the transport's business). The transport later
/// reports the outcome by calling [`Correlator::resolve`] with the same
/// [`CallId`].
pub trait CallTransport: Send + Sync {
    fn submit(&self, call: &OutboundCall) -> Result;
}

/// One asynchronously issued call, as handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundCall {
    id: CallId,
    target: String,
    method: String,
    args: Vec<Value>,
}

impl OutboundCall {
    #[inline]
    pub fn id(&self) -> CallId {
        self.id
    }

    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

/// The eventual outcome of an issued call, as delivered by the RPC layer.
///
/// Cancellation, if the transport offers it, arrives as an ordinary
/// `Failed` outcome; the correlator never synthesizes one.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The call returned successfully with an ordered value list.
    Returned(Vec<Value>),
    /// The call failed with an error identifier and message.
    Failed { name: String, message: String },
}

/// Bookkeeping for one call awaiting its outcome. `issued -> resolved`,
/// no retries, no cancellation from this layer.
struct Pending {
    method: String,
    resolved: bool,
}

/// Wraps async calls so their outcomes surface as ordinary events.
///
/// `call_async` issues a call through the transport and registers a
/// pending entry under a fresh correlation id; when the RPC call adapter
/// later delivers the outcome, [`resolve`](Self::resolve) converts it into
/// a `call-return` or `call-error` event pushed through the normal sink
/// path. Expectation patterns can then reference call outcomes uniformly
/// alongside protocol events — which is what makes relative-ordering
/// assertions between an RPC's completion and other notifications
/// possible at all.
///
/// Clonable; the issuing side and the adapter callback side may hold
/// their own copies.
#[derive(Clone)]
pub struct Correlator {
    transport: Arc<dyn CallTransport>,
    sink: EventSink,
    pending: Arc<Mutex<HashMap<CallId, Pending>>>,
}

impl Correlator {
    pub(crate) fn new(transport: Arc<dyn CallTransport>, sink: EventSink) -> Self {
        Self {
            transport,
            sink,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Issue `method` on `target` without waiting for the outcome.
    ///
    /// The pending entry is registered before the transport sees the call,
    /// so a transport that completes synchronously may resolve from within
    /// `submit`.
    pub fn call_async(
        &self,
        target: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
    ) -> Result<CallId> {
        let call = OutboundCall {
            id: CallId::new(),
            target: target.into(),
            method: method.into(),
            args,
        };
        self.lock()?.insert(
            call.id,
            Pending {
                method: call.method.clone(),
                resolved: false,
            },
        );
        debug!(id = %call.id, method = %call.method, "call issued");

        if let Err(e) = self.transport.submit(&call) {
            self.lock()?.remove(&call.id);
            return Err(e);
        }
        Ok(call.id)
    }

    /// Deliver the outcome for an issued call. Called by the RPC call
    /// adapter exactly once per call.
    ///
    /// Converts the outcome into a `call-return`/`call-error` event and
    /// enqueues it. A second resolution fails with
    /// [`Error::DoubleResolution`]; an id this session never issued fails
    /// with [`Error::UnknownCall`]. Both indicate a contract violation in
    /// the external layer and must abort the run.
    pub fn resolve(&self, id: CallId, outcome: CallOutcome) -> Result<Seq> {
        let method = {
            let mut pending = self.lock()?;
            let entry = pending.get_mut(&id).ok_or(Error::UnknownCall(id))?;
            if entry.resolved {
                return Err(Error::DoubleResolution(id));
            }
            entry.resolved = true;
            entry.method.clone()
        };
        debug!(id = %id, method = %method, "call resolved");

        let payload = match outcome {
            CallOutcome::Returned(values) => Payload::CallReturn { method, values },
            CallOutcome::Failed { name, message } => Payload::CallError {
                method,
                name,
                message,
            },
        };
        self.sink.push(payload)
    }

    /// Number of issued calls still awaiting their outcome.
    pub fn outstanding(&self) -> usize {
        self.lock()
            .map(|p| p.values().filter(|e| !e.resolved).count())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<CallId, Pending>>> {
        self.pending
            .lock()
            .map_err(|_| Error::Internal("pending-call table lock poisoned".into()))
    }
}

impl fmt::Debug for Correlator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Correlator")
            .field("sink", &self.sink)
            .field("outstanding", &self.outstanding())
            .finish_non_exhaustive()
    }
}
