use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::trace;

use crate::{Error, Event, Payload, Result, Seq, SourceId};

/// Shared producer state: the channel sender plus the sequence counter.
///
/// Sequence assignment and the channel send happen under one lock, so two
/// concurrent pushes can never enqueue out of sequence order.
struct Shared {
    tx: UnboundedSender<Event>,
    next_seq: Mutex<u64>,
}

impl Shared {
    fn push(&self, origin: &SourceId, payload: Payload) -> Result<Seq> {
        payload.validate()?;
        let mut next = self
            .next_seq
            .lock()
            .map_err(|_| Error::Internal("event queue lock poisoned".into()))?;
        let seq = Seq::from(*next);
        let event = Event::new(seq, origin.clone(), payload);
        trace!(%event, "push");
        self.tx.send(event).map_err(|_| Error::QueueClosed)?;
        *next += 1;
        Ok(seq)
    }
}

/// Clonable producer handle bound to one adapter.
///
/// Obtained from [`Dispatcher::sink`] (usually via
/// [`Session::sink`](crate::Session::sink)). `push` validates the payload,
/// stamps it with the next sequence number and enqueues it. It never
/// blocks; it fails only when the payload violates the adapter contract
/// ([`Error::MalformedEvent`]) or the session is gone
/// ([`Error::QueueClosed`]).
#[derive(Clone)]
pub struct EventSink {
    origin: SourceId,
    shared: Arc<Shared>,
}

impl EventSink {
    /// Enqueue one event, returning the sequence number it was assigned.
    pub fn push(&self, payload: Payload) -> Result<Seq> {
        self.shared.push(&self.origin, payload)
    }

    /// The adapter this sink is bound to.
    pub fn origin(&self) -> &SourceId {
        &self.origin
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// The single ordered, unbounded event queue.
///
/// All adapters push into one `Dispatcher`; one logical consumer (the
/// expectation engine) pulls from the head. Events are never reordered or
/// dropped here: consumption order equals arrival order, and a timed-out
/// `pull` leaves unconsumed events available to the next caller.
pub struct Dispatcher {
    rx: UnboundedReceiver<Event>,
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            rx,
            shared: Arc::new(Shared {
                tx,
                next_seq: Mutex::new(0),
            }),
        }
    }

    /// Create a producer handle for the named adapter.
    pub fn sink(&self, origin: impl Into<SourceId>) -> EventSink {
        EventSink {
            origin: origin.into(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Remove and return the head event, waiting up to `timeout`.
    ///
    /// Fails with [`Error::Timeout`] on expiry. The queue is left intact:
    /// events pushed while this call was waiting are still there for a
    /// subsequent `pull`.
    pub async fn pull(&mut self, timeout: Duration) -> Result<Event> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(Error::QueueClosed),
            Err(_) => Err(Error::timeout(timeout, Vec::new(), Vec::new())),
        }
    }

    /// Remove and return the head event only if one is already queued.
    pub fn try_pull(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn marker(label: &str) -> Payload {
        Payload::Marker {
            label: label.into(),
        }
    }

    #[tokio::test]
    async fn pull_returns_events_in_push_order() {
        let mut dispatcher = Dispatcher::new();
        let sink = dispatcher.sink("test");

        for label in ["a", "b", "c"] {
            sink.push(marker(label)).unwrap();
        }

        for (i, label) in ["a", "b", "c"].iter().enumerate() {
            let event = dispatcher.pull(Duration::from_secs(1)).await.unwrap();
            assert_eq!(event.seq().value(), i as u64);
            assert_eq!(event.field("label"), Some(json!(*label)));
        }
    }

    #[tokio::test]
    async fn concurrent_pushes_keep_seq_aligned_with_arrival() {
        let mut dispatcher = Dispatcher::new();
        let mut handles = Vec::new();
        for t in 0..8 {
            let sink = dispatcher.sink(format!("adapter-{t}"));
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    sink.push(Payload::Signal {
                        member: format!("S{t}-{i}"),
                        args: vec![],
                    })
                    .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Arrival order and sequence numbers must agree exactly.
        for expected in 0..400u64 {
            let event = dispatcher.pull(Duration::from_secs(1)).await.unwrap();
            assert_eq!(event.seq().value(), expected);
        }
    }

    #[tokio::test]
    async fn pull_times_out_and_leaves_queue_intact() {
        let mut dispatcher = Dispatcher::new();
        let sink = dispatcher.sink("test");

        let err = dispatcher.pull(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));

        sink.push(marker("late")).unwrap();
        let event = dispatcher.pull(Duration::from_secs(1)).await.unwrap();
        assert_eq!(event.field("label"), Some(json!("late")));
    }

    #[tokio::test]
    async fn push_rejects_malformed_payload() {
        let dispatcher = Dispatcher::new();
        let sink = dispatcher.sink("test");
        let err = sink
            .push(Payload::Signal {
                member: String::new(),
                args: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, Error::MalformedEvent(_)));
    }

    #[tokio::test]
    async fn push_after_teardown_reports_closed_queue() {
        let dispatcher = Dispatcher::new();
        let sink = dispatcher.sink("test");
        drop(dispatcher);
        assert_eq!(sink.push(marker("x")).unwrap_err(), Error::QueueClosed);
    }

    #[tokio::test]
    async fn try_pull_does_not_wait() {
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.try_pull().is_none());

        dispatcher.sink("test").push(marker("queued")).unwrap();
        assert!(dispatcher.try_pull().is_some());
    }
}
