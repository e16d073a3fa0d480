use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::{
    CallTransport, Correlator, Dispatcher, Error, Event, EventSink, Expect, ExpectMany,
    ForbidHandle, ForbiddenSet, Pattern, Result, Seq, SessionConfig, SourceId,
};

/// One test run's shared state: the dispatcher, the forbidden set and the
/// observed-event history.
///
/// The session is the single logical consumer of the event queue — only
/// one `expect`/`expect_many` is active at a time, matching the
/// single-threaded narrative of the test scripts this engine serves.
/// Adapters are handed clonable [`EventSink`]s and push concurrently;
/// nothing here is a process-wide singleton, so tests can run sessions in
/// parallel.
///
/// # Example
///
/// ```ignore
/// let mut session = Session::new();
/// let bus = session.sink("rpc-bus");
/// let hold = session.correlator("rpc-calls", transport.clone());
///
/// hold.call_async("hold-iface", "RequestHold", vec![json!(true)])?;
/// session.expect(Pattern::signal("SetStreamHeld").with_field("args", json!([true]))).await?;
/// session.expect(Pattern::call_return("RequestHold")).await?;
/// ```
pub struct Session {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) forbidden: ForbiddenSet,
    history: VecDeque<Event>,
    synthetic: EventSink,
    config: SessionConfig,
}

impl Session {
    /// Create a session with default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let dispatcher = Dispatcher::new();
        let synthetic = dispatcher.sink("synthetic");
        Self {
            dispatcher,
            forbidden: ForbiddenSet::new(),
            history: VecDeque::new(),
            synthetic,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ==================== Adapter Handles ====================

    /// Create a producer handle for the named adapter.
    ///
    /// Adapters run as independent concurrent producers; pushes from
    /// different sinks interleave in arrival order on the one queue.
    pub fn sink(&self, origin: impl Into<SourceId>) -> EventSink {
        self.dispatcher.sink(origin)
    }

    /// Create a call correlator that issues through `transport` and
    /// surfaces outcomes as events from the named origin.
    pub fn correlator(
        &self,
        origin: impl Into<SourceId>,
        transport: Arc<dyn CallTransport>,
    ) -> Correlator {
        Correlator::new(transport, self.sink(origin))
    }

    // ==================== Expectations ====================

    /// Wait for the next event matching `pattern`.
    ///
    /// Returns an [`Expect`] so `.within()` and `.await` chain as usual.
    /// Non-matching events are skipped (and retained for diagnostics);
    /// a forbidden match fails the expectation immediately.
    pub fn expect(&mut self, pattern: Pattern) -> Expect<'_> {
        Expect::new(self, pattern)
    }

    /// Wait until every pattern in the set has matched one event,
    /// regardless of arrival order among them.
    ///
    /// The result is aligned with pattern declaration order. See
    /// [`ExpectMany`] for the first-fit tie-break policy.
    pub fn expect_many(&mut self, patterns: Vec<Pattern>) -> ExpectMany<'_> {
        ExpectMany::new(self, patterns)
    }

    /// Take the next already-queued event, failing if none is queued or
    /// if it does not match `pattern`.
    ///
    /// The non-blocking sibling of [`expect`](Self::expect), for tests
    /// that want to assert an event has *already* arrived.
    pub fn demand(&mut self, pattern: &Pattern) -> Result<Event> {
        let Some(event) = self.dispatcher.try_pull() else {
            return Err(self.expect_timeout(Duration::ZERO, &[pattern]));
        };
        self.forbidden.check(&event)?;
        if pattern.matches(&event) {
            debug!(%event, %pattern, "demand matched");
            return Ok(event);
        }
        Err(Error::UnexpectedEvent {
            event: Box::new(event),
            expected: pattern.to_string(),
        })
    }

    // ==================== Forbidden Events ====================

    /// Register a pattern that must not match any observed event.
    ///
    /// While registered, any event pulled by an expectation that matches
    /// it raises [`Error::ForbiddenMatch`] before the expectation's own
    /// pattern is even consulted.
    pub fn forbid(&mut self, pattern: Pattern) -> ForbidHandle {
        self.forbidden.forbid(pattern)
    }

    /// Lift a ban. Events observed while it was active are unaffected.
    pub fn unforbid(&mut self, handle: ForbidHandle) -> bool {
        self.forbidden.unforbid(handle)
    }

    // ==================== Synthetic Events ====================

    /// Push a synthetic marker event immediately.
    pub fn inject_marker(&self, label: impl Into<String>) -> Result<Seq> {
        self.synthetic.push(crate::Payload::Marker {
            label: label.into(),
        })
    }

    /// Push a synthetic marker event after `delay`, from a background
    /// task.
    ///
    /// Expecting your own marker is the idiom for letting in-flight
    /// activity play out: everything the adapters produce before the
    /// marker is pulled, forbidden-checked and skipped on the way.
    ///
    /// ```ignore
    /// session.inject_marker_after("sync", Duration::from_millis(100));
    /// session.expect(Pattern::marker("sync")).await?;
    /// ```
    pub fn inject_marker_after(&self, label: impl Into<String>, delay: Duration) {
        let sink = self.synthetic.clone();
        let label = label.into();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = sink.push(crate::Payload::Marker { label }) {
                // Session torn down before the delay elapsed.
                warn!(error = %e, "delayed marker dropped");
            }
        });
    }

    // ==================== Teardown ====================

    /// Consume whatever the adapters have already queued, until the queue
    /// stays quiet for the configured drain window.
    ///
    /// Forbidden checks still apply, so a violating event cannot slip
    /// through at test end. Returns the drained events.
    pub async fn drain(&mut self) -> Result<Vec<Event>> {
        let deadline = Instant::now() + self.config.max_drain();
        let mut drained = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self
                .dispatcher
                .pull(self.config.drain_window().min(remaining))
                .await
            {
                Ok(event) => {
                    self.forbidden.check(&event)?;
                    drained.push(event);
                }
                Err(Error::Timeout { .. }) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(drained)
    }

    // ==================== Diagnostics ====================

    /// Events pulled so far that matched nothing, oldest first.
    pub fn observed(&self) -> impl Iterator<Item = &Event> {
        self.history.iter()
    }

    /// Print the observed-but-unmatched history to stdout for debugging.
    pub fn dump_history(&self) {
        if self.history.is_empty() {
            println!("(no unmatched events observed)");
            return;
        }
        println!("Observed but unmatched ({} events):", self.history.len());
        for event in &self.history {
            println!("  {event}");
        }
    }

    pub(crate) fn observe_miss(&mut self, event: Event) {
        debug!(%event, "skipped");
        if self.history.len() == self.config.history_limit() {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    pub(crate) fn expect_timeout(&self, waited: Duration, pending: &[&Pattern]) -> Error {
        Error::timeout(
            waited,
            pending.iter().map(|p| p.to_string()).collect(),
            self.history.iter().map(|e| e.to_string()).collect(),
        )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("forbidden", &self.forbidden.len())
            .field("observed", &self.history.len())
            .finish_non_exhaustive()
    }
}
