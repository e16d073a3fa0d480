use std::{
    fmt,
    future::IntoFuture,
    time::{Duration, Instant},
};

use tracing::debug;

use crate::{Error, Event, Pattern, Result, Session};

/// A blocking wait for one pattern to match.
///
/// Created by [`Session::expect`]. Pulls events from the dispatcher in
/// arrival order; each pulled event is checked against the forbidden set
/// first, then against the pattern. Non-matching events are recorded in
/// the observed history and skipped — asserting absence is the forbidden
/// monitor's job, never the skip path's.
///
/// # Example
///
/// ```ignore
/// let e = session.expect(Pattern::signal("StatusChanged")).await?;
///
/// // With a custom deadline
/// let e = session.expect(Pattern::signal("StatusChanged"))
///     .within(Duration::from_secs(3))
///     .await?;
/// ```
pub struct Expect<'a> {
    session: &'a mut Session,
    pattern: Pattern,
    timeout: Duration,
}

impl<'a> Expect<'a> {
    pub(crate) fn new(session: &'a mut Session, pattern: Pattern) -> Self {
        let timeout = session.config().default_timeout();
        Self {
            session,
            pattern,
            timeout,
        }
    }

    /// Override the session's default deadline.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(self) -> Result<Event> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.session.expect_timeout(self.timeout, &[&self.pattern]));
            }

            match self.session.dispatcher.pull(remaining).await {
                Ok(event) => {
                    self.session.forbidden.check(&event)?;
                    if self.pattern.matches(&event) {
                        debug!(%event, pattern = %self.pattern, "matched");
                        return Ok(event);
                    }
                    self.session.observe_miss(event);
                }
                Err(Error::Timeout { .. }) => {
                    return Err(self.session.expect_timeout(self.timeout, &[&self.pattern]));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<'a> IntoFuture for Expect<'a> {
    type Output = Result<Event>;
    type IntoFuture = std::pin::Pin<Box<dyn std::future::Future<Output = Self::Output> + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl fmt::Debug for Expect<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expect")
            .field("pattern", &self.pattern)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// A blocking wait for an unordered set of patterns to each match once.
///
/// Created by [`Session::expect_many`]. Completes when every pattern has
/// claimed exactly one event, regardless of arrival order among them.
/// Tie-break: an event that could satisfy several still-unmatched patterns
/// is claimed by the earliest-declared one (first fit). Multiplicity among
/// identical patterns is therefore implementation-defined; callers must
/// not rely on it.
///
/// The result vector is aligned with the pattern declaration order, not
/// arrival order.
pub struct ExpectMany<'a> {
    session: &'a mut Session,
    patterns: Vec<Pattern>,
    timeout: Duration,
}

impl<'a> ExpectMany<'a> {
    pub(crate) fn new(session: &'a mut Session, patterns: Vec<Pattern>) -> Self {
        let timeout = session.config().default_timeout();
        Self {
            session,
            patterns,
            timeout,
        }
    }

    /// Override the session's default deadline. The deadline covers the
    /// whole set, not each pattern individually.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(self) -> Result<Vec<Event>> {
        let deadline = Instant::now() + self.timeout;
        let mut matched: Vec<Option<Event>> = self.patterns.iter().map(|_| None).collect();
        let mut live = self.patterns.len();

        while live > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.unsatisfied_timeout(&matched));
            }

            let event = match self.session.dispatcher.pull(remaining).await {
                Ok(event) => event,
                Err(Error::Timeout { .. }) => return Err(self.unsatisfied_timeout(&matched)),
                Err(e) => return Err(e),
            };
            self.session.forbidden.check(&event)?;

            // First fit in declaration order among still-unmatched patterns.
            let claimed = self
                .patterns
                .iter()
                .zip(matched.iter_mut())
                .find(|(pattern, slot)| slot.is_none() && pattern.matches(&event));
            match claimed {
                Some((pattern, slot)) => {
                    debug!(%event, %pattern, live = live - 1, "claimed");
                    *slot = Some(event);
                    live -= 1;
                }
                None => self.session.observe_miss(event),
            }
        }

        Ok(matched.into_iter().flatten().collect())
    }

    fn unsatisfied_timeout(&self, matched: &[Option<Event>]) -> Error {
        let pending: Vec<&Pattern> = self
            .patterns
            .iter()
            .zip(matched)
            .filter_map(|(pattern, slot)| slot.is_none().then_some(pattern))
            .collect();
        self.session.expect_timeout(self.timeout, &pending)
    }
}

impl<'a> IntoFuture for ExpectMany<'a> {
    type Output = Result<Vec<Event>>;
    type IntoFuture = std::pin::Pin<Box<dyn std::future::Future<Output = Self::Output> + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl fmt::Debug for ExpectMany<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectMany")
            .field("patterns", &self.patterns)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
