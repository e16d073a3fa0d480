use tracing::debug;

use crate::{Error, Event, Pattern, Result};

/// Opaque handle returned by [`ForbiddenSet::forbid`], used to lift the
/// ban again with [`ForbiddenSet::unforbid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForbidHandle(u64);

/// The standing set of patterns no event may match while registered.
///
/// Owned exclusively by the session's consumer side; every event the
/// expectation engine pulls is checked here before it is offered to any
/// expectation pattern, so a forbidden match always wins over an expected
/// one arriving in the same event. Violation is a hard failure
/// ([`Error::ForbiddenMatch`]) raised at the moment of the match.
///
/// Entries are checked in registration order. `unforbid` restores matching
/// behavior exactly; events observed while the ban was active are
/// unaffected retroactively.
#[derive(Debug, Default)]
pub struct ForbiddenSet {
    entries: Vec<(ForbidHandle, Pattern)>,
    next: u64,
}

impl ForbiddenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern that must not match any observed event.
    pub fn forbid(&mut self, pattern: Pattern) -> ForbidHandle {
        let handle = ForbidHandle(self.next);
        self.next += 1;
        debug!(pattern = %pattern, "forbidding");
        self.entries.push((handle, pattern));
        handle
    }

    /// Remove a previously registered pattern.
    ///
    /// Returns false if the handle was already removed (idempotent).
    pub fn unforbid(&mut self, handle: ForbidHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(h, _)| *h != handle);
        before != self.entries.len()
    }

    /// Fail with [`Error::ForbiddenMatch`] if the event matches any entry.
    pub fn check(&self, event: &Event) -> Result {
        for (_, pattern) in &self.entries {
            if pattern.matches(event) {
                return Err(Error::ForbiddenMatch {
                    event: Box::new(event.clone()),
                    pattern: pattern.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Payload, Seq, SourceId};

    fn signal(member: &str) -> Event {
        Event::new(
            Seq::from(0),
            SourceId::new("test"),
            Payload::Signal {
                member: member.into(),
                args: vec![],
            },
        )
    }

    #[test]
    fn empty_set_allows_everything() {
        let set = ForbiddenSet::new();
        assert!(set.check(&signal("ContactInfoChanged")).is_ok());
    }

    #[test]
    fn registered_pattern_raises_on_match() {
        let mut set = ForbiddenSet::new();
        set.forbid(Pattern::signal("ContactInfoChanged"));

        assert!(set.check(&signal("AliasesChanged")).is_ok());
        let err = set.check(&signal("ContactInfoChanged")).unwrap_err();
        assert!(matches!(err, Error::ForbiddenMatch { .. }));
        assert!(err.to_string().contains("ContactInfoChanged"));
    }

    #[test]
    fn unforbid_restores_prior_behavior() {
        let mut set = ForbiddenSet::new();
        let handle = set.forbid(Pattern::signal("ContactInfoChanged"));
        assert!(set.check(&signal("ContactInfoChanged")).is_err());

        assert!(set.unforbid(handle));
        assert!(set.check(&signal("ContactInfoChanged")).is_ok());

        // A second removal is a no-op.
        assert!(!set.unforbid(handle));
        assert!(set.is_empty());
    }

    #[test]
    fn handles_are_independent() {
        let mut set = ForbiddenSet::new();
        let a = set.forbid(Pattern::signal("A"));
        let _b = set.forbid(Pattern::signal("B"));

        set.unforbid(a);
        assert!(set.check(&signal("A")).is_ok());
        assert!(set.check(&signal("B")).is_err());
        assert_eq!(set.len(), 1);
    }
}
