//! Virtual-clock single-shot timers.
//!
//! Nothing here sleeps. A timer is a deadline in milliseconds plus a token; the owner polls
//! [`TimerSlot::take_due`] whenever the event loop advances its clock, and cancels by clearing
//! the slot. A token that no longer matches the armed slot is stale and must be ignored.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerToken(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline {
    pub token: TimerToken,
    pub at_ms: u64,
}

#[derive(Debug, Default)]
pub struct TokenSource {
    next: u32,
}

impl TokenSource {
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    fn issue(&mut self) -> TimerToken {
        self.next = self.next.wrapping_add(1);
        TimerToken(self.next)
    }
}

#[derive(Debug, Default)]
pub struct TimerSlot {
    armed: Option<Deadline>,
}

impl TimerSlot {
    pub const fn new() -> Self {
        Self { armed: None }
    }

    /// Arms the slot, replacing (and thereby cancelling) whatever was armed before.
    pub fn arm(&mut self, tokens: &mut TokenSource, at_ms: u64) -> TimerToken {
        let token = tokens.issue();
        self.armed = Some(Deadline { token, at_ms });
        token
    }

    pub fn cancel(&mut self) -> Option<TimerToken> {
        self.armed.take().map(|deadline| deadline.token)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<Deadline> {
        self.armed
    }

    pub fn is_current(&self, token: TimerToken) -> bool {
        self.armed.is_some_and(|deadline| deadline.token == token)
    }

    /// Disarms and returns the deadline if it has expired at `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> Option<Deadline> {
        match self.armed {
            Some(deadline) if deadline.at_ms <= now_ms => self.armed.take(),
            _ => None,
        }
    }
}

/// Earliest of two optional deadlines.
pub fn earliest(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearming_invalidates_previous_token() {
        let mut tokens = TokenSource::new();
        let mut slot = TimerSlot::new();

        let first = slot.arm(&mut tokens, 100);
        let second = slot.arm(&mut tokens, 250);

        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));
        assert_eq!(slot.take_due(200), None);
        assert_eq!(
            slot.take_due(250),
            Some(Deadline {
                token: second,
                at_ms: 250
            })
        );
        assert!(!slot.is_armed());
    }

    #[test]
    fn cancelled_slot_never_fires() {
        let mut tokens = TokenSource::new();
        let mut slot = TimerSlot::new();

        slot.arm(&mut tokens, 10);
        assert!(slot.cancel().is_some());
        assert_eq!(slot.take_due(1_000), None);
        assert_eq!(slot.cancel(), None);
    }

    #[test]
    fn earliest_picks_smaller_deadline() {
        assert_eq!(earliest(Some(30), Some(20)), Some(20));
        assert_eq!(earliest(None, Some(20)), Some(20));
        assert_eq!(earliest(Some(30), None), Some(30));
        assert_eq!(earliest(None, None), None);
    }
}
