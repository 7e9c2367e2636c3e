//! Shared action cooldown
//!
//! One timer covers every gated event type. It starts "infinitely long ago"
//! so the first action is never blocked.

/// Single cooldown timer shared by all gated flight actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    period_us: u64,
    last_action_us: Option<u64>,
}

impl Cooldown {
    pub fn new(period_us: u64) -> Self {
        Self {
            period_us,
            last_action_us: None,
        }
    }

    /// True once strictly more than the period has passed since the last
    /// action.
    pub fn is_elapsed(&self, now_us: u64) -> bool {
        match self.last_action_us {
            None => true,
            Some(last) => now_us.saturating_sub(last) > self.period_us,
        }
    }

    /// Time left before the next gated action is allowed.
    pub fn remaining_us(&self, now_us: u64) -> u64 {
        match self.last_action_us {
            None => 0,
            Some(last) => (last + self.period_us).saturating_sub(now_us),
        }
    }

    pub fn reset(&mut self, now_us: u64) {
        self.last_action_us = Some(now_us);
    }

    pub fn last_action_us(&self) -> Option<u64> {
        self.last_action_us
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }
}
