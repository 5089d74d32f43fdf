use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot latch guarding the terminal report of an install attempt.
#[derive(Debug, Default)]
pub struct CompletionGate {
    fired: AtomicBool,
}

impl CompletionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` for the first caller only.
    pub fn try_fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }
}

/// Outstanding finalization steps. Starts at the exact number scheduled;
/// zero means every step has settled successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinCounter {
    remaining: usize,
}

impl JoinCounter {
    pub fn new(scheduled: usize) -> Self {
        Self {
            remaining: scheduled,
        }
    }

    /// Records one settled step and returns how many are still running.
    pub fn settle(&mut self) -> usize {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }
}
