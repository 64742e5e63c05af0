use std::time::Duration;

const BASE_ROUNDS: f32 = 72.0;
const MAX_ROUNDS: f32 = 144.0;
const ROUNDS_PER_SLACK_MS: f32 = 4.32;
const SMOOTHING: f32 = 1.0 / 15.0;

/// Adaptive allowance of hash rounds a caller may run per frame before it
/// should yield back to the host loop.
#[derive(Debug, Clone)]
pub struct StepBudget {
    rounds_per_frame: f32,
    spent: usize,
}

impl Default for StepBudget {
    fn default() -> Self {
        Self {
            rounds_per_frame: BASE_ROUNDS,
            spent: 0,
        }
    }
}

impl StepBudget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rounds_per_frame(&self) -> usize {
        self.rounds_per_frame as usize
    }

    /// Moves the allowance toward what the observed frame slack can absorb.
    pub fn observe_slack(&mut self, slack: Duration) {
        let slack_ms = slack.as_secs_f32() * 1000.0;
        let target = (BASE_ROUNDS + slack_ms * ROUNDS_PER_SLACK_MS).min(MAX_ROUNDS);
        self.rounds_per_frame += (target - self.rounds_per_frame) * SMOOTHING;
    }

    /// Records spent rounds. Returns true when the frame allowance is used up;
    /// the counter then starts over for the next frame.
    pub fn charge(&mut self, rounds: usize) -> bool {
        self.spent += rounds;
        if self.spent >= self.rounds_per_frame() {
            self.spent = 0;
            true
        } else {
            false
        }
    }

    /// Rounds left in the current frame.
    pub fn remaining(&self) -> usize {
        self.rounds_per_frame().saturating_sub(self.spent)
    }
}
