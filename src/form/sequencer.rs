//! Step sequencer for multi-section forms.
//!
//! Holds only the active index. Progress and boundary flags are derived on
//! every read so they can never drift from the index.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSequencer {
    current: usize,
    initial: usize,
    total: usize,
}

impl StepSequencer {
    /// Create a sequencer over `total` steps starting at step 0.
    /// A sequencer always has at least one step.
    pub fn new(total: usize) -> Self {
        Self::with_initial(total, 0)
    }

    /// Create a sequencer that starts (and resets) at `initial`, clamped to
    /// the last step
    pub fn with_initial(total: usize, initial: usize) -> Self {
        let total = total.max(1);
        let initial = initial.min(total - 1);
        Self {
            current: initial,
            initial,
            total,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Advance one step; a no-op on the last step
    pub fn next(&mut self) {
        self.current = (self.current + 1).min(self.total - 1);
    }

    /// Go back one step; a no-op on the first step
    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// Jump to `step` if it exists. Out-of-range targets are ignored and
    /// reported through the return value.
    pub fn go_to(&mut self, step: usize) -> bool {
        if step < self.total {
            self.current = step;
            true
        } else {
            tracing::debug!(step, total = self.total, "ignoring out-of-range step jump");
            false
        }
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total - 1
    }

    /// Completion percentage of the active step, in `(0, 100]`
    pub fn progress(&self) -> f64 {
        (self.current + 1) as f64 / self.total as f64 * 100.0
    }
}
