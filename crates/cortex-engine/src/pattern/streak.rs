use cortex_core::pattern::Outcome;

/// Running and best consecutive-correct counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Streak {
    pub current: u32,
    pub max: u32,
}

impl Streak {
    pub fn new(current: u32, max: u32) -> Self {
        Self { current, max }
    }

    /// State after an advancing round. Never called for a revived retry.
    pub fn advance(self, outcome: Outcome) -> Self {
        if outcome.is_correct() {
            let current = self.current + 1;
            Self {
                current,
                max: self.max.max(current),
            }
        } else {
            Self {
                current: 0,
                max: self.max,
            }
        }
    }
}
