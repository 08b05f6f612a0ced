use serde::{Deserialize, Serialize};

/// Letters the audio channel of the n-back draws from.
pub const LETTERS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Cells on the 3×3 board the visual channel draws from.
pub const GRID_CELLS: u32 = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
    pub grid_pos: u32,
    pub letter: char,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DualRound {
    pub round_number: u32,
    pub stimulus: Stimulus,
    pub latency_secs: f64,
    pub letter_match: bool,
    pub position_match: bool,
    pub letter_truth: bool,
    pub position_truth: bool,
    pub score: u32,
}

impl DualRound {
    pub fn letter_correct(&self) -> bool {
        self.letter_match == self.letter_truth
    }

    pub fn position_correct(&self) -> bool {
        self.position_match == self.position_truth
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DualState {
    pub n: u32,
    pub stimuli: Vec<Stimulus>,
    /// 0-based index of the stimulus awaiting an answer.
    pub current: usize,
    pub log: Vec<DualRound>,
}

impl DualState {
    pub fn current_stimulus(&self) -> Option<Stimulus> {
        self.stimuli.get(self.current).copied()
    }
}
