use serde::{Deserialize, Serialize};

pub const COLORS: [&str; 6] = ["RED", "GREEN", "BLUE", "YELLOW", "ORANGE", "PURPLE"];

/// A colour word printed in an ink colour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StroopCard {
    pub word: String,
    pub ink: String,
}

impl StroopCard {
    pub fn is_congruent(&self) -> bool {
        self.word == self.ink
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StroopRound {
    pub round_number: u32,
    pub card: StroopCard,
    pub response: String,
    pub latency_secs: f64,
    pub correct: bool,
    pub congruent: bool,
    pub score: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StroopState {
    pub round_number: u32,
    pub total_rounds: u32,
    pub card: StroopCard,
    pub log: Vec<StroopRound>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn congruence() {
        let same = StroopCard { word: "RED".into(), ink: "RED".into() };
        let diff = StroopCard { word: "RED".into(), ink: "BLUE".into() };
        assert!(same.is_congruent());
        assert!(!diff.is_congruent());
    }
}
