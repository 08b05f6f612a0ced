use serde::{Deserialize, Serialize};

/// Sequences are drawn without replacement from the digits 0-9.
pub const DIGITS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStyle {
    Balanced,
    Greedy,
    Scattered,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkRound {
    pub round_number: u32,
    pub chunks: Vec<Vec<u32>>,
    pub correct: bool,
    pub style: ChunkStyle,
    pub latency_secs: f64,
    pub score: u32,
}

impl ChunkRound {
    pub fn chunk_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.chunks.iter().map(Vec::len)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkState {
    pub round_number: u32,
    pub total_rounds: u32,
    pub max_chunk_size: u32,
    pub sequence: Vec<u32>,
    pub log: Vec<ChunkRound>,
}
