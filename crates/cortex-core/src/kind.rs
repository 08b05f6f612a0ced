use serde::{Deserialize, Serialize};

/// The mini-games a session can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Pattern,
    Binary,
    Dual,
    Stroop,
    Chunk,
}

impl GameKind {
    pub const ALL: [GameKind; 5] = [
        Self::Pattern,
        Self::Binary,
        Self::Dual,
        Self::Stroop,
        Self::Chunk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Binary => "binary",
            Self::Dual => "dual",
            Self::Stroop => "stroop",
            Self::Chunk => "chunk",
        }
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GameKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown game kind: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_every_kind() {
        for kind in GameKind::ALL {
            assert_eq!(kind.as_str().parse::<GameKind>().unwrap(), kind);
        }
    }

    #[test]
    fn parse_unknown_fails() {
        assert!("memory".parse::<GameKind>().is_err());
    }
}
