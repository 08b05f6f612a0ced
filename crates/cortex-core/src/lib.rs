pub mod binary;
pub mod chunk;
pub mod dual;
pub mod ids;
pub mod kind;
pub mod minigame;
pub mod pattern;
pub mod stroop;
pub mod tunables;

pub use ids::{PlayerId, SessionId};
pub use kind::GameKind;
pub use tunables::{GameConfig, GameDefaults, PatternTunables};
