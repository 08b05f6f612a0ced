//! HTTP handlers, one module per game. Handlers only translate between JSON
//! and the engine services.

pub mod binary;
pub mod chunk;
pub mod dual;
pub mod pattern;
pub mod progress;
pub mod stroop;
pub mod system;
