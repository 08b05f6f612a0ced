//! # cortex-server
//!
//! Thin axum surface over [`cortex_engine::GameEngine`]: JSON in, JSON out,
//! caller identity from the `x-player-id` header.

#![deny(unsafe_code)]

pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
