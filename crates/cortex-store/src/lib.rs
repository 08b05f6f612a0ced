pub mod binary;
pub mod database;
pub mod error;
pub mod minigames;
pub mod pattern;
pub mod row_helpers;
pub mod schema;

pub use binary::BinaryRepo;
pub use database::Database;
pub use error::StoreError;
pub use minigames::MinigameRepo;
pub use pattern::PatternRepo;
