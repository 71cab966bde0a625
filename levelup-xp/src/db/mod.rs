//! SQLite-backed catalogs

pub mod levels;
pub mod sessions;

pub use levels::{seed_default_levels, upsert_level, SqliteLevelCatalog};
pub use sessions::SqliteSessionCatalog;
