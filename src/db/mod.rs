//! Database module: models and queries for the client content database.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for the tables this service owns
//! - `postgres.rs`: `ContentStore`, the query layer over a `PgPool`

pub mod models;
pub mod postgres;
pub mod schema;

pub use models::{DbStrategy, HtmlArtifact, StrategyVersion, UpsertAction};
pub use postgres::ContentStore;
pub use schema::POSTGRES_INIT;
