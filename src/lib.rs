pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod storage;
pub mod tools;
pub mod types;

pub use error::KeywordError;
pub use router::{McpState, mcp_router};
