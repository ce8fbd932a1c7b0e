pub mod mcp;
pub mod opportunities;
