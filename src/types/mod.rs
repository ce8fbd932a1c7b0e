pub mod dataforseo;
pub mod discovery;
pub mod gemini;
pub mod mcp;
pub mod strategy;
