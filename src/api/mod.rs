pub mod dataforseo_api;
pub mod gemini_api;

pub use dataforseo_api::DataForSeoApi;
pub use gemini_api::GeminiApi;
