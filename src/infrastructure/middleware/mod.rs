// Request-scoped viewer context: middleware that builds it, extractor that reads it

pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use viewer_context_extractor::Vc;
pub use viewer_context_middleware::{viewer_context_middleware, HasIdentityHeader};
