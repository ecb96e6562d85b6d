pub mod auth;
pub mod traits;

// Record API implementations
pub mod http_source;
