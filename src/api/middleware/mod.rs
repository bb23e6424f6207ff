// Middleware module - tracing setup and CORS

pub mod cors;
pub mod observability;

pub use cors::create_cors_layer;
pub use observability::init_tracing;
