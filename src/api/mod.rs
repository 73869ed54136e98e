//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /cache`, `DELETE /cache` - Store a value, clear the cache
//! - `GET /cache/:key`, `DELETE /cache/:key` - Read or delete one key
//! - `GET /stats` - Cache and warmup statistics
//! - `POST /access/:key`, `GET /predict/:key` - Access model
//! - `POST /prefetch` - Queue a background load
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
