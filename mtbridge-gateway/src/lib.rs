//! mtbridge-gateway: HTTP surface over the lifecycle bridge.
//!
//! Each route parses its request into one bridge command, runs it on the
//! blocking pool, and renders either the success body or the
//! `{"kind", "detail"}` failure envelope.

pub mod config;
pub mod envelope;
pub mod routes;
pub mod server;

pub use config::{ConfigError, ErrorStatusPolicy, GatewayConfig, LoggingConfig, ServerConfig};
pub use envelope::{ApiError, EnvelopeKind};
pub use routes::{router, GatewayState};
pub use server::{app, serve, serve_on};
