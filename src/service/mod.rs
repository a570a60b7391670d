//! Collation REST Service
//!
//! Exposes collation runs and the config registry over HTTP.
//!
//! ## Endpoints
//!
//! - `POST /api/collate` - Tokenize and collate witnesses, return table and/or apparatus
//! - `GET /api/configs` - List registered configs
//! - `POST /api/configs` - Register a config
//! - `GET /api/configs/:params_hash` - Fetch a registered config
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_collation_metrics};
pub use routes::create_router;
pub use state::{ConfigRef, ConfigRegistry, ServiceState};
