//! API layer for the Recovery domain
//!
//! Contains HTTP handlers, routes, and domain state definition.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::RecoveryState;
pub use routes::routes;
