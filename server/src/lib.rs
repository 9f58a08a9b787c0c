//! # Crewbook Server
//!
//! HTTP API for the Crewbook booking marketplace. Wires the booking and
//! application engines from `crewbook-core` to `PostgreSQL` stores and
//! exposes them over axum.
//!
//! - [`config`]: environment-driven configuration
//! - [`metrics`]: Prometheus descriptions of the engine counters
//! - [`server`]: state, router and readiness probe
//! - [`api`]: booking and application handlers

pub mod api;
pub mod config;
pub mod metrics;
pub mod server;

pub use config::Config;
pub use server::{AppState, DatabaseProbe, build_router};
