//! Middleware for the API server
//!
//! - `rbac`: route-level role gating on the token claim
//! - `metrics`: per-route request counters and the Prometheus endpoint

pub mod metrics;
pub mod rbac;
