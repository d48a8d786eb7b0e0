//! # TeamTask API Server Library
//!
//! Core of the TeamTask HTTP API, split from the binary so integration tests
//! can build the router directly.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors with JSON rejections
//! - `middleware`: Route-level role gates and request metrics
//! - `routes`: API route handlers
//! - `services`: Business operations behind the handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
