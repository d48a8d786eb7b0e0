//! # TeamTask Shared Library
//!
//! This crate contains the data layer and infrastructure adapters used by the
//! TeamTask API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and repository functions
//! - `db`: Connection pool and migrations
//! - `auth`: Tokens, password hashing, invite codes and authorization checks
//! - `breaker`: Circuit breaker guarding outbound calls
//! - `mailer`: Mail delivery contract and transports
//! - `redis`: Redis client wrapper
//! - `cache`: Read-through cache for task lists

pub mod auth;
pub mod breaker;
pub mod cache;
pub mod db;
pub mod mailer;
pub mod models;
pub mod redis;

/// Current version of the TeamTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
