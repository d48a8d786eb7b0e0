//! Redis integration
//!
//! Redis only backs the advisory tasks-list cache (see [`crate::cache`]).
//! Nothing in Redis is authoritative; losing it costs latency, not data.

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
