//! API route handlers
//!
//! This module contains all route handlers organized by resource:
//!
//! - `health`: Health check endpoint
//! - `docs`: OpenAPI document
//! - `auth`: Registration and login
//! - `teams`: Teams and invites
//! - `tasks`: Tasks and their history
//! - `comments`: Task comments
//! - `reports`: Cross-team reports

pub mod auth;
pub mod comments;
pub mod docs;
pub mod health;
pub mod reports;
pub mod tasks;
pub mod teams;
