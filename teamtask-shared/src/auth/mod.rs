//! Authentication and authorization
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing and verification
//! - [`jwt`]: HS256 access tokens carrying `sub` and `role`
//! - [`invite_code`]: opaque team invitation codes
//! - [`middleware`]: strict and optional bearer-token middleware for Axum
//! - [`authorization`]: role and membership checks
//!
//! # Example
//!
//! ```no_run
//! use teamtask_shared::auth::password::{hash_password, verify_password};
//! use teamtask_shared::auth::jwt::{create_token, default_access_ttl, Claims};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("secret123")?;
//! assert!(verify_password("secret123", &hash)?);
//!
//! let claims = Claims::new(Uuid::new_v4(), "member", default_access_ttl());
//! let token = create_token(&claims, "0123456789abcdef0123456789abcdef")?;
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod invite_code;
pub mod jwt;
pub mod middleware;
pub mod password;
