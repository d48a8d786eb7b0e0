/// Registration and login
///
/// Passwords are hashed with Argon2id on the blocking thread pool so a burst
/// of logins does not stall the async workers.

use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use teamtask_shared::auth::{jwt, password};
use teamtask_shared::mailer::{Mailer, Message};
use teamtask_shared::models::is_unique_violation;
use teamtask_shared::models::team_member::{TeamMember, TeamRole};
use teamtask_shared::models::user::{CreateUser, User};

use super::{ServiceError, ServiceResult};

/// Successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    mailer: Arc<dyn Mailer>,
    jwt_secret: Arc<str>,
    access_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        mailer: Arc<dyn Mailer>,
        jwt_secret: impl Into<Arc<str>>,
        access_ttl: chrono::Duration,
    ) -> Self {
        Self {
            db,
            mailer,
            jwt_secret: jwt_secret.into(),
            access_ttl,
        }
    }

    /// Creates an account and sends the welcome mail
    ///
    /// # Errors
    ///
    /// - `BadInput` for an empty email or password
    /// - `UserExists` when the email is taken
    /// - `MailFailed` / `BreakerOpen` when the welcome mail cannot be sent; the
    ///   account has already been created at that point
    pub async fn register(&self, email: &str, password: &str) -> ServiceResult<User> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::BadInput(
                "email and password are required".to_string(),
            ));
        }

        let plain = password.to_string();
        let password_hash =
            tokio::task::spawn_blocking(move || password::hash_password(&plain)).await??;

        let user = User::create(
            &self.db,
            CreateUser {
                email: email.to_string(),
                password_hash,
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::UserExists
            } else {
                e.into()
            }
        })?;

        tracing::info!(user_id = %user.id, "user registered");

        self.mailer.send(&Message::welcome(&user.email)).await?;

        Ok(user)
    }

    /// Verifies credentials and issues an access token
    ///
    /// The token's `role` claim is the caller's highest role across all teams
    /// at login time, `member` when they belong to none.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::BadInput(
                "email and password are required".to_string(),
            ));
        }

        let user = User::find_by_email(&self.db, email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let plain = password.to_string();
        let stored = user.password_hash.clone();
        let valid =
            tokio::task::spawn_blocking(move || password::verify_password(&plain, &stored)).await??;
        if !valid {
            tracing::debug!(user_id = %user.id, "login rejected: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let role = TeamMember::highest_role(&self.db, user.id)
            .await?
            .unwrap_or(TeamRole::Member);

        let claims = jwt::Claims::new(user.id, role.as_str(), self.access_ttl);
        let token = jwt::create_token(&claims, &self.jwt_secret)?;

        Ok(LoginOutcome { token, user })
    }
}
