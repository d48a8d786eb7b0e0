//! Database models for TeamTask
//!
//! Each model module holds the row type and its repository functions. Functions
//! that take part in multi-statement transactions are generic over
//! [`sqlx::PgExecutor`], so the same call accepts a pool or an open transaction:
//!
//! ```no_run
//! use teamtask_shared::models::team::{CreateTeam, Team};
//! use teamtask_shared::models::team_member::{TeamMember, TeamRole};
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
//! let mut tx = pool.begin().await?;
//! let team = Team::create(&mut *tx, CreateTeam { name: "Core".into(), created_by: owner }).await?;
//! TeamMember::add(&mut *tx, team.id, owner, TeamRole::Owner).await?;
//! tx.commit().await?;
//!
//! // Same function, plain pool
//! let found = Team::find_by_id(&pool, team.id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Models
//!
//! - `user`: User accounts
//! - `team`: Teams
//! - `team_member`: Membership rows and the membership oracle
//! - `team_invite`: Pending invitations
//! - `task`: Tasks with filtered listing and row locking
//! - `task_history`: Append-only task change log
//! - `comment`: Task comments
//! - `report`: Read-only aggregations

pub mod comment;
pub mod report;
pub mod task;
pub mod task_history;
pub mod team;
pub mod team_invite;
pub mod team_member;
pub mod user;

use serde::Serialize;

/// Default page size when none (or a non-positive one) is requested
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Largest accepted page size
pub const MAX_PER_PAGE: i64 = 100;

/// Normalized page request
///
/// `page` is 1-based. Out-of-range input is clamped instead of rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    /// Clamps raw query values: `page <= 0` becomes 1, `per_page <= 0` becomes
    /// 20 and `per_page > 100` becomes 100.
    pub fn normalize(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p > 0 => p,
            _ => 1,
        };
        let per_page = match per_page {
            Some(n) if n > MAX_PER_PAGE => MAX_PER_PAGE,
            Some(n) if n > 0 => n,
            _ => DEFAULT_PER_PAGE,
        };

        Self { page, per_page }
    }

    /// Rows to skip for this page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Rows to fetch for this page
    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::normalize(None, None)
    }
}

/// One page of results plus the total row count
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
        }
    }
}

/// Returns true if the error is a unique constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
