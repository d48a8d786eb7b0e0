use sqlx::PgPool;
use teamtask_shared::models::report::{
    self, InvalidAssignee, MonthRange, TeamSummary, TeamTopCreators,
};

use super::{ServiceError, ServiceResult};

/// Read-only aggregations across all teams
///
/// Any authenticated caller may read the reports.
#[derive(Clone)]
pub struct ReportService {
    db: PgPool,
}

impl ReportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn team_summary(&self) -> ServiceResult<Vec<TeamSummary>> {
        Ok(report::team_summary(&self.db).await?)
    }

    /// Top 3 creators per team for a `YYYY-MM` month (UTC)
    pub async fn top_creators(&self, month: &str) -> ServiceResult<Vec<TeamTopCreators>> {
        if month.trim().is_empty() {
            return Err(ServiceError::BadInput("month is required".to_string()));
        }

        let range = MonthRange::parse(month).ok_or_else(|| {
            ServiceError::BadInput("month must have the form YYYY-MM".to_string())
        })?;

        Ok(report::top_creators(&self.db, range).await?)
    }

    pub async fn invalid_assignees(&self) -> ServiceResult<Vec<InvalidAssignee>> {
        Ok(report::invalid_assignees(&self.db).await?)
    }
}
