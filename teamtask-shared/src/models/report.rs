/// Read-only reporting queries
///
/// # Reports
///
/// - [`team_summary`]: member count and tasks completed in the last 7 days, per team
/// - [`top_creators`]: top 3 task creators per team within a calendar month (UTC)
/// - [`invalid_assignees`]: tasks assigned to users who are no longer team members

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Per-team member and completion counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamSummary {
    pub team_id: Uuid,
    pub team_name: String,
    pub members_count: i64,
    pub done_last_7d: i64,
}

/// Flat row returned by the top-creators query
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TopCreatorRow {
    pub team_id: Uuid,
    pub team_name: String,
    pub user_id: Uuid,
    pub tasks_created: i64,
}

/// One creator and the number of tasks they created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub user_id: Uuid,
    pub tasks_created: i64,
}

/// Top creators of a single team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamTopCreators {
    pub team_id: Uuid,
    pub team_name: String,
    pub creators: Vec<Creator>,
}

/// Task whose assignee is not a member of the task's team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InvalidAssignee {
    pub task_id: Uuid,
    pub team_id: Uuid,
    pub assignee_id: Uuid,
}

/// Half-open UTC interval `[start, end)` covering one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthRange {
    /// Parses a `YYYY-MM` month
    ///
    /// Returns `None` for anything else, including out-of-range months.
    pub fn parse(month: &str) -> Option<Self> {
        let (year, month) = month.trim().split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;

        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if first.month() == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        Some(Self {
            start: Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0)?),
            end: Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?),
        })
    }
}

/// Member count and tasks completed in the last 7 days, for every team
pub async fn team_summary<'e, E>(executor: E) -> Result<Vec<TeamSummary>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let since = Utc::now() - chrono::Duration::days(7);

    sqlx::query_as::<_, TeamSummary>(
        r#"
        SELECT t.id AS team_id,
               t.name AS team_name,
               COUNT(DISTINCT m.user_id) AS members_count,
               COUNT(DISTINCT d.id) AS done_last_7d
        FROM teams t
        LEFT JOIN team_members m ON m.team_id = t.id
        LEFT JOIN tasks d ON d.team_id = t.id
                         AND d.status = 'done'
                         AND d.completed_at >= $1
        GROUP BY t.id, t.name
        ORDER BY t.name ASC, t.id ASC
        "#,
    )
    .bind(since)
    .fetch_all(executor)
    .await
}

/// Top 3 creators per team in the given month
///
/// Ties on the task count are broken by ascending user id.
pub async fn top_creators<'e, E>(
    executor: E,
    month: MonthRange,
) -> Result<Vec<TeamTopCreators>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, TopCreatorRow>(
        r#"
        SELECT team_id, team_name, user_id, tasks_created
        FROM (
            SELECT t.team_id,
                   tm.name AS team_name,
                   t.created_by AS user_id,
                   COUNT(*) AS tasks_created,
                   ROW_NUMBER() OVER (
                       PARTITION BY t.team_id
                       ORDER BY COUNT(*) DESC, t.created_by ASC
                   ) AS rn
            FROM tasks t
            JOIN teams tm ON tm.id = t.team_id
            WHERE t.created_at >= $1 AND t.created_at < $2
            GROUP BY t.team_id, tm.name, t.created_by
        ) ranked
        WHERE rn <= 3
        ORDER BY team_name ASC, team_id ASC, rn ASC
        "#,
    )
    .bind(month.start)
    .bind(month.end)
    .fetch_all(executor)
    .await?;

    Ok(group_top_creators(rows))
}

/// Groups ranked rows (already ordered by team, then rank) per team
pub fn group_top_creators(rows: Vec<TopCreatorRow>) -> Vec<TeamTopCreators> {
    let mut grouped: Vec<TeamTopCreators> = Vec::new();

    for row in rows {
        let creator = Creator {
            user_id: row.user_id,
            tasks_created: row.tasks_created,
        };
        match grouped.last_mut() {
            Some(last) if last.team_id == row.team_id => last.creators.push(creator),
            _ => grouped.push(TeamTopCreators {
                team_id: row.team_id,
                team_name: row.team_name,
                creators: vec![creator],
            }),
        }
    }

    grouped
}

/// Tasks whose assignee is set but not a member of the task's team
pub async fn invalid_assignees<'e, E>(executor: E) -> Result<Vec<InvalidAssignee>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, InvalidAssignee>(
        r#"
        SELECT t.id AS task_id, t.team_id, t.assignee_id
        FROM tasks t
        LEFT JOIN team_members m
               ON m.team_id = t.team_id AND m.user_id = t.assignee_id
        WHERE t.assignee_id IS NOT NULL
          AND m.user_id IS NULL
        ORDER BY t.created_at ASC, t.id ASC
        "#,
    )
    .fetch_all(executor)
    .await
}
