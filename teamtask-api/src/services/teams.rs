/// Teams, invitations and invite acceptance
///
/// Creating a team and accepting an invite each touch two tables and run in
/// a single transaction. Inviting sends the code by mail after the invite row
/// is stored; a mail failure is reported to the caller but the invite stays.

use sqlx::PgPool;
use std::sync::Arc;
use teamtask_shared::auth::authorization::require_team_role;
use teamtask_shared::auth::invite_code::{generate_invite_code, is_well_formed};
use teamtask_shared::mailer::{Mailer, Message};
use teamtask_shared::models::is_unique_violation;
use teamtask_shared::models::team::{CreateTeam, Team};
use teamtask_shared::models::team_invite::{CreateTeamInvite, TeamInvite};
use teamtask_shared::models::team_member::{TeamMember, TeamRole};
use teamtask_shared::models::user::User;
use uuid::Uuid;

use super::{require_non_blank, ServiceError, ServiceResult};

const INVITER_ROLES: &[TeamRole] = &[TeamRole::Owner, TeamRole::Admin];

#[derive(Clone)]
pub struct TeamService {
    db: PgPool,
    mailer: Arc<dyn Mailer>,
}

impl TeamService {
    pub fn new(db: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, mailer }
    }

    /// Creates a team with the caller as its owner
    pub async fn create(&self, user_id: Uuid, name: &str) -> ServiceResult<Team> {
        let name = require_non_blank(name, "name")?;

        let mut tx = self.db.begin().await?;
        let team = Team::create(
            &mut *tx,
            CreateTeam {
                name,
                created_by: user_id,
            },
        )
        .await?;
        TeamMember::add(&mut *tx, team.id, user_id, TeamRole::Owner).await?;
        tx.commit().await?;

        tracing::info!(team_id = %team.id, owner_id = %user_id, "team created");

        Ok(team)
    }

    /// Teams the caller belongs to, oldest first
    pub async fn list(&self, user_id: Uuid) -> ServiceResult<Vec<Team>> {
        Ok(Team::list_for_user(&self.db, user_id).await?)
    }

    /// Invites an email address to a team and mails it the code
    ///
    /// The address does not need a registered account. When it does belong
    /// to a user who is already a member, `AlreadyMember` is returned.
    pub async fn invite(
        &self,
        inviter_id: Uuid,
        team_id: Uuid,
        email: &str,
    ) -> ServiceResult<TeamInvite> {
        let email = require_non_blank(email, "email")?;

        if !Team::exists(&self.db, team_id).await? {
            return Err(ServiceError::NotFound("team"));
        }

        require_team_role(&self.db, team_id, inviter_id, INVITER_ROLES).await?;

        if let Some(existing) = User::find_id_by_email(&self.db, &email).await? {
            if TeamMember::is_member(&self.db, team_id, existing).await? {
                return Err(ServiceError::AlreadyMember);
            }
        }

        let invite = TeamInvite::create(
            &self.db,
            CreateTeamInvite {
                team_id,
                email,
                inviter_id,
                code: generate_invite_code(),
            },
        )
        .await?;

        tracing::info!(team_id = %team_id, invite_id = %invite.id, "invite created");

        self.mailer
            .send(&Message::invitation(&invite.email, &invite.code))
            .await?;

        Ok(invite)
    }

    /// Redeems an invite code for the caller
    ///
    /// A blank or malformed code cannot name an invite and is reported as
    /// `InviteNotFound`. The caller's email must match the invite's email,
    /// ignoring case. The membership insert and the invite deletion commit
    /// together, so a code can be redeemed once.
    pub async fn accept(&self, user_id: Uuid, code: &str) -> ServiceResult<TeamMember> {
        let code = code.trim();
        if !is_well_formed(code) {
            return Err(ServiceError::InviteNotFound);
        }

        let invite = TeamInvite::find_by_code(&self.db, code)
            .await?
            .ok_or(ServiceError::InviteNotFound)?;

        let email = User::find_email_by_id(&self.db, user_id)
            .await?
            .ok_or(ServiceError::NotFound("user"))?;
        if !email.eq_ignore_ascii_case(&invite.email) {
            return Err(ServiceError::InviteEmailMismatch);
        }

        if TeamMember::is_member(&self.db, invite.team_id, user_id).await? {
            return Err(ServiceError::AlreadyMember);
        }

        let mut tx = self.db.begin().await?;
        let member = TeamMember::add(&mut *tx, invite.team_id, user_id, TeamRole::Member)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ServiceError::AlreadyMember
                } else {
                    e.into()
                }
            })?;
        if !TeamInvite::delete_by_code(&mut *tx, code).await? {
            // Redeemed concurrently; dropping the transaction rolls back the insert.
            return Err(ServiceError::InviteNotFound);
        }
        tx.commit().await?;

        tracing::info!(team_id = %invite.team_id, user_id = %user_id, "invite accepted");

        Ok(member)
    }
}
