use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    NewOrganization, NewRosterEntry, NewTeam, Organization, OrganizationPatch, RosterEntry, Team,
    TeamPatch,
};

/// Everything the registration team owns for one caller, as the wizard
/// needs it to prefill an update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    pub organization: Organization,
    pub team: Team,
    pub roster: Vec<RosterEntry>,
}

/// Gateway to the relational store. Per-row atomicity only; the pipeline
/// sequences calls and compensates, there is no cross-call transaction.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn find_organization(&self, owner: Uuid, name: &str) -> AppResult<Option<Organization>>;
    async fn insert_organization(&self, org: &NewOrganization) -> AppResult<Uuid>;
    async fn update_organization(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &OrganizationPatch,
    ) -> AppResult<()>;
    async fn delete_organization(&self, id: Uuid) -> AppResult<()>;

    async fn find_team(
        &self,
        organization_id: Uuid,
        owner: Uuid,
        name: &str,
    ) -> AppResult<Option<Team>>;
    async fn insert_team(&self, team: &NewTeam) -> AppResult<Uuid>;
    async fn update_team(&self, id: Uuid, owner: Uuid, patch: &TeamPatch) -> AppResult<()>;
    async fn delete_team(&self, id: Uuid) -> AppResult<()>;

    /// `(id, game_id)` pairs of the stored roster, for reconciliation.
    async fn roster_keys(&self, team_id: Uuid) -> AppResult<Vec<(Uuid, String)>>;
    async fn insert_roster_entries(&self, rows: &[NewRosterEntry]) -> AppResult<()>;
    async fn update_roster_entry(&self, id: Uuid, row: &NewRosterEntry) -> AppResult<()>;

    async fn fetch_registration(&self, owner: Uuid) -> AppResult<Option<RegistrationView>>;
}

pub struct PgRegistrationStore {
    db: sqlx::PgPool,
}

impl PgRegistrationStore {
    pub fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RegistrationStore for PgRegistrationStore {
    async fn find_organization(&self, owner: Uuid, name: &str) -> AppResult<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(
            "SELECT id, owner_user_id, name, region, city, logo_url, created_at
             FROM organizations WHERE owner_user_id = $1 AND name = $2",
        )
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(org)
    }

    async fn insert_organization(&self, org: &NewOrganization) -> AppResult<Uuid> {
        // Upsert on (owner_user_id, name): two simultaneous first-time
        // submissions for the same identity converge on one row.
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO organizations (id, owner_user_id, name, region, city, logo_url, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, NOW())
             ON CONFLICT (owner_user_id, name) DO UPDATE SET
                region = EXCLUDED.region,
                city = EXCLUDED.city,
                logo_url = COALESCE(EXCLUDED.logo_url, organizations.logo_url)
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(org.owner_user_id)
        .bind(&org.name)
        .bind(&org.region)
        .bind(&org.city)
        .bind(&org.logo_url)
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &OrganizationPatch,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE organizations SET region = $1, city = $2,
                logo_url = COALESCE($3, logo_url)
             WHERE id = $4 AND owner_user_id = $5",
        )
        .bind(&patch.region)
        .bind(&patch.city)
        .bind(&patch.logo_url)
        .bind(id)
        .bind(owner)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Forbidden(
                "Registration belongs to another account".into(),
            ));
        }
        Ok(())
    }

    async fn delete_organization(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn find_team(
        &self,
        organization_id: Uuid,
        owner: Uuid,
        name: &str,
    ) -> AppResult<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(
            "SELECT id, organization_id, owner_user_id, name, logo_url, referral_code, created_at
             FROM teams WHERE organization_id = $1 AND owner_user_id = $2 AND name = $3",
        )
        .bind(organization_id)
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(team)
    }

    async fn insert_team(&self, team: &NewTeam) -> AppResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO teams (id, organization_id, owner_user_id, name, logo_url, referral_code, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, NOW())
             ON CONFLICT (organization_id, owner_user_id, name) DO UPDATE SET
                logo_url = COALESCE(EXCLUDED.logo_url, teams.logo_url),
                referral_code = COALESCE(EXCLUDED.referral_code, teams.referral_code)
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(team.organization_id)
        .bind(team.owner_user_id)
        .bind(&team.name)
        .bind(&team.logo_url)
        .bind(&team.referral_code)
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }

    async fn update_team(&self, id: Uuid, owner: Uuid, patch: &TeamPatch) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE teams SET logo_url = COALESCE($1, logo_url),
                referral_code = COALESCE($2, referral_code)
             WHERE id = $3 AND owner_user_id = $4",
        )
        .bind(&patch.logo_url)
        .bind(&patch.referral_code)
        .bind(id)
        .bind(owner)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Forbidden(
                "Registration belongs to another account".into(),
            ));
        }
        Ok(())
    }

    async fn delete_team(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn roster_keys(&self, team_id: Uuid) -> AppResult<Vec<(Uuid, String)>> {
        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, game_id FROM roster_entries WHERE team_id = $1")
                .bind(team_id)
                .fetch_all(&self.db)
                .await?;
        Ok(rows)
    }

    async fn insert_roster_entries(&self, rows: &[NewRosterEntry]) -> AppResult<()> {
        for row in rows {
            sqlx::query(
                "INSERT INTO roster_entries
                    (id, team_id, organization_id, game_id, display_name, in_game_name,
                     server_id, role, email, phone, city, region, device,
                     picture_url, student_id_url, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW())
                 ON CONFLICT (team_id, game_id) DO UPDATE SET
                    display_name = EXCLUDED.display_name,
                    in_game_name = EXCLUDED.in_game_name,
                    server_id = EXCLUDED.server_id,
                    role = EXCLUDED.role,
                    email = EXCLUDED.email,
                    phone = EXCLUDED.phone,
                    city = EXCLUDED.city,
                    region = EXCLUDED.region,
                    device = EXCLUDED.device,
                    picture_url = COALESCE(EXCLUDED.picture_url, roster_entries.picture_url),
                    student_id_url = COALESCE(EXCLUDED.student_id_url, roster_entries.student_id_url)",
            )
            .bind(Uuid::new_v4())
            .bind(row.team_id)
            .bind(row.organization_id)
            .bind(&row.game_id)
            .bind(&row.display_name)
            .bind(&row.in_game_name)
            .bind(&row.server_id)
            .bind(row.role.as_str())
            .bind(&row.email)
            .bind(&row.phone)
            .bind(&row.city)
            .bind(&row.region)
            .bind(&row.device)
            .bind(&row.picture_url)
            .bind(&row.student_id_url)
            .execute(&self.db)
            .await?;
        }
        Ok(())
    }

    async fn update_roster_entry(&self, id: Uuid, row: &NewRosterEntry) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE roster_entries SET
                display_name = $1, in_game_name = $2, server_id = $3, role = $4,
                email = $5, phone = $6, city = $7, region = $8, device = $9,
                picture_url = COALESCE($10, picture_url),
                student_id_url = COALESCE($11, student_id_url)
             WHERE id = $12",
        )
        .bind(&row.display_name)
        .bind(&row.in_game_name)
        .bind(&row.server_id)
        .bind(row.role.as_str())
        .bind(&row.email)
        .bind(&row.phone)
        .bind(&row.city)
        .bind(&row.region)
        .bind(&row.device)
        .bind(&row.picture_url)
        .bind(&row.student_id_url)
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Roster entry disappeared".into()));
        }
        Ok(())
    }

    async fn fetch_registration(&self, owner: Uuid) -> AppResult<Option<RegistrationView>> {
        let team = sqlx::query_as::<_, Team>(
            "SELECT id, organization_id, owner_user_id, name, logo_url, referral_code, created_at
             FROM teams WHERE owner_user_id = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;

        let Some(team) = team else {
            return Ok(None);
        };

        let organization = sqlx::query_as::<_, Organization>(
            "SELECT id, owner_user_id, name, region, city, logo_url, created_at
             FROM organizations WHERE id = $1",
        )
        .bind(team.organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization row missing for team".into()))?;

        let roster = sqlx::query_as::<_, RosterEntry>(
            "SELECT id, team_id, organization_id, game_id, display_name, in_game_name,
                    server_id, role, email, phone, city, region, device,
                    picture_url, student_id_url, created_at
             FROM roster_entries WHERE team_id = $1 ORDER BY created_at",
        )
        .bind(team.id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(RegistrationView {
            organization,
            team,
            roster,
        }))
    }
}
