use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub referral_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub organization_id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub referral_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TeamPatch {
    pub logo_url: Option<String>,
    pub referral_code: Option<String>,
}
