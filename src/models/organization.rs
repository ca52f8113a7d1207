use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub region: String,
    pub city: String,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub owner_user_id: Uuid,
    pub name: String,
    pub region: String,
    pub city: String,
    pub logo_url: Option<String>,
}

/// Fields writable on re-registration. `logo_url: None` keeps the stored one.
#[derive(Debug, Clone)]
pub struct OrganizationPatch {
    pub region: String,
    pub city: String,
    pub logo_url: Option<String>,
}
