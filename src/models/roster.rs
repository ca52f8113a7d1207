use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ROSTER_SLOTS: usize = 7;

/// Position a roster slot plays. Slots 0-4 are the starting lineup
/// (captain + four players); 5 and 6 are the optional bench slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Captain,
    Player,
    Substitute,
    Manager,
}

impl Role {
    pub fn for_slot(slot: usize) -> Role {
        match slot {
            0 => Role::Captain,
            1..=4 => Role::Player,
            5 => Role::Substitute,
            _ => Role::Manager,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Captain => "captain",
            Role::Player => "player",
            Role::Substitute => "substitute",
            Role::Manager => "manager",
        }
    }
}

/// Storage path segment for a slot, e.g. `captain` or `player3`.
pub fn slot_segment(slot: usize) -> &'static str {
    match slot {
        0 => "captain",
        1 => "player2",
        2 => "player3",
        3 => "player4",
        4 => "player5",
        5 => "substitute",
        _ => "manager",
    }
}

/// Human label used in validation errors, e.g. "Captain" / "Substitute".
pub fn slot_label(slot: usize) -> &'static str {
    match slot {
        0 => "Captain",
        1 => "Player 2",
        2 => "Player 3",
        3 => "Player 4",
        4 => "Player 5",
        5 => "Substitute",
        _ => "Manager",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: Uuid,
    pub team_id: Uuid,
    pub organization_id: Uuid,
    /// Natural key: the participant's game account id, unique per roster.
    pub game_id: String,
    pub display_name: String,
    pub in_game_name: String,
    pub server_id: String,
    pub role: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub device: Option<String>,
    pub picture_url: Option<String>,
    pub student_id_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRosterEntry {
    pub team_id: Uuid,
    pub organization_id: Uuid,
    pub game_id: String,
    pub display_name: String,
    pub in_game_name: String,
    pub server_id: String,
    pub role: Role,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub device: Option<String>,
    pub picture_url: Option<String>,
    pub student_id_url: Option<String>,
}
