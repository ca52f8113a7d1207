use uuid::Uuid;

use crate::error::AppResult;
use crate::registration::store::RegistrationStore;

/// Whether a submission is a first-time registration or an edit of one this
/// caller already owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    New,
    ExistingUpdate {
        organization_id: Uuid,
        team_id: Uuid,
    },
}

/// Organization lookup is scoped to the owner, so two accounts registering
/// the same university name get independent rows instead of sharing one.
/// Both the organization and the team must match for an update; any miss
/// falls back to a fresh registration.
pub async fn resolve(
    store: &dyn RegistrationStore,
    owner: Uuid,
    org_name: &str,
    team_name: &str,
) -> AppResult<Resolution> {
    let Some(org) = store.find_organization(owner, org_name).await? else {
        return Ok(Resolution::New);
    };

    match store.find_team(org.id, owner, team_name).await? {
        Some(team) => Ok(Resolution::ExistingUpdate {
            organization_id: org.id,
            team_id: team.id,
        }),
        None => Ok(Resolution::New),
    }
}
