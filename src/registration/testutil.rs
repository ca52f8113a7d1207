//! In-memory fakes for the pipeline's two external seams, plus form builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    NewOrganization, NewRosterEntry, NewTeam, Organization, OrganizationPatch, RosterEntry, Team,
    TeamPatch,
};
use crate::registration::form::{Attachment, RegistrationForm, SlotForm};
use crate::registration::pipeline::Pipeline;
use crate::registration::store::{RegistrationStore, RegistrationView};
use crate::storage::paths::split_path;
use crate::storage::ObjectStore;

pub const OWNER_1: Uuid = Uuid::from_u128(0x1111_1111_1111_1111_1111_1111_1111_1111);
pub const OWNER_2: Uuid = Uuid::from_u128(0x2222_2222_2222_2222_2222_2222_2222_2222);

// ---------------------------------------------------------------- objects

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Bytes>>,
    failing: std::sync::Mutex<Vec<String>>,
    hang_uploads: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads to these exact paths fail.
    pub fn fail_paths(&self, paths: &[&str]) {
        let mut failing = self.failing.lock().unwrap();
        failing.extend(paths.iter().map(|p| p.to_string()));
    }

    /// Make every upload park forever, for timeout tests.
    pub fn hang_uploads(&self) {
        self.hang_uploads.store(true, Ordering::SeqCst);
    }

    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn object(&self, path: &str) -> Option<Bytes> {
        self.objects.lock().await.get(path).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, path: &str, blob: Bytes, _content_type: &str) -> AppResult<()> {
        if self.hang_uploads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().iter().any(|p| p == path) {
            return Err(AppError::Storage(format!("injected failure for {path}")));
        }
        let mut objects = self.objects.lock().await;
        // Mirrors the real backend: blind overwrite is rejected.
        if objects.contains_key(path) {
            return Err(AppError::Storage(format!("{path} already exists")));
        }
        objects.insert(path.to_string(), blob);
        Ok(())
    }

    async fn list(&self, dir: &str) -> AppResult<Vec<String>> {
        let objects = self.objects.lock().await;
        Ok(objects
            .keys()
            .filter_map(|path| {
                let (d, name) = split_path(path);
                (d == dir).then(|| name.to_string())
            })
            .collect())
    }

    async fn remove(&self, paths: &[String]) -> AppResult<()> {
        let mut objects = self.objects.lock().await;
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://bucket/{path}")
    }
}

// ------------------------------------------------------------------ store

#[derive(Default)]
struct MemoryInner {
    organizations: Vec<Organization>,
    teams: Vec<Team>,
    roster: Vec<RosterEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    fail_team_insert: AtomicBool,
    org_update_foreign: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_team_insert(&self) {
        self.fail_team_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_org_update_as_foreign(&self) {
        self.org_update_foreign.store(true, Ordering::SeqCst);
    }

    pub async fn organization_count(&self) -> usize {
        self.inner.lock().await.organizations.len()
    }

    pub async fn team_count(&self) -> usize {
        self.inner.lock().await.teams.len()
    }

    pub async fn roster_count(&self) -> usize {
        self.inner.lock().await.roster.len()
    }

    pub async fn roster_rows(&self) -> Vec<RosterEntry> {
        self.inner.lock().await.roster.clone()
    }

    pub async fn seed_organization(&self, owner: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().await.organizations.push(Organization {
            id,
            owner_user_id: owner,
            name: name.to_string(),
            region: "West".into(),
            city: "Springfield".into(),
            logo_url: None,
            created_at: Utc::now(),
        });
        id
    }

    pub async fn seed_team(&self, organization_id: Uuid, owner: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().await.teams.push(Team {
            id,
            organization_id,
            owner_user_id: owner,
            name: name.to_string(),
            logo_url: None,
            referral_code: None,
            created_at: Utc::now(),
        });
        id
    }
}

fn materialize(id: Uuid, row: &NewRosterEntry) -> RosterEntry {
    RosterEntry {
        id,
        team_id: row.team_id,
        organization_id: row.organization_id,
        game_id: row.game_id.clone(),
        display_name: row.display_name.clone(),
        in_game_name: row.in_game_name.clone(),
        server_id: row.server_id.clone(),
        role: row.role.as_str().to_string(),
        email: row.email.clone(),
        phone: row.phone.clone(),
        city: row.city.clone(),
        region: row.region.clone(),
        device: row.device.clone(),
        picture_url: row.picture_url.clone(),
        student_id_url: row.student_id_url.clone(),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn find_organization(&self, owner: Uuid, name: &str) -> AppResult<Option<Organization>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .organizations
            .iter()
            .find(|o| o.owner_user_id == owner && o.name == name)
            .cloned())
    }

    async fn insert_organization(&self, org: &NewOrganization) -> AppResult<Uuid> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner
            .organizations
            .iter()
            .find(|o| o.owner_user_id == org.owner_user_id && o.name == org.name)
        {
            return Ok(existing.id);
        }
        let id = Uuid::new_v4();
        inner.organizations.push(Organization {
            id,
            owner_user_id: org.owner_user_id,
            name: org.name.clone(),
            region: org.region.clone(),
            city: org.city.clone(),
            logo_url: org.logo_url.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &OrganizationPatch,
    ) -> AppResult<()> {
        if self.org_update_foreign.load(Ordering::SeqCst) {
            return Err(AppError::Forbidden(
                "Registration belongs to another account".into(),
            ));
        }
        let mut inner = self.inner.lock().await;
        let org = inner
            .organizations
            .iter_mut()
            .find(|o| o.id == id && o.owner_user_id == owner)
            .ok_or_else(|| {
                AppError::Forbidden("Registration belongs to another account".into())
            })?;
        org.region = patch.region.clone();
        org.city = patch.city.clone();
        if patch.logo_url.is_some() {
            org.logo_url = patch.logo_url.clone();
        }
        Ok(())
    }

    async fn delete_organization(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.organizations.retain(|o| o.id != id);
        inner.teams.retain(|t| t.organization_id != id);
        inner.roster.retain(|r| r.organization_id != id);
        Ok(())
    }

    async fn find_team(
        &self,
        organization_id: Uuid,
        owner: Uuid,
        name: &str,
    ) -> AppResult<Option<Team>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .teams
            .iter()
            .find(|t| {
                t.organization_id == organization_id
                    && t.owner_user_id == owner
                    && t.name == name
            })
            .cloned())
    }

    async fn insert_team(&self, team: &NewTeam) -> AppResult<Uuid> {
        if self.fail_team_insert.load(Ordering::SeqCst) {
            return Err(AppError::Internal("injected team insert failure".into()));
        }
        let mut inner = self.inner.lock().await;
        let id = Uuid::new_v4();
        inner.teams.push(Team {
            id,
            organization_id: team.organization_id,
            owner_user_id: team.owner_user_id,
            name: team.name.clone(),
            logo_url: team.logo_url.clone(),
            referral_code: team.referral_code.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update_team(&self, id: Uuid, owner: Uuid, patch: &TeamPatch) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        let team = inner
            .teams
            .iter_mut()
            .find(|t| t.id == id && t.owner_user_id == owner)
            .ok_or_else(|| {
                AppError::Forbidden("Registration belongs to another account".into())
            })?;
        if patch.logo_url.is_some() {
            team.logo_url = patch.logo_url.clone();
        }
        if patch.referral_code.is_some() {
            team.referral_code = patch.referral_code.clone();
        }
        Ok(())
    }

    async fn delete_team(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.teams.retain(|t| t.id != id);
        inner.roster.retain(|r| r.team_id != id);
        Ok(())
    }

    async fn roster_keys(&self, team_id: Uuid) -> AppResult<Vec<(Uuid, String)>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .roster
            .iter()
            .filter(|r| r.team_id == team_id)
            .map(|r| (r.id, r.game_id.clone()))
            .collect())
    }

    async fn insert_roster_entries(&self, rows: &[NewRosterEntry]) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        for row in rows {
            inner.roster.push(materialize(Uuid::new_v4(), row));
        }
        Ok(())
    }

    async fn update_roster_entry(&self, id: Uuid, row: &NewRosterEntry) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .roster
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound("Roster entry disappeared".into()))?;
        let created_at = stored.created_at;
        let picture = stored.picture_url.clone();
        let doc = stored.student_id_url.clone();
        *stored = materialize(id, row);
        stored.created_at = created_at;
        if stored.picture_url.is_none() {
            stored.picture_url = picture;
        }
        if stored.student_id_url.is_none() {
            stored.student_id_url = doc;
        }
        Ok(())
    }

    async fn fetch_registration(&self, owner: Uuid) -> AppResult<Option<RegistrationView>> {
        let inner = self.inner.lock().await;
        let Some(team) = inner
            .teams
            .iter()
            .find(|t| t.owner_user_id == owner)
            .cloned()
        else {
            return Ok(None);
        };
        let organization = inner
            .organizations
            .iter()
            .find(|o| o.id == team.organization_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Organization row missing for team".into()))?;
        let roster = inner
            .roster
            .iter()
            .filter(|r| r.team_id == team.id)
            .cloned()
            .collect();
        Ok(Some(RegistrationView {
            organization,
            team,
            roster,
        }))
    }
}

// ------------------------------------------------------------------ forms

pub fn attachment(file_name: &str, content_type: &str) -> Attachment {
    Attachment {
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        bytes: Bytes::from_static(b"blobdata"),
    }
}

/// A fully populated slot, bench requirements included.
pub fn filled_slot(slot: usize) -> SlotForm {
    SlotForm {
        name: format!("Player {slot}"),
        ign: format!("ign{slot}"),
        game_id: format!("acct#{slot:03}"),
        server_id: "EU-1".into(),
        email: format!("p{slot}@acme.edu"),
        phone: format!("+1555000{slot:04}"),
        city: "Springfield".into(),
        region: "West".into(),
        device: "phone-11".into(),
        picture: Some(attachment("pic.jpg", "image/jpeg")),
        student_id: Some(attachment("id.jpg", "image/jpeg")),
        picture_url: String::new(),
        student_id_url: String::new(),
    }
}

/// Valid first-time submission: org + team with logos, captain + four
/// players each with picture and student-id blobs, bench slots empty.
pub fn valid_form() -> RegistrationForm {
    let mut form = RegistrationForm::default();
    form.university.name = "Acme U".into();
    form.university.region = "West".into();
    form.university.city = "Springfield".into();
    form.university.logo = Some(attachment("uni.png", "image/png"));
    form.team.name = "Falcons".into();
    form.team.logo = Some(attachment("team.png", "image/png"));

    for slot in 0..5 {
        let mut s = filled_slot(slot);
        if slot != 0 {
            // Only the captain slot requires contact details; keep the
            // others minimal so tests exercise the per-slot rules.
            s.email.clear();
            s.phone.clear();
            s.city.clear();
            s.region.clear();
            s.device.clear();
        }
        form.slots[slot] = s;
    }
    form
}

pub fn memory_pipeline() -> (Pipeline, Arc<MemoryStore>, Arc<MemoryObjectStore>) {
    let store = Arc::new(MemoryStore::new());
    let objects = Arc::new(MemoryObjectStore::new());
    let config = PipelineConfig {
        upload_concurrency: 3,
        phase_timeout_secs: 5,
    };
    let pipeline = Pipeline::new(store.clone(), objects.clone(), &config);
    (pipeline, store, objects)
}

pub async fn seeded_store(org_name: &str, team_name: &str) -> (MemoryStore, Uuid, Uuid) {
    let store = MemoryStore::new();
    let org_id = store.seed_organization(OWNER_1, org_name).await;
    let team_id = store.seed_team(org_id, OWNER_1, team_name).await;
    (store, org_id, team_id)
}

pub fn entry_with_key(team_id: Uuid, organization_id: Uuid, key: &str) -> NewRosterEntry {
    NewRosterEntry {
        team_id,
        organization_id,
        game_id: key.to_string(),
        display_name: format!("Player {key}"),
        in_game_name: format!("ign-{key}"),
        server_id: "EU-1".into(),
        role: crate::models::Role::Player,
        email: None,
        phone: None,
        city: None,
        region: None,
        device: None,
        picture_url: None,
        student_id_url: None,
    }
}
