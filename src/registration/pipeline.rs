use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{AppError, AppResult};
use crate::models::{NewOrganization, NewRosterEntry, NewTeam, OrganizationPatch, Role, TeamPatch};
use crate::registration::assets::{self, AssetFailure, AssetTarget, UploadReport};
use crate::registration::form::{RegistrationForm, SlotForm};
use crate::registration::reconcile;
use crate::registration::resolve::{self, Resolution};
use crate::registration::store::RegistrationStore;
use crate::registration::validate;
use crate::storage::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Validating,
    Resolving,
    UploadingAssets,
    PersistingOrganization,
    PersistingTeam,
    ReconcilingRoster,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Validating => "validation",
            Phase::Resolving => "resolution",
            Phase::UploadingAssets => "asset upload",
            Phase::PersistingOrganization => "organization persistence",
            Phase::PersistingTeam => "team persistence",
            Phase::ReconcilingRoster => "roster reconciliation",
        }
    }
}

/// What the caller gets back. There is no cross-phase transaction, so on
/// failure `phases_completed` and `compensated` say exactly which writes
/// stuck and which were rolled back.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub phases_completed: Vec<Phase>,
    pub organization_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub roster_updated: usize,
    pub roster_inserted: usize,
    pub asset_failures: Vec<AssetFailure>,
    pub compensated: Vec<&'static str>,
}

impl RegistrationOutcome {
    fn complete(&mut self, phase: Phase) {
        self.phases_completed.push(phase);
    }
}

/// Rows created by this run, eligible for rollback. Pre-existing rows are
/// never compensated: there is no snapshot to restore them from.
#[derive(Debug, Default)]
struct SagaState {
    created_organization: Option<Uuid>,
    created_team: Option<Uuid>,
}

pub struct Pipeline {
    store: Arc<dyn RegistrationStore>,
    objects: Arc<dyn ObjectStore>,
    upload_concurrency: usize,
    phase_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        objects: Arc<dyn ObjectStore>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            store,
            objects,
            upload_concurrency: config.upload_concurrency,
            phase_timeout: Duration::from_secs(config.phase_timeout_secs),
        }
    }

    pub async fn run(&self, owner: Uuid, form: RegistrationForm) -> RegistrationOutcome {
        let mut outcome = RegistrationOutcome::default();
        let mut saga = SagaState::default();

        match self.execute(owner, form, &mut outcome, &mut saga).await {
            Ok(()) => {
                outcome.success = true;
                tracing::info!(
                    organization_id = ?outcome.organization_id,
                    team_id = ?outcome.team_id,
                    updated = outcome.roster_updated,
                    inserted = outcome.roster_inserted,
                    "registration committed"
                );
            }
            Err(err) => {
                tracing::error!(error = %err, phases = ?outcome.phases_completed, "registration failed");
                outcome.error = Some(err.to_string());
                self.compensate(&mut outcome, saga).await;
            }
        }
        outcome
    }

    /// Wrap one phase's awaits in the configured timeout. A timed-out upload
    /// phase drops its join set, which aborts the in-flight uploads.
    async fn phase<T>(
        &self,
        phase: Phase,
        fut: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.phase_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::PhaseTimeout(phase.name().to_string())),
        }
    }

    async fn execute(
        &self,
        owner: Uuid,
        form: RegistrationForm,
        outcome: &mut RegistrationOutcome,
        saga: &mut SagaState,
    ) -> AppResult<()> {
        // Validating: pure checks, zero side effects on failure.
        validate::validate_submission(&form)?;
        outcome.complete(Phase::Validating);

        let resolution = self
            .phase(
                Phase::Resolving,
                resolve::resolve(
                    self.store.as_ref(),
                    owner,
                    &form.university.name,
                    &form.team.name,
                ),
            )
            .await?;
        outcome.complete(Phase::Resolving);

        // Fan out and join all uploads before anything is persisted; roster
        // rows embed the resolved URLs. Per-asset failures are collected,
        // never fatal to siblings.
        let jobs = assets::plan_uploads(&form);
        let report = self
            .phase(Phase::UploadingAssets, async {
                Ok(assets::run_uploads(self.objects.clone(), jobs, self.upload_concurrency).await)
            })
            .await?;
        if !report.failures.is_empty() {
            tracing::warn!(
                failed = report.failures.len(),
                uploaded = report.uploaded.len(),
                "some assets failed to upload"
            );
        }
        outcome.asset_failures = report.failures.clone();
        outcome.complete(Phase::UploadingAssets);

        let org_logo = resolved_url(&report, AssetTarget::UniversityLogo, &form.university.logo_url);
        let team_logo = resolved_url(&report, AssetTarget::TeamLogo, &form.team.logo_url);

        // Organization first: the team row references its id.
        let organization_id = match resolution {
            Resolution::New => {
                let org = NewOrganization {
                    owner_user_id: owner,
                    name: form.university.name.clone(),
                    region: form.university.region.clone(),
                    city: form.university.city.clone(),
                    logo_url: org_logo,
                };
                let id = self
                    .phase(
                        Phase::PersistingOrganization,
                        self.store.insert_organization(&org),
                    )
                    .await?;
                saga.created_organization = Some(id);
                id
            }
            Resolution::ExistingUpdate {
                organization_id, ..
            } => {
                let patch = OrganizationPatch {
                    region: form.university.region.clone(),
                    city: form.university.city.clone(),
                    logo_url: org_logo,
                };
                self.phase(
                    Phase::PersistingOrganization,
                    self.store.update_organization(organization_id, owner, &patch),
                )
                .await?;
                organization_id
            }
        };
        outcome.organization_id = Some(organization_id);
        outcome.complete(Phase::PersistingOrganization);

        let team_id = match resolution {
            Resolution::New => {
                let team = NewTeam {
                    organization_id,
                    owner_user_id: owner,
                    name: form.team.name.clone(),
                    logo_url: team_logo,
                    referral_code: form.team.referral_code.clone(),
                };
                let id = self
                    .phase(Phase::PersistingTeam, self.store.insert_team(&team))
                    .await?;
                saga.created_team = Some(id);
                id
            }
            Resolution::ExistingUpdate { team_id, .. } => {
                let patch = TeamPatch {
                    logo_url: team_logo,
                    referral_code: form.team.referral_code.clone(),
                };
                self.phase(
                    Phase::PersistingTeam,
                    self.store.update_team(team_id, owner, &patch),
                )
                .await?;
                team_id
            }
        };
        outcome.team_id = Some(team_id);
        outcome.complete(Phase::PersistingTeam);

        let entries = build_entries(&form, organization_id, team_id, &report);
        let (updated, inserted) = self
            .phase(Phase::ReconcilingRoster, async {
                let existing = self.store.roster_keys(team_id).await?;
                let reconciled = reconcile::reconcile(entries, &existing);
                let counts = (reconciled.updates.len(), reconciled.inserts.len());
                for (id, entry) in &reconciled.updates {
                    self.store.update_roster_entry(*id, entry).await?;
                }
                if !reconciled.inserts.is_empty() {
                    self.store.insert_roster_entries(&reconciled.inserts).await?;
                }
                Ok(counts)
            })
            .await?;
        outcome.roster_updated = updated;
        outcome.roster_inserted = inserted;
        outcome.complete(Phase::ReconcilingRoster);

        Ok(())
    }

    /// Roll back rows this run created, in reverse order. Deleting the team
    /// cascades to any roster rows that made it in.
    async fn compensate(&self, outcome: &mut RegistrationOutcome, saga: SagaState) {
        if let Some(team_id) = saga.created_team {
            match self.store.delete_team(team_id).await {
                Ok(()) => outcome.compensated.push("team"),
                Err(err) => {
                    tracing::warn!(%team_id, error = %err, "failed to roll back team row")
                }
            }
        }
        if let Some(org_id) = saga.created_organization {
            match self.store.delete_organization(org_id).await {
                Ok(()) => outcome.compensated.push("organization"),
                Err(err) => {
                    tracing::warn!(%org_id, error = %err, "failed to roll back organization row")
                }
            }
        }
    }
}

/// Freshly uploaded URL for the target, else the stored URL the client
/// passed back, else nothing (keep whatever the row already has).
fn resolved_url(report: &UploadReport, target: AssetTarget, stored: &str) -> Option<String> {
    report
        .url_for(target)
        .map(str::to_owned)
        .or_else(|| (!stored.is_empty()).then(|| stored.to_string()))
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn build_entry(
    slot: usize,
    s: &SlotForm,
    organization_id: Uuid,
    team_id: Uuid,
    report: &UploadReport,
) -> NewRosterEntry {
    NewRosterEntry {
        team_id,
        organization_id,
        game_id: s.game_id.clone(),
        display_name: s.name.clone(),
        in_game_name: s.ign.clone(),
        server_id: s.server_id.clone(),
        role: Role::for_slot(slot),
        email: optional(&s.email),
        phone: optional(&s.phone),
        city: optional(&s.city),
        region: optional(&s.region),
        device: optional(&s.device),
        picture_url: resolved_url(report, AssetTarget::Picture(slot), &s.picture_url),
        student_id_url: resolved_url(report, AssetTarget::StudentId(slot), &s.student_id_url),
    }
}

fn build_entries(
    form: &RegistrationForm,
    organization_id: Uuid,
    team_id: Uuid,
    report: &UploadReport,
) -> Vec<NewRosterEntry> {
    form.slots
        .iter()
        .enumerate()
        .filter(|(slot, s)| *slot < 5 || !s.is_empty())
        .map(|(slot, s)| build_entry(slot, s, organization_id, team_id, report))
        .collect()
}
