use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::AppResult;
use crate::registration::form::RegistrationForm;
use crate::storage::paths::{extension, split_path, AssetPaths};
use crate::storage::ObjectStore;

/// Which entity/field an uploaded blob belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetTarget {
    UniversityLogo,
    TeamLogo,
    Picture(usize),
    StudentId(usize),
}

#[derive(Debug)]
pub struct AssetJob {
    pub target: AssetTarget,
    pub path: String,
    pub content_type: String,
    pub blob: Bytes,
}

#[derive(Debug)]
pub struct UploadedAsset {
    pub target: AssetTarget,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFailure {
    pub path: String,
    pub error: String,
}

/// Per-asset outcomes of one submission. Failures never abort sibling
/// uploads; whatever succeeded is still committed to its owning entity.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<UploadedAsset>,
    pub failures: Vec<AssetFailure>,
}

impl UploadReport {
    pub fn url_for(&self, target: AssetTarget) -> Option<&str> {
        self.uploaded
            .iter()
            .find(|a| a.target == target)
            .map(|a| a.url.as_str())
    }
}

/// One upload job per attachment in the form: org/team logos plus picture
/// and student-id blobs for every slot that carries them.
pub fn plan_uploads(form: &RegistrationForm) -> Vec<AssetJob> {
    let paths = AssetPaths::new(&form.university.name, &form.team.name);
    let mut jobs = Vec::new();

    if let Some(logo) = &form.university.logo {
        jobs.push(AssetJob {
            target: AssetTarget::UniversityLogo,
            path: paths.university_logo(&extension(&logo.file_name)),
            content_type: logo.content_type.clone(),
            blob: logo.bytes.clone(),
        });
    }
    if let Some(logo) = &form.team.logo {
        jobs.push(AssetJob {
            target: AssetTarget::TeamLogo,
            path: paths.team_logo(&extension(&logo.file_name)),
            content_type: logo.content_type.clone(),
            blob: logo.bytes.clone(),
        });
    }

    for (slot, s) in form.slots.iter().enumerate() {
        if let Some(picture) = &s.picture {
            jobs.push(AssetJob {
                target: AssetTarget::Picture(slot),
                path: paths.picture(slot, &extension(&picture.file_name)),
                content_type: picture.content_type.clone(),
                blob: picture.bytes.clone(),
            });
        }
        if let Some(doc) = &s.student_id {
            jobs.push(AssetJob {
                target: AssetTarget::StudentId(slot),
                path: paths.student_id(slot, &extension(&doc.file_name)),
                content_type: doc.content_type.clone(),
                blob: doc.bytes.clone(),
            });
        }
    }

    jobs
}

/// Idempotent replace against an append-only store: list the destination
/// directory, remove a colliding object, upload, resolve the public URL.
pub async fn put_asset(
    store: &dyn ObjectStore,
    path: &str,
    content_type: &str,
    blob: Bytes,
) -> AppResult<String> {
    let (dir, name) = split_path(path);
    let existing = store.list(dir).await?;
    if existing.iter().any(|n| n == name) {
        store.remove(&[path.to_string()]).await?;
    }
    store.upload(path, blob, content_type).await?;
    Ok(store.public_url(path))
}

/// Fan the jobs out under a bounded semaphore and join them all, collecting
/// every per-asset outcome. Dropping the returned future (phase timeout)
/// aborts whatever is still in flight.
pub async fn run_uploads(
    store: Arc<dyn ObjectStore>,
    jobs: Vec<AssetJob>,
    concurrency: usize,
) -> UploadReport {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut set = JoinSet::new();

    for job in jobs {
        let store = store.clone();
        let semaphore = semaphore.clone();
        set.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    put_asset(store.as_ref(), &job.path, &job.content_type, job.blob).await
                }
                Err(_) => Err(crate::error::AppError::Internal(
                    "upload semaphore closed".into(),
                )),
            };
            (job.target, job.path, result)
        });
    }

    let mut report = UploadReport::default();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((target, _, Ok(url))) => report.uploaded.push(UploadedAsset { target, url }),
            Ok((_, path, Err(err))) => report.failures.push(AssetFailure {
                path,
                error: err.to_string(),
            }),
            Err(err) => report.failures.push(AssetFailure {
                path: String::new(),
                error: format!("upload task failed: {err}"),
            }),
        }
    }
    report
}
