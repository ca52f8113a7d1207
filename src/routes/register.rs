use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::registration::form;
use crate::registration::pipeline::{Pipeline, RegistrationOutcome};
use crate::registration::store::RegistrationView;
use crate::AppState;

/// One-shot registration submit. The pipeline returns a structured outcome
/// either way; only malformed requests surface as HTTP errors.
pub async fn submit_registration(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
    mut multipart: Multipart,
) -> AppResult<Json<RegistrationOutcome>> {
    let form = form::from_multipart(&mut multipart).await?;

    tracing::info!(
        user_id = %user.id,
        university = %form.university.name,
        team = %form.team.name,
        "registration submitted"
    );

    let pipeline = Pipeline::new(
        state.store.clone(),
        state.objects.clone(),
        &state.config.pipeline,
    );
    let outcome = pipeline.run(user.id, form).await;

    Ok(Json(outcome))
}

/// The caller's stored registration, used by the wizard to prefill an update.
pub async fn my_registration(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
) -> AppResult<Json<RegistrationView>> {
    let view = state
        .store
        .fetch_registration(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No registration found".into()))?;

    Ok(Json(view))
}
