use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::session::get_user_id;
use crate::db::now_iso;
use crate::drafts::local::LocalDraft;
use crate::drafts::migration;
use crate::drafts::unifier::DraftUnifier;
use crate::errors::AppError;

#[derive(Deserialize)]
pub struct SaveDraftRequest {
    pub form_data: Value,
    #[serde(default = "default_step")]
    pub current_step: i64,
    #[serde(default)]
    pub draft_id: Option<String>,
}

fn default_step() -> i64 {
    1
}

fn current_user(session: &Session) -> Result<i64, AppError> {
    get_user_id(session).ok_or(AppError::Unauthorized)
}

/// GET /api/drafts — the unified draft list plus aggregate flags. A remote
/// fetch failure still returns 200 with the local data and an `error` field.
pub async fn list(
    unifier: web::Data<DraftUnifier>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user(&session)?;

    match unifier.load_all(user_id) {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        // Another load for this process is in flight; the caller retries.
        None => Ok(HttpResponse::Accepted().json(json!({ "status": "loading" }))),
    }
}

/// POST /api/drafts/save — unified save path (local slot + database row).
pub async fn save(
    unifier: web::Data<DraftUnifier>,
    session: Session,
    body: web::Json<SaveDraftRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user(&session)?;
    let req = body.into_inner();

    let id = unifier.save_draft(user_id, req.form_data, req.current_step, req.draft_id)?;
    Ok(HttpResponse::Ok().json(json!({ "draft_id": id })))
}

/// POST /api/drafts/autosave — local-slot-only write, no database call.
/// This is the high-frequency path; the slot is simply overwritten.
pub async fn autosave(
    unifier: web::Data<DraftUnifier>,
    session: Session,
    body: web::Json<SaveDraftRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user(&session)?;
    let req = body.into_inner();

    unifier.local().save(
        user_id,
        &LocalDraft {
            form_data: req.form_data,
            current_step: req.current_step,
            draft_id: req.draft_id,
            last_saved: Some(now_iso()),
        },
    );
    Ok(HttpResponse::Ok().json(json!({ "saved": true })))
}

/// POST /api/drafts/clear-local — idempotent.
pub async fn clear_local(
    unifier: web::Data<DraftUnifier>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user(&session)?;
    unifier.clear_local(user_id);
    Ok(HttpResponse::Ok().json(json!({ "cleared": true })))
}

/// POST /api/drafts/{id}/publish — promote a draft to a live page.
pub async fn publish(
    unifier: web::Data<DraftUnifier>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user(&session)?;
    let id = path.into_inner();

    if !unifier.publish(user_id, &id)? {
        return Err(AppError::NotFound);
    }
    Ok(HttpResponse::Ok().json(json!({ "published": true, "id": id })))
}

/// POST /api/drafts/{id}/delete
pub async fn delete(
    unifier: web::Data<DraftUnifier>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user(&session)?;
    let id = path.into_inner();

    if !unifier.delete_draft(user_id, &id)? {
        return Err(AppError::NotFound);
    }
    Ok(HttpResponse::Ok().json(json!({ "deleted": true })))
}

/// POST /api/drafts/migrate — manual re-run of the legacy sweep. The same
/// sweep runs automatically once per session at login.
pub async fn migrate(
    unifier: web::Data<DraftUnifier>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user(&session)?;
    let report = migration::migrate_legacy_drafts(&unifier, user_id);
    Ok(HttpResponse::Ok().json(json!({
        "migrated": report.migrated,
        "recovered": report.recovered,
        "errors": report.errors,
    })))
}
