use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::session::auth_context;
use crate::db::DbPool;
use crate::drafts::state::DraftsController;
use crate::drafts::unifier::DraftUnifier;
use crate::errors::{AppError, render};
use crate::models::campaign;
use crate::templates_structs::{
    CampaignDetailTemplate, CampaignsTemplate, DraftsTemplate, PageContext, app_name,
};

const BROWSE_LIMIT: i64 = 100;

/// GET /campaigns — public browse of live campaign pages.
pub async fn browse(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let campaigns = campaign::find_public(&conn, BROWSE_LIMIT)?;
    render(CampaignsTemplate {
        app_name: app_name(),
        campaigns,
    })
}

/// GET /campaigns/{id} — public detail page. Unpublished pages are only
/// visible to their owner.
pub async fn detail(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let conn = pool.get()?;
    let page = campaign::find_by_id(&conn, &id)?.ok_or(AppError::NotFound)?;

    if !page.is_live() {
        let viewer = crate::auth::session::get_user_id(&session);
        if viewer != Some(page.user_id) {
            return Err(AppError::NotFound);
        }
    }

    render(CampaignDetailTemplate {
        app_name: app_name(),
        campaign: page,
    })
}

/// GET /drafts — the authenticated user's unified draft list.
pub async fn drafts(
    unifier: web::Data<DraftUnifier>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session)?;
    let controller = DraftsController::new(unifier.into_inner(), auth_context(&session));
    let view = controller.snapshot();
    render(DraftsTemplate { ctx, view })
}
