use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::{Local, Timelike};

use crate::auth::session::auth_context;
use crate::drafts::state::DraftsController;
use crate::drafts::unifier::DraftUnifier;
use crate::errors::{AppError, render};
use crate::templates_structs::{DashboardTemplate, PageContext};

fn time_greeting(username: &str) -> String {
    let hour = Local::now().hour();
    let period = match hour {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    };
    format!("{}, {}", period, username)
}

pub async fn index(
    unifier: web::Data<DraftUnifier>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session)?;
    let greeting = time_greeting(&ctx.username);

    let controller = DraftsController::new(unifier.into_inner(), auth_context(&session));
    let view = controller.snapshot();

    let tmpl = DashboardTemplate { ctx, greeting, view };
    render(tmpl)
}
