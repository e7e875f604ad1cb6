// Template context structures for Askama templates.

use actix_session::Session;
use askama::Template;

use crate::auth::csrf;
use crate::auth::session::{get_username, take_flash};
use crate::drafts::state::DraftsView;
use crate::errors::AppError;
use crate::models::campaign::Campaign;

pub fn app_name() -> String {
    std::env::var("APP_NAME").unwrap_or_else(|_| "OrangeCat".to_string())
}

/// Common context shared by all authenticated pages.
pub struct PageContext {
    pub username: String,
    pub flash: Option<String>,
    pub app_name: String,
    pub csrf_token: String,
}

impl PageContext {
    pub fn build(session: &Session) -> Result<Self, AppError> {
        let username = get_username(session)
            .map_err(|e| AppError::Session(format!("Failed to get username: {}", e)))?;
        Ok(PageContext {
            username,
            flash: take_flash(session),
            app_name: app_name(),
            csrf_token: csrf::get_or_create_token(session),
        })
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub app_name: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub errors: Vec<String>,
    pub app_name: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub greeting: String,
    pub view: DraftsView,
}

#[derive(Template)]
#[template(path = "drafts.html")]
pub struct DraftsTemplate {
    pub ctx: PageContext,
    pub view: DraftsView,
}

#[derive(Template)]
#[template(path = "campaigns.html")]
pub struct CampaignsTemplate {
    pub app_name: String,
    pub campaigns: Vec<Campaign>,
}

#[derive(Template)]
#[template(path = "campaign_detail.html")]
pub struct CampaignDetailTemplate {
    pub app_name: String,
    pub campaign: Campaign,
}
