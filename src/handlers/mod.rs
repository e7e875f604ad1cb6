pub mod auth_handlers;
pub mod campaign_handlers;
pub mod dashboard;
pub mod draft_api;
