pub mod auth;
pub mod db;
pub mod drafts;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod templates_structs;
