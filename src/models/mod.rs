pub mod campaign;
pub mod user;
