//! Draft reconciliation: unifies the device-local draft slot with the
//! draft rows persisted in funding_pages, so the UI can offer a single
//! "continue where you left off" view.

pub mod local;
pub mod migration;
pub mod state;
pub mod store;
pub mod unifier;
