use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::unifier::{DraftUnifier, UnifiedDrafts};
use crate::errors::AppError;

/// Identity readiness supplied by the auth layer. No load is attempted
/// until the session is hydrated and a user id is present, so a previous
/// user's leftover slot is never read.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthContext {
    pub user_id: Option<i64>,
    pub hydrated: bool,
}

impl AuthContext {
    pub fn ready(&self) -> Option<i64> {
        if self.hydrated { self.user_id } else { None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftsPhase {
    Loading,
    Ready,
}

/// Snapshot handed to the view layer. While loading, `data` is whatever
/// the previous load produced (empty on first load).
#[derive(Debug, Clone)]
pub struct DraftsView {
    pub phase: DraftsPhase,
    pub data: UnifiedDrafts,
}

impl DraftsView {
    pub fn is_loading(&self) -> bool {
        self.phase == DraftsPhase::Loading
    }
}

/// Presentation-facing state machine over the unifier:
/// Loading -> Ready(data), Loading -> Ready(error), and back to Loading on
/// refresh or after a mutating action. There is no background polling;
/// every reload is an explicit call.
pub struct DraftsController {
    unifier: Arc<DraftUnifier>,
    auth: AuthContext,
    view: Mutex<DraftsView>,
}

impl DraftsController {
    pub fn new(unifier: Arc<DraftUnifier>, auth: AuthContext) -> Self {
        let controller = DraftsController {
            unifier,
            auth,
            view: Mutex::new(DraftsView {
                phase: DraftsPhase::Loading,
                data: UnifiedDrafts::default(),
            }),
        };
        controller.refresh();
        controller
    }

    pub fn snapshot(&self) -> DraftsView {
        self.view.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Re-load the unified view. With no ready identity this settles to an
    /// empty Ready state. An overlapping in-flight load leaves the current
    /// view untouched.
    pub fn refresh(&self) {
        let Some(user_id) = self.auth.ready() else {
            let mut view = self.view.lock().unwrap_or_else(|e| e.into_inner());
            view.phase = DraftsPhase::Ready;
            view.data = UnifiedDrafts::default();
            return;
        };

        {
            let mut view = self.view.lock().unwrap_or_else(|e| e.into_inner());
            view.phase = DraftsPhase::Loading;
        }

        if let Some(data) = self.unifier.load_all(user_id) {
            let mut view = self.view.lock().unwrap_or_else(|e| e.into_inner());
            view.phase = DraftsPhase::Ready;
            view.data = data;
        }
    }

    /// Unified save, then re-load.
    pub fn save_draft(
        &self,
        form_data: Value,
        current_step: i64,
        draft_id: Option<String>,
    ) -> Result<String, AppError> {
        let user_id = self
            .auth
            .ready()
            .ok_or_else(|| AppError::Session("Not signed in".to_string()))?;
        let id = self.unifier.save_draft(user_id, form_data, current_step, draft_id)?;
        self.refresh();
        Ok(id)
    }

    /// Drop the local slot, then re-load. Safe to call repeatedly.
    pub fn clear_local_draft(&self) {
        if let Some(user_id) = self.auth.ready() {
            self.unifier.clear_local(user_id);
            self.refresh();
        }
    }
}
