use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::store::DraftCache;

/// The single device-local draft slot, one per user. The wire shape of the
/// blob is fixed: `{ formData, currentStep, draftId, lastSaved }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalDraft {
    #[serde(rename = "formData", default)]
    pub form_data: Value,
    #[serde(rename = "currentStep", default = "default_step")]
    pub current_step: i64,
    #[serde(rename = "draftId", default)]
    pub draft_id: Option<String>,
    #[serde(rename = "lastSaved", default)]
    pub last_saved: Option<String>,
}

fn default_step() -> i64 {
    1
}

impl LocalDraft {
    /// Trimmed title from the form snapshot, or None if absent or blank.
    /// A draft without a title is treated as non-existent everywhere.
    pub fn title(&self) -> Option<&str> {
        self.form_data
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

pub fn slot_key(user_id: i64) -> String {
    format!("funding-draft-{user_id}")
}

/// Reads and writes the per-user draft slot. All read failures (missing key,
/// corrupt JSON, blank title) degrade to None; this accessor never surfaces
/// an error to its callers.
#[derive(Clone)]
pub struct LocalDraftAccessor {
    cache: Arc<dyn DraftCache>,
}

impl LocalDraftAccessor {
    pub fn new(cache: Arc<dyn DraftCache>) -> Self {
        LocalDraftAccessor { cache }
    }

    pub fn get(&self, user_id: i64) -> Option<LocalDraft> {
        let raw = self.cache.get(&slot_key(user_id))?;
        let draft: LocalDraft = match serde_json::from_str(&raw) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Corrupt local draft for user {user_id}, ignoring: {e}");
                return None;
            }
        };
        draft.title()?;
        Some(draft)
    }

    /// Overwrite the slot. Called on every autosave.
    pub fn save(&self, user_id: i64, draft: &LocalDraft) {
        match serde_json::to_string(draft) {
            Ok(json) => self.cache.set(&slot_key(user_id), &json),
            Err(e) => log::warn!("Failed to serialize local draft for user {user_id}: {e}"),
        }
    }

    /// Idempotent; clearing an absent slot is not an error.
    pub fn clear(&self, user_id: i64) {
        self.cache.remove(&slot_key(user_id));
    }

    pub(crate) fn cache(&self) -> &Arc<dyn DraftCache> {
        &self.cache
    }
}
