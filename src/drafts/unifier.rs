use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

use super::local::{LocalDraft, LocalDraftAccessor};
use super::store::DraftCache;
use crate::db::{DbPool, now_iso};
use crate::errors::AppError;
use crate::models::campaign::{self, CampaignFields};

/// Origin tag for a unified draft entry. Assigned once, never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftSource {
    Local,
    Database,
}

impl std::fmt::Display for DraftSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftSource::Local => write!(f, "local"),
            DraftSource::Database => write!(f, "database"),
        }
    }
}

/// One entry in the merged draft list. Wizard state (`form_data`,
/// `current_step`) is only carried for the local-origin entry.
#[derive(Debug, Clone, Serialize)]
pub struct UnifiedDraft {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub goal_amount: Option<f64>,
    pub category: Option<String>,
    pub form_data: Option<Value>,
    pub current_step: Option<i64>,
    pub last_saved: Option<String>,
    pub source: DraftSource,
}

/// The merged view plus aggregate flags. `error` carries a degraded remote
/// fetch; the local entries are still present in that case.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnifiedDrafts {
    pub drafts: Vec<UnifiedDraft>,
    pub total: usize,
    pub has_local: bool,
    pub has_database: bool,
    pub error: Option<String>,
}

impl UnifiedDrafts {
    /// The draft to surface as "continue where you left off". The local
    /// draft always wins; otherwise the newest database draft.
    pub fn primary(&self) -> Option<&UnifiedDraft> {
        self.drafts
            .iter()
            .find(|d| d.source == DraftSource::Local)
            .or_else(|| self.drafts.first())
    }
}

/// Merges the local draft slot with the user's draft rows.
pub struct DraftUnifier {
    pool: DbPool,
    local: LocalDraftAccessor,
    load_guard: Mutex<()>,
}

impl DraftUnifier {
    pub fn new(pool: DbPool, cache: Arc<dyn DraftCache>) -> Self {
        DraftUnifier {
            pool,
            local: LocalDraftAccessor::new(cache),
            load_guard: Mutex::new(()),
        }
    }

    pub fn local(&self) -> &LocalDraftAccessor {
        &self.local
    }

    pub(crate) fn cache(&self) -> &Arc<dyn DraftCache> {
        self.local.cache()
    }

    /// Load and merge both sources. Returns None when another load is
    /// already in flight (overlapping calls are a no-op, not a queue).
    ///
    /// A remote failure does not fail the load: the local draft is still
    /// returned and the error is attached as data.
    pub fn load_all(&self, user_id: i64) -> Option<UnifiedDrafts> {
        let _guard = match self.load_guard.try_lock() {
            Ok(g) => g,
            Err(_) => {
                log::debug!("Draft load already in flight for user {user_id}, skipping");
                return None;
            }
        };

        let local = self.local.get(user_id);

        let remote = self
            .pool
            .get()
            .map_err(|e| e.to_string())
            .and_then(|conn| {
                campaign::find_drafts_by_user(&conn, user_id).map_err(|e| e.to_string())
            });

        let (mut rows, error) = match remote {
            Ok(rows) => (rows, None),
            Err(e) => {
                log::warn!("Remote draft fetch failed for user {user_id}: {e}");
                (Vec::new(), Some(e))
            }
        };

        // Blank-titled rows are invisible, same rule as the local slot.
        rows.retain(|r| !r.title.trim().is_empty());
        let has_database = !rows.is_empty();

        // Dedup: the id carried in the local slot is the only merge key.
        // The local version wins because autosave writes it more often
        // than the remote row is updated.
        if let Some(linked) = local.as_ref().and_then(|l| l.draft_id.as_deref()) {
            rows.retain(|r| r.id != linked);
        }

        let mut drafts = Vec::with_capacity(rows.len() + 1);
        let has_local = local.is_some();
        if let Some(l) = local {
            drafts.push(local_to_unified(user_id, l));
        }
        drafts.extend(rows.into_iter().map(row_to_unified));

        let total = drafts.len();
        Some(UnifiedDrafts {
            drafts,
            total,
            has_local,
            has_database,
            error,
        })
    }

    /// Unified save path: the local slot is written first so the wizard
    /// never loses keystrokes to a slow database, then the remote row is
    /// created or updated. A newly created row's id is linked back into
    /// the slot. Returns the remote draft id.
    pub fn save_draft(
        &self,
        user_id: i64,
        form_data: Value,
        current_step: i64,
        draft_id: Option<String>,
    ) -> Result<String, AppError> {
        let mut slot = LocalDraft {
            form_data,
            current_step,
            draft_id: draft_id.clone(),
            last_saved: Some(now_iso()),
        };
        self.local.save(user_id, &slot);

        let id = self.persist_row(user_id, &slot.form_data, draft_id)?;

        if slot.draft_id.as_deref() != Some(id.as_str()) {
            slot.draft_id = Some(id.clone());
            self.local.save(user_id, &slot);
        }

        Ok(id)
    }

    /// Persist a recovered draft straight to a database row. Unlike
    /// `save_draft` this never touches the local slot, so a migration sweep
    /// cannot clobber whatever the user is currently editing.
    pub fn import_draft(
        &self,
        user_id: i64,
        form_data: &Value,
        draft_id: Option<String>,
    ) -> Result<String, AppError> {
        self.persist_row(user_id, form_data, draft_id)
    }

    /// Update-or-create for a draft row, returning the row id.
    fn persist_row(
        &self,
        user_id: i64,
        form_data: &Value,
        draft_id: Option<String>,
    ) -> Result<String, AppError> {
        let conn = self.pool.get()?;
        let fields = CampaignFields::from_form(form_data);

        let updated = match &draft_id {
            Some(existing) => campaign::update_draft(&conn, user_id, existing, &fields)?,
            None => false,
        };
        let id = match (updated, draft_id) {
            (true, Some(existing)) => existing,
            // No linked row, or the link went stale (row published or
            // deleted elsewhere): start a fresh draft row.
            _ => campaign::create_draft(&conn, user_id, &fields)?,
        };
        Ok(id)
    }

    /// Idempotent; clearing twice is fine.
    pub fn clear_local(&self, user_id: i64) {
        self.local.clear(user_id);
    }

    /// Promote a draft row to a live page and drop the local slot.
    /// Returns false if the user owns no such draft.
    pub fn publish(&self, user_id: i64, id: &str) -> Result<bool, AppError> {
        let conn = self.pool.get()?;
        let published = campaign::publish(&conn, user_id, id)?;
        if published {
            self.local.clear(user_id);
        }
        Ok(published)
    }

    /// Delete a draft row; the local slot is only dropped if it was linked
    /// to the deleted row.
    pub fn delete_draft(&self, user_id: i64, id: &str) -> Result<bool, AppError> {
        let conn = self.pool.get()?;
        let deleted = campaign::delete(&conn, user_id, id)?;
        if deleted {
            let linked = self
                .local
                .get(user_id)
                .and_then(|l| l.draft_id)
                .is_some_and(|l| l == id);
            if linked {
                self.local.clear(user_id);
            }
        }
        Ok(deleted)
    }
}

fn local_to_unified(user_id: i64, draft: LocalDraft) -> UnifiedDraft {
    let fields = CampaignFields::from_form(&draft.form_data);
    let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
    UnifiedDraft {
        id: format!("local-{user_id}"),
        // get() already rejected blank titles
        title: draft.title().unwrap_or_default().to_string(),
        description: non_empty(fields.description),
        goal_amount: fields.goal_amount,
        category: non_empty(fields.category),
        form_data: Some(draft.form_data),
        current_step: Some(draft.current_step),
        last_saved: draft.last_saved,
        source: DraftSource::Local,
    }
}

fn row_to_unified(row: campaign::Campaign) -> UnifiedDraft {
    let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
    UnifiedDraft {
        id: row.id,
        title: row.title,
        description: non_empty(row.description),
        goal_amount: row.goal_amount,
        category: non_empty(row.category),
        form_data: None,
        current_step: None,
        last_saved: Some(row.updated_at),
        source: DraftSource::Database,
    }
}
