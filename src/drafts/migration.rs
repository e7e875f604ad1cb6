use super::local::{LocalDraft, slot_key};
use super::unifier::DraftUnifier;

/// Outcome of one legacy sweep. Partial failure is expected: each key is
/// processed independently and one bad blob never aborts the rest.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub migrated: usize,
    pub recovered: Vec<String>,
    pub errors: Vec<String>,
}

/// Key prefixes written by earlier versions of the draft-saving code. All
/// legacy formats carried a `-{user_id}` suffix, same as the current slot.
const LEGACY_PREFIXES: [&str; 2] = ["funding-draft", "draft-"];

/// The cache is shared by every user of the server, so the sweep is scoped
/// to keys carrying this user's suffix. The current slot key matches the
/// prefix too and is explicitly excluded: the live slot is only ever
/// cleared on publish or an explicit discard, never by a sweep.
fn is_legacy_key(key: &str, user_id: i64) -> bool {
    if key == slot_key(user_id) {
        return false;
    }
    key.ends_with(&format!("-{user_id}"))
        && LEGACY_PREFIXES.iter().any(|p| key.starts_with(p))
}

/// One-time sweep of this user's legacy draft keys into the unified store.
/// For every matching key with a non-empty title the blob is persisted as a
/// database row (the live slot is left untouched) and the key removed.
///
/// Removal policy: keys that fail to parse are removed too, so a broken
/// blob is not re-attempted every session. Keys whose *persist* step fails
/// are kept for a later retry, since the data is still intact.
pub fn migrate_legacy_drafts(unifier: &DraftUnifier, user_id: i64) -> MigrationReport {
    let mut report = MigrationReport::default();
    let cache = unifier.cache();

    let mut legacy_keys: Vec<String> = cache
        .keys()
        .into_iter()
        .filter(|k| is_legacy_key(k, user_id))
        .collect();
    legacy_keys.sort();

    log::info!("Found {} legacy draft key(s) for user {user_id}", legacy_keys.len());

    for key in legacy_keys {
        let Some(raw) = cache.get(&key) else {
            continue;
        };

        let draft: LocalDraft = match serde_json::from_str(&raw) {
            Ok(d) => d,
            Err(e) => {
                report.errors.push(format!("Failed to migrate {key}: {e}"));
                cache.remove(&key);
                continue;
            }
        };

        let Some(title) = draft.title().map(str::to_string) else {
            // Nothing worth recovering in an untitled draft.
            cache.remove(&key);
            continue;
        };

        match unifier.import_draft(user_id, &draft.form_data, draft.draft_id) {
            Ok(new_id) => {
                log::info!("Migrated draft \"{title}\" from {key} -> {new_id}");
                report.migrated += 1;
                report.recovered.push(title);
                cache.remove(&key);
            }
            Err(e) => {
                report.errors.push(format!("Failed to migrate {key}: {e}"));
            }
        }
    }

    report
}
