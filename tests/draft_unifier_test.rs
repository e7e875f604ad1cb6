//! Draft unifier tests — merging the local slot with database draft rows:
//! dedup by carried draft id, blank-title exclusion, primary selection,
//! degraded remote fetch, and the unified save path.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::*;
use orangecat::db::DbPool;
use orangecat::drafts::local::slot_key;
use orangecat::drafts::store::{DraftCache, MemoryCache};
use orangecat::drafts::unifier::{DraftSource, DraftUnifier};
use orangecat::models::campaign::{self, CampaignFields};

fn make_unifier(pool: &DbPool) -> (Arc<MemoryCache>, DraftUnifier) {
    let cache = Arc::new(MemoryCache::default());
    let unifier = DraftUnifier::new(pool.clone(), cache.clone());
    (cache, unifier)
}

fn put_local_slot(cache: &MemoryCache, user_id: i64, title: &str, draft_id: Option<&str>) {
    let blob = json!({
        "formData": { "title": title, "description": "wip" },
        "currentStep": 3,
        "draftId": draft_id,
        "lastSaved": "2025-06-01T10:00:00",
    });
    cache.set(&slot_key(user_id), &blob.to_string());
}

fn seed_db_draft(pool: &DbPool, user_id: i64, title: &str) -> String {
    let conn = pool.get().expect("conn");
    campaign::create_draft(
        &conn,
        user_id,
        &CampaignFields {
            title: title.to_string(),
            ..CampaignFields::default()
        },
    )
    .expect("create draft")
}

#[test]
fn dedup_suppresses_database_row_linked_to_local_slot() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "alice");
    let (cache, unifier) = make_unifier(&pool);

    let linked_id = seed_db_draft(&pool, user_id, "My Campaign");
    let other_id = seed_db_draft(&pool, user_id, "Second Draft");
    put_local_slot(&cache, user_id, "My Campaign", Some(&linked_id));

    let data = unifier.load_all(user_id).expect("load");

    // Exactly one entry for the linked campaign, sourced local.
    assert_eq!(data.total, 2);
    assert_eq!(data.drafts[0].source, DraftSource::Local);
    assert_eq!(data.drafts[0].title, "My Campaign");
    assert!(data.drafts.iter().all(|d| d.id != linked_id));
    assert!(data.drafts.iter().any(|d| d.id == other_id));
    assert!(data.has_local);
    assert!(data.has_database);
    assert!(data.error.is_none());
}

#[test]
fn blank_titles_are_invisible_from_both_sources() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "bob");
    let (cache, unifier) = make_unifier(&pool);

    put_local_slot(&cache, user_id, "   ", None);
    let id = seed_db_draft(&pool, user_id, "Visible");
    {
        let conn = pool.get().expect("conn");
        conn.execute("UPDATE funding_pages SET title = '  ' WHERE id = ?1", [&id])
            .expect("blank out title");
    }

    let data = unifier.load_all(user_id).expect("load");
    assert_eq!(data.total, 0);
    assert!(!data.has_local);
    assert!(!data.has_database);
    assert!(data.primary().is_none());
}

#[test]
fn primary_prefers_local_over_newer_database_drafts() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "carol");
    let (cache, unifier) = make_unifier(&pool);

    seed_db_draft(&pool, user_id, "Newer Database Draft");
    seed_db_draft(&pool, user_id, "Another Database Draft");
    put_local_slot(&cache, user_id, "Local Work In Progress", None);

    let data = unifier.load_all(user_id).expect("load");
    let primary = data.primary().expect("primary");
    assert_eq!(primary.source, DraftSource::Local);
    assert_eq!(primary.title, "Local Work In Progress");
    assert_eq!(primary.current_step, Some(3));
}

#[test]
fn primary_falls_back_to_newest_database_draft() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "dave");
    let (_cache, unifier) = make_unifier(&pool);

    let older = seed_db_draft(&pool, user_id, "Older");
    let newer = seed_db_draft(&pool, user_id, "Newer");
    {
        // Pin distinct timestamps so recency is unambiguous.
        let conn = pool.get().expect("conn");
        conn.execute(
            "UPDATE funding_pages SET updated_at = '2025-01-01T00:00:00' WHERE id = ?1",
            [&older],
        )
        .expect("pin older");
        conn.execute(
            "UPDATE funding_pages SET updated_at = '2025-02-01T00:00:00' WHERE id = ?1",
            [&newer],
        )
        .expect("pin newer");
    }

    let data = unifier.load_all(user_id).expect("load");
    let primary = data.primary().expect("primary");
    assert_eq!(primary.id, newer);
    assert_eq!(primary.source, DraftSource::Database);
}

#[test]
fn remote_failure_still_returns_local_draft() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "erin");
    let (cache, unifier) = make_unifier(&pool);

    put_local_slot(&cache, user_id, "Survives Outages", None);
    {
        let conn = pool.get().expect("conn");
        conn.execute_batch("DROP TABLE funding_pages").expect("drop table");
    }

    let data = unifier.load_all(user_id).expect("load must not fail");
    assert!(data.error.is_some());
    assert!(data.has_local);
    assert!(!data.has_database);
    assert_eq!(data.total, 1);
    assert_eq!(data.primary().expect("primary").title, "Survives Outages");
}

#[test]
fn clear_local_is_idempotent() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "fred");
    let (cache, unifier) = make_unifier(&pool);

    put_local_slot(&cache, user_id, "Gone Soon", None);
    unifier.clear_local(user_id);
    unifier.clear_local(user_id);

    let data = unifier.load_all(user_id).expect("load");
    assert!(!data.has_local);
}

#[test]
fn save_draft_creates_row_and_links_slot() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "gina");
    let (cache, unifier) = make_unifier(&pool);

    let id = unifier
        .save_draft(
            user_id,
            json!({ "title": "Fresh Draft", "goal_amount": "1.5" }),
            2,
            None,
        )
        .expect("save");

    // The slot now carries the server-assigned id.
    let raw = cache.get(&slot_key(user_id)).expect("slot written");
    let blob: serde_json::Value = serde_json::from_str(&raw).expect("valid slot json");
    assert_eq!(blob["draftId"], json!(id));
    assert_eq!(blob["currentStep"], json!(2));

    let conn = pool.get().expect("conn");
    let row = campaign::find_by_id(&conn, &id).expect("query").expect("row");
    assert_eq!(row.title, "Fresh Draft");
    assert_eq!(row.goal_amount, Some(1.5));
    assert!(row.is_draft());
}

#[test]
fn save_draft_updates_linked_row_in_place() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "hank");
    let (_cache, unifier) = make_unifier(&pool);

    let id = unifier
        .save_draft(user_id, json!({ "title": "First Pass" }), 1, None)
        .expect("save");
    let same_id = unifier
        .save_draft(user_id, json!({ "title": "Second Pass" }), 2, Some(id.clone()))
        .expect("save again");

    assert_eq!(id, same_id);
    let conn = pool.get().expect("conn");
    let drafts = campaign::find_drafts_by_user(&conn, user_id).expect("list");
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].title, "Second Pass");
}

#[test]
fn save_draft_with_stale_link_creates_fresh_row() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "iris");
    let (cache, unifier) = make_unifier(&pool);

    let id = unifier
        .save_draft(user_id, json!({ "title": "Doomed" }), 1, None)
        .expect("save");
    unifier.delete_draft(user_id, &id).expect("delete");

    let new_id = unifier
        .save_draft(user_id, json!({ "title": "Reborn" }), 1, Some(id.clone()))
        .expect("save with stale link");
    assert_ne!(id, new_id);

    let raw = cache.get(&slot_key(user_id)).expect("slot");
    let blob: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(blob["draftId"], json!(new_id));
}

#[test]
fn publish_promotes_row_and_clears_slot() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "judy");
    let (cache, unifier) = make_unifier(&pool);

    let id = unifier
        .save_draft(user_id, json!({ "title": "Going Live" }), 4, None)
        .expect("save");

    assert!(unifier.publish(user_id, &id).expect("publish"));
    assert!(cache.get(&slot_key(user_id)).is_none());

    let conn = pool.get().expect("conn");
    let row = campaign::find_by_id(&conn, &id).expect("query").expect("row");
    assert!(row.is_live());
    // Publishing twice finds no remaining draft row.
    assert!(!unifier.publish(user_id, &id).expect("republish"));
}

#[test]
fn delete_clears_slot_only_when_linked() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "kate");
    let (cache, unifier) = make_unifier(&pool);

    let unrelated = seed_db_draft(&pool, user_id, "Unrelated");
    put_local_slot(&cache, user_id, "Still Here", None);

    assert!(unifier.delete_draft(user_id, &unrelated).expect("delete"));
    assert!(cache.get(&slot_key(user_id)).is_some());

    let linked = seed_db_draft(&pool, user_id, "Linked");
    put_local_slot(&cache, user_id, "Linked", Some(&linked));
    assert!(unifier.delete_draft(user_id, &linked).expect("delete linked"));
    assert!(cache.get(&slot_key(user_id)).is_none());
}

#[test]
fn overlapping_loads_are_a_no_op_not_a_crash() {
    let (_dir, pool) = setup_test_pool();
    let user_id = create_user(&pool, "liam");
    let (cache, unifier) = make_unifier(&pool);
    put_local_slot(&cache, user_id, "Contended", None);

    let unifier = Arc::new(unifier);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let u = unifier.clone();
        handles.push(std::thread::spawn(move || u.load_all(user_id).is_some()));
    }
    let completed: usize = handles
        .into_iter()
        .map(|h| h.join().expect("thread") as usize)
        .sum();

    // At least one load wins; overlapping calls may observe the guard and
    // back off, but none may fail or panic.
    assert!(completed >= 1);

    // After the burst, a fresh load proceeds normally.
    assert!(unifier.load_all(user_id).is_some());
}
