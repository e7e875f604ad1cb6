use rusqlite::{Connection, params};
use uuid::Uuid;

use super::types::{Campaign, CampaignFields};
use crate::db::now_iso;

const SELECT_CAMPAIGN: &str = "\
    SELECT id, user_id, title, description, bitcoin_address, lightning_address, \
           website_url, goal_amount, category, currency, is_active, is_public, \
           total_funding, contributor_count, created_at, updated_at \
    FROM funding_pages";

fn row_to_campaign(row: &rusqlite::Row) -> rusqlite::Result<Campaign> {
    Ok(Campaign {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        bitcoin_address: row.get("bitcoin_address")?,
        lightning_address: row.get("lightning_address")?,
        website_url: row.get("website_url")?,
        goal_amount: row.get("goal_amount")?,
        category: row.get("category")?,
        currency: row.get("currency")?,
        is_active: row.get("is_active")?,
        is_public: row.get("is_public")?,
        total_funding: row.get("total_funding")?,
        contributor_count: row.get("contributor_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// All draft rows owned by a user, newest first. The sort key is explicit
/// and total: updated_at descending, id descending as tie-break.
pub fn find_drafts_by_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Campaign>> {
    let sql = format!(
        "{SELECT_CAMPAIGN} WHERE user_id = ?1 AND is_active = 0 AND is_public = 0 \
         ORDER BY updated_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id], row_to_campaign)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All pages owned by a user regardless of status, newest first.
pub fn find_by_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Campaign>> {
    let sql = format!(
        "{SELECT_CAMPAIGN} WHERE user_id = ?1 ORDER BY updated_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id], row_to_campaign)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Publicly browsable campaigns (live pages), newest first.
pub fn find_public(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<Campaign>> {
    let sql = format!(
        "{SELECT_CAMPAIGN} WHERE is_active = 1 AND is_public = 1 \
         ORDER BY updated_at DESC, id DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![limit], row_to_campaign)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Campaign>> {
    let sql = format!("{SELECT_CAMPAIGN} WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id], row_to_campaign)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Create a new draft row with a server-assigned UUID. The row starts
/// unpublished; publishing later flips the flags in place.
pub fn create_draft(
    conn: &Connection,
    user_id: i64,
    fields: &CampaignFields,
) -> rusqlite::Result<String> {
    let id = Uuid::new_v4().to_string();
    let title = if fields.title.is_empty() {
        "Untitled Draft".to_string()
    } else {
        fields.title.clone()
    };
    conn.execute(
        "INSERT INTO funding_pages \
         (id, user_id, title, description, bitcoin_address, lightning_address, \
          website_url, goal_amount, category, is_active, is_public) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, 0)",
        params![
            id,
            user_id,
            title,
            fields.description,
            fields.bitcoin_address,
            fields.lightning_address,
            fields.website_url,
            fields.goal_amount,
            fields.category,
        ],
    )?;
    Ok(id)
}

/// Update an existing draft row. The user_id predicate is part of every
/// mutation; ownership is enforced at the statement level.
/// Returns false if no row matched.
pub fn update_draft(
    conn: &Connection,
    user_id: i64,
    id: &str,
    fields: &CampaignFields,
) -> rusqlite::Result<bool> {
    let title = if fields.title.is_empty() {
        "Untitled Draft".to_string()
    } else {
        fields.title.clone()
    };
    let changed = conn.execute(
        "UPDATE funding_pages SET title = ?1, description = ?2, bitcoin_address = ?3, \
         lightning_address = ?4, website_url = ?5, goal_amount = ?6, category = ?7, \
         updated_at = ?8 \
         WHERE id = ?9 AND user_id = ?10 AND is_active = 0 AND is_public = 0",
        params![
            title,
            fields.description,
            fields.bitcoin_address,
            fields.lightning_address,
            fields.website_url,
            fields.goal_amount,
            fields.category,
            now_iso(),
            id,
            user_id,
        ],
    )?;
    Ok(changed > 0)
}

/// Promote a draft to a live page. Returns false if no draft matched.
pub fn publish(conn: &Connection, user_id: i64, id: &str) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE funding_pages SET is_active = 1, is_public = 1, updated_at = ?1 \
         WHERE id = ?2 AND user_id = ?3 AND is_active = 0 AND is_public = 0",
        params![now_iso(), id, user_id],
    )?;
    Ok(changed > 0)
}

/// Delete a page owned by the user. Returns false if no row matched.
pub fn delete(conn: &Connection, user_id: i64, id: &str) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "DELETE FROM funding_pages WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(changed > 0)
}
