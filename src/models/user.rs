use rusqlite::{Connection, params};

/// Internal user record including the password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub display_name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub display_name: String,
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password: row.get("password")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Find user by username for authentication. Returns the record with its
/// password hash.
pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password, email, display_name, created_at, updated_at \
         FROM users WHERE username = ?1",
    )?;
    let mut rows = stmt.query_map(params![username], row_to_user)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password, email, display_name, created_at, updated_at \
         FROM users WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id], row_to_user)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Create a new user. Fails on duplicate username (UNIQUE constraint).
pub fn create(conn: &Connection, new: &NewUser) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (username, password, email, display_name) \
         VALUES (?1, ?2, ?3, ?4)",
        params![new.username, new.password, new.email, new.display_name],
    )?;
    Ok(conn.last_insert_rowid())
}
