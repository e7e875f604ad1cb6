//! Shared test infrastructure: tempfile-backed SQLite pools and seed users.

use r2d2_sqlite::SqliteConnectionManager;
use tempfile::TempDir;

use orangecat::auth::password;
use orangecat::db::{DbPool, MIGRATIONS};
use orangecat::models::user;

pub const TEST_PASSWORD: &str = "password123";

/// Setup a test database pool with the schema applied.
///
/// Returns a tuple of (TempDir, DbPool) where TempDir must be kept
/// alive for the pool to remain valid.
pub fn setup_test_pool() -> (TempDir, DbPool) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");

    let manager = SqliteConnectionManager::file(&db_path).with_init(|conn| {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(())
    });
    let pool = r2d2::Pool::builder()
        .max_size(4)
        .build(manager)
        .expect("Failed to create test pool");

    let conn = pool.get().expect("Failed to get test connection");
    conn.execute_batch(MIGRATIONS).expect("Failed to run migrations");

    (dir, pool)
}

/// Create a user and return its id.
pub fn create_user(pool: &DbPool, username: &str) -> i64 {
    let conn = pool.get().expect("Failed to get test connection");
    let hash = password::hash_password(TEST_PASSWORD).expect("Failed to hash password");
    user::create(
        &conn,
        &user::NewUser {
            username: username.to_string(),
            password: hash,
            email: format!("{username}@example.com"),
            display_name: username.to_string(),
        },
    )
    .expect("Failed to create user")
}
