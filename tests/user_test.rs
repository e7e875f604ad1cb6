//! User model tests — registration, lookup, duplicate usernames, and
//! password verification.

mod common;

use common::*;
use orangecat::auth::password;
use orangecat::models::user;

#[test]
fn create_and_find_user() {
    let (_dir, pool) = setup_test_pool();
    let id = create_user(&pool, "walter");
    assert!(id > 0);

    let conn = pool.get().expect("conn");
    let found = user::find_by_username(&conn, "walter")
        .expect("query")
        .expect("user");
    assert_eq!(found.id, id);
    assert_eq!(found.email, "walter@example.com");

    let by_id = user::find_by_id(&conn, id).expect("query").expect("user");
    assert_eq!(by_id.username, "walter");
}

#[test]
fn duplicate_username_is_rejected() {
    let (_dir, pool) = setup_test_pool();
    create_user(&pool, "xena");

    let conn = pool.get().expect("conn");
    let result = user::create(
        &conn,
        &user::NewUser {
            username: "xena".to_string(),
            password: "hash".to_string(),
            email: "other@example.com".to_string(),
            display_name: String::new(),
        },
    );
    assert!(result.is_err(), "Should fail on duplicate username");
}

#[test]
fn stored_hash_verifies_the_password() {
    let (_dir, pool) = setup_test_pool();
    create_user(&pool, "yuri");

    let conn = pool.get().expect("conn");
    let u = user::find_by_username(&conn, "yuri")
        .expect("query")
        .expect("user");

    assert!(password::verify_password(TEST_PASSWORD, &u.password).expect("verify"));
    assert!(!password::verify_password("wrong-password", &u.password).expect("verify"));
}

