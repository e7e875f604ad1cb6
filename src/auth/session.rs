use actix_session::Session;

use crate::drafts::state::AuthContext;

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

pub fn get_username(session: &Session) -> Result<String, String> {
    match session.get::<String>("username") {
        Ok(Some(username)) => Ok(username),
        Ok(None) => Err("No username in session".to_string()),
        Err(e) => Err(format!("Session error: {}", e)),
    }
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>("flash").unwrap_or(None);
    if flash.is_some() {
        session.remove("flash");
    }
    flash
}

/// Auth context for the draft subsystem. A cookie session that has been
/// read at all is hydrated; the user id may still be absent.
pub fn auth_context(session: &Session) -> AuthContext {
    AuthContext {
        user_id: get_user_id(session),
        hydrated: true,
    }
}
