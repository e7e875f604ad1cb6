use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::auth::{csrf, password, rate_limit::RateLimiter, validate};
use crate::db::DbPool;
use crate::drafts::migration;
use crate::drafts::unifier::DraftUnifier;
use crate::errors::{AppError, render};
use crate::models::user;
use crate::templates_structs::{LoginTemplate, RegisterTemplate, app_name};

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub display_name: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

pub async fn login_page(session: Session) -> Result<HttpResponse, AppError> {
    // If already logged in, redirect to dashboard
    if session.get::<i64>("user_id").unwrap_or(None).is_some() {
        return Ok(HttpResponse::SeeOther()
            .insert_header(("Location", "/dashboard"))
            .finish());
    }

    let csrf_token = csrf::get_or_create_token(&session);
    let tmpl = LoginTemplate {
        error: None,
        app_name: app_name(),
        csrf_token,
    };
    render(tmpl)
}

fn login_error(session: &Session, message: &str) -> Result<HttpResponse, AppError> {
    let csrf_token = csrf::get_or_create_token(session);
    let tmpl = LoginTemplate {
        error: Some(message.to_string()),
        app_name: app_name(),
        csrf_token,
    };
    render(tmpl)
}

pub async fn login_submit(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    unifier: web::Data<DraftUnifier>,
    session: Session,
    form: web::Form<LoginForm>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    // Rate-limit check BEFORE any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or_else(|| std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        return login_error(&session, "Too many failed login attempts. Please try again later.");
    }

    let conn = pool.get()?;
    let found = user::find_by_username(&conn, &form.username)?;

    let Some(u) = found else {
        limiter.record_failure(ip);
        return login_error(&session, "Invalid username or password");
    };

    match password::verify_password(&form.password, &u.password) {
        Ok(true) => {
            limiter.clear(ip);

            let _ = session.insert("user_id", u.id);
            let _ = session.insert("username", &u.username);

            // One-time sweep of legacy draft blobs into the unified store.
            let report = migration::migrate_legacy_drafts(&unifier, u.id);
            if report.migrated > 0 || !report.errors.is_empty() {
                log::info!(
                    "Draft migration for {}: migrated={}, errors={}",
                    u.username,
                    report.migrated,
                    report.errors.len()
                );
            }

            Ok(HttpResponse::SeeOther()
                .insert_header(("Location", "/dashboard"))
                .finish())
        }
        _ => {
            limiter.record_failure(ip);
            login_error(&session, "Invalid username or password")
        }
    }
}

pub async fn register_page(session: Session) -> Result<HttpResponse, AppError> {
    if session.get::<i64>("user_id").unwrap_or(None).is_some() {
        return Ok(HttpResponse::SeeOther()
            .insert_header(("Location", "/dashboard"))
            .finish());
    }

    let csrf_token = csrf::get_or_create_token(&session);
    let tmpl = RegisterTemplate {
        errors: vec![],
        app_name: app_name(),
        csrf_token,
    };
    render(tmpl)
}

pub async fn register_submit(
    pool: web::Data<DbPool>,
    session: Session,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let mut errors: Vec<String> = vec![];
    errors.extend(validate::validate_username(&form.username));
    errors.extend(validate::validate_email(&form.email));
    errors.extend(validate::validate_password(&form.password));
    errors.extend(validate::validate_optional(&form.display_name, "Display name", 100));
    if form.password != form.confirm_password {
        errors.push("Passwords do not match".to_string());
    }

    let conn = pool.get()?;
    if errors.is_empty() && user::find_by_username(&conn, form.username.trim())?.is_some() {
        errors.push("Username is already taken".to_string());
    }

    if !errors.is_empty() {
        let csrf_token = csrf::get_or_create_token(&session);
        let tmpl = RegisterTemplate {
            errors,
            app_name: app_name(),
            csrf_token,
        };
        return render(tmpl);
    }

    let hash = password::hash_password(&form.password)?;
    let new_user = user::NewUser {
        username: form.username.trim().to_string(),
        password: hash,
        email: form.email.trim().to_string(),
        display_name: form.display_name.trim().to_string(),
    };
    let user_id = user::create(&conn, &new_user)?;

    let _ = session.insert("user_id", user_id);
    let _ = session.insert("username", &new_user.username);
    let _ = session.insert("flash", "Welcome to OrangeCat!");

    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/dashboard"))
        .finish())
}

pub async fn logout(session: Session, form: web::Form<CsrfOnly>) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    session.purge();
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/login"))
        .finish())
}
