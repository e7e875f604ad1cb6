use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use orangecat::auth;
use orangecat::db;
use orangecat::drafts::store::{DraftCache, FileCache};
use orangecat::drafts::unifier::DraftUnifier;
use orangecat::handlers;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Ensure data directory exists
    std::fs::create_dir_all("data").expect("Failed to create data directory");

    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/orangecat.db".to_string());
    let pool = db::init_pool(&database_path);
    db::run_migrations(&pool);

    // Device-local draft slots, persisted next to the database.
    let cache: Arc<dyn DraftCache> = Arc::new(FileCache::open("data/draft_cache.json"));
    let unifier = Arc::new(DraftUnifier::new(pool.clone(), cache));

    let limiter = auth::rate_limit::RateLimiter::new();

    // Session encryption key — load from SESSION_KEY env var for persistent sessions across restarts
    let secret_key = match std::env::var("SESSION_KEY") {
        Ok(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Ok(val) => {
            log::warn!(
                "SESSION_KEY too short ({} bytes, need 64+) — generating random key",
                val.len()
            );
            Key::generate()
        }
        Err(_) => {
            log::warn!("No SESSION_KEY set — generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        let session_mw =
            SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                .cookie_secure(false)
                .cookie_http_only(true)
                .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::from(unifier.clone()))
            .app_data(web::Data::new(limiter.clone()))
            // Static files
            .service(actix_files::Files::new("/static", "./static"))
            // Public routes
            .route("/login", web::get().to(handlers::auth_handlers::login_page))
            .route("/login", web::post().to(handlers::auth_handlers::login_submit))
            .route("/register", web::get().to(handlers::auth_handlers::register_page))
            .route("/register", web::post().to(handlers::auth_handlers::register_submit))
            .route("/campaigns", web::get().to(handlers::campaign_handlers::browse))
            .route("/campaigns/{id}", web::get().to(handlers::campaign_handlers::detail))
            // Root redirect
            .route(
                "/",
                web::get().to(|| async {
                    actix_web::HttpResponse::SeeOther()
                        .insert_header(("Location", "/campaigns"))
                        .finish()
                }),
            )
            // Protected routes
            .service(
                web::scope("")
                    .wrap(actix_web::middleware::from_fn(auth::middleware::require_auth))
                    .route("/dashboard", web::get().to(handlers::dashboard::index))
                    .route("/logout", web::post().to(handlers::auth_handlers::logout))
                    .route("/drafts", web::get().to(handlers::campaign_handlers::drafts))
                    // Draft JSON API
                    .route("/api/drafts", web::get().to(handlers::draft_api::list))
                    .route("/api/drafts/save", web::post().to(handlers::draft_api::save))
                    .route("/api/drafts/autosave", web::post().to(handlers::draft_api::autosave))
                    .route(
                        "/api/drafts/clear-local",
                        web::post().to(handlers::draft_api::clear_local),
                    )
                    .route("/api/drafts/migrate", web::post().to(handlers::draft_api::migrate))
                    .route(
                        "/api/drafts/{id}/publish",
                        web::post().to(handlers::draft_api::publish),
                    )
                    .route(
                        "/api/drafts/{id}/delete",
                        web::post().to(handlers::draft_api::delete),
                    ),
            )
            // Default 404 handler (must be registered last)
            .default_service(web::to(|| async {
                let html = include_str!("../templates/errors/404.html");
                actix_web::HttpResponse::NotFound()
                    .content_type("text/html; charset=utf-8")
                    .body(html)
            }))
    })
    .bind(bind_addr)?
    .run()
    .await
}
