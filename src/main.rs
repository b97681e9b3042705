use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::middleware::{DefaultHeaders, ErrorHandlers, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use rand::{distributions::Alphanumeric, Rng};
use sharehub::db::{get_db_pool, init_db};
use sharehub::middleware::ClientCtx;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    init_our_mods();
    init_db(std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.")).await;

    // Converge the database to its seeded baseline (default categories,
    // admin account). Safe to rerun on every boot.
    sharehub::seed::ensure_defaults(get_db_pool())
        .await
        .expect("Startup seeding failed.");

    // Background delivery of queued emails.
    sharehub::outbox::spawn_delivery_task();

    let secret_key = match std::env::var("SECRET_KEY") {
        Ok(key) => Key::from(key.as_bytes()),
        Err(err) => {
            let random_string: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(128)
                .map(char::from)
                .collect();
            log::warn!(
                "SECRET_KEY was not usable ({:?}); using a random key, so session cookies will not survive a restart. Keys must be at least 64 bytes. Suggestion:\r\n{}",
                err,
                random_string
            );
            Key::from(random_string.as_bytes())
        }
    };

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(Data::new(get_db_pool()))
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::BAD_REQUEST, sharehub::web::error::render_400)
                    .handler(StatusCode::NOT_FOUND, sharehub::web::error::render_404)
                    .handler(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        sharehub::web::error::render_500,
                    ),
            )
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(false) // Allow HTTP for development
                    .session_lifecycle(PersistentSession::default())
                    .build(),
            )
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(sharehub::web::configure)
    })
    .bind("0.0.0.0:8080")?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // This should be calls to crates without any transformative work applied.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Initialize all local mods.
/// Panics
fn init_our_mods() {
    // This should be a list of simple function calls.
    // Each module should work mostly independent of others.
    // This way, we can unit test individual modules without loading the entire application.
    sharehub::app_config::init();
    sharehub::session::init();
    sharehub::storage::init();
}
