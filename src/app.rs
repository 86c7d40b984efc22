use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    routing::{get, post, put},
};
use std::sync::Arc;
use time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

use crate::config::Config;
use crate::constants::SESSION_NAME;
use crate::database::Db;
use crate::{accounts, auth, categories, dashboard, transactions};

/// Shared by every handler. Holds no per-user state: the user is resolved
/// from the session on each request.
#[derive(Clone)]
pub struct AppState {
    pub main_db: Db,
    pub data_path: Arc<str>,
}

impl AppState {
    pub fn new(main_db: Db, data_path: &str) -> Self {
        AppState {
            main_db,
            data_path: Arc::from(data_path),
        }
    }
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// The route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route(
            "/accounts",
            get(accounts::get_accounts).post(accounts::create_account),
        )
        .route(
            "/accounts/{id}",
            put(accounts::edit_account).delete(accounts::remove_account),
        )
        .route(
            "/categories",
            get(categories::get_categories).post(categories::create_category),
        )
        .route(
            "/categories/{id}",
            put(categories::edit_category).delete(categories::remove_category),
        )
        .route(
            "/transactions",
            get(transactions::get_transactions).post(transactions::create_transaction),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get_transaction_by_id)
                .put(transactions::edit_transaction)
                .delete(transactions::remove_transaction),
        )
        .route("/dashboard", get(dashboard::get_dashboard))
}

pub fn build_router(state: AppState, config: &Config) -> anyhow::Result<Router> {
    let key = Key::try_from(config.session_secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid session secret: {}", e))?;

    // TODO: swap MemoryStore for a persistent store so sessions survive restarts
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.secure_cookies)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(
            config.session_expiry_days,
        )))
        .with_signed(key);

    let mut router = routes()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(origin) = &config.cors_allowed_origin {
        let origin = HeaderValue::from_str(origin)
            .map_err(|e| anyhow::anyhow!("invalid CORS origin {:?}: {}", origin, e))?;
        router = router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods(tower_http::cors::AllowMethods::mirror_request())
                .allow_headers(tower_http::cors::AllowHeaders::mirror_request()),
        );
    }

    Ok(router)
}
