use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, MemoryStore as SessionMemoryStore, SessionManagerLayer};

use crate::config::AppConfig;
use crate::database::{ContactStore, MemoryStore, PgStore, UserStore};
use crate::handlers::{accounts, contacts, health, not_found};
use crate::middleware::require_auth;

/// Shared handler state. Stores are trait objects so the same router runs
/// against Postgres or the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub contacts: Arc<dyn ContactStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        contacts: Arc<dyn ContactStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            users,
            contacts,
        }
    }

    pub fn postgres(config: AppConfig, pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self::new(config, store.clone(), store)
    }

    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store)
    }
}

pub fn router(state: AppState) -> Router {
    let sessions = SessionManagerLayer::new(SessionMemoryStore::default())
        .with_secure(state.config.security.secure_cookies)
        .with_same_site(SameSite::Lax);

    Router::new()
        .merge(contact_routes(state.clone()))
        .merge(account_routes())
        .route("/health", get(health::health))
        .fallback(not_found)
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn contact_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(contacts::list))
        .route("/create/", get(contacts::create_form).post(contacts::create))
        .route("/update/{id}/", get(contacts::update_form).post(contacts::update))
        .route("/delete/{id}/", get(contacts::delete_confirm).post(contacts::delete))
        // route_layer: unmatched paths fall through to the 404 fallback
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/signup/", get(accounts::signup_form).post(accounts::signup))
        .route("/accounts/login/", get(accounts::login_form).post(accounts::login))
        .route("/accounts/logout/", post(accounts::logout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::in_memory(AppConfig::development()))
    }

    #[tokio::test]
    async fn gated_routes_redirect_to_login() {
        for uri in ["/", "/create/", "/update/1/", "/delete/abc/"] {
            let res = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::SEE_OTHER, "{}", uri);
            let location = res.headers()[header::LOCATION].to_str().unwrap();
            assert!(location.starts_with("/accounts/login/?next="), "{}", location);
        }
    }

    #[tokio::test]
    async fn public_routes_are_open() {
        for uri in ["/accounts/login/", "/accounts/signup/", "/health"] {
            let res = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn unknown_path_is_not_found_even_when_anonymous() {
        let res = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
