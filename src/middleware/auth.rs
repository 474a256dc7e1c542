use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::cookie::{Cookie, SameSite};
use url::form_urlencoded;

use crate::app::AppState;
use crate::auth::{generate_jwt, validate_jwt, Claims};
use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::error::AppError;

/// Name of the cookie holding the signed session token
pub const AUTH_COOKIE: &str = "contact_book_auth";

pub const LOGIN_PATH: &str = "/accounts/login/";

/// The logged-in user, inserted into request extensions by `require_auth`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Gate for owner-scoped routes. Anonymous requests are redirected to the
/// login page before any contact query runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()).await {
        Ok(Some(user)) => {
            tracing::debug!("Authenticated request for user '{}' ({})", user.username, user.id);
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => redirect_to_login(request.uri()),
        Err(err) => err.into_response(),
    }
}

/// Resolve the auth cookie to a user.
///
/// Missing, malformed, expired or stale tokens all yield `Ok(None)`; only a
/// store failure is an error.
pub async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<CurrentUser>, AppError> {
    let Some(token) = read_cookie(headers, AUTH_COOKIE) else {
        return Ok(None);
    };

    let claims = match validate_jwt(&token, &state.config.security) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Ignoring session token: {}", e);
            return Ok(None);
        }
    };

    let user = state.users.find_by_id(claims.sub).await.map_err(|e| {
        tracing::error!("Failed to load user {} for session: {}", claims.sub, e);
        AppError::internal_server_error("Failed to validate session")
    })?;

    // Tokens of deleted or renamed accounts no longer count
    match user {
        Some(user) if user.username == claims.username => Ok(Some(CurrentUser::from(&user))),
        Some(user) => {
            tracing::warn!(
                "Session token username '{}' does not match user {} ('{}')",
                claims.username,
                user.id,
                user.username
            );
            Ok(None)
        }
        None => {
            tracing::warn!("Session token references unknown user {}", claims.sub);
            Ok(None)
        }
    }
}

/// `303` to the login page, carrying the requested path in `next`
pub fn redirect_to_login(uri: &Uri) -> Response {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Redirect::to(&login_url(next)).into_response()
}

pub fn login_url(next: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{}?{}", LOGIN_PATH, query)
}

/// Sign a token for `user` and wrap it in a `Set-Cookie` value
pub fn session_cookie(user: &User, security: &SecurityConfig) -> Result<HeaderValue, AppError> {
    let token = generate_jwt(&Claims::new(user, security), security)?;
    let cookie = Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(security.secure_cookies)
        .build();
    header_value(cookie)
}

/// `Set-Cookie` value that removes the auth cookie
pub fn clear_session_cookie() -> Result<HeaderValue, AppError> {
    let mut cookie = Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    header_value(cookie)
}

fn header_value(cookie: Cookie<'_>) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&cookie.to_string()).map_err(|e| {
        tracing::error!("Invalid cookie header: {}", e);
        AppError::internal_server_error("Could not establish a session")
    })
}

fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
