// handlers/accounts.rs - signup, login and logout
//
// A successful signup or login sets the signed auth cookie (see
// middleware::auth) and redirects; failures re-render the form with errors.

use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use thiserror::Error;
use tower_sessions::Session;
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::auth::{hash_password_blocking, verify_password_blocking, PasswordError};
use crate::database::{models::User, DatabaseError};
use crate::error::AppError;
use crate::forms::{
    login::{safe_next, INVALID_LOGIN_MESSAGE},
    signup::DUPLICATE_USERNAME_MESSAGE,
    FormErrors, LoginForm, NewAccount, SignupForm,
};
use crate::middleware::{auth::clear_session_cookie, auth::session_cookie, Flash, LOGIN_PATH};
use crate::views::{self, PageContext};

/// GET /accounts/signup/
pub async fn signup_form(State(state): State<AppState>, session: Session) -> Response {
    let flash = Flash::new(session);
    render_signup(&state, &flash, &SignupForm::default(), &FormErrors::default()).await
}

/// POST /accounts/signup/ - create the account, log it in, go to the contact list
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    let flash = Flash::new(session);

    let account = match form.validate(state.config.security.min_password_length) {
        Ok(account) => account,
        Err(errors) => return render_signup(&state, &flash, &form, &errors).await,
    };

    match state.users.find_by_username(&account.username).await {
        Ok(None) => {}
        Ok(Some(_)) => return duplicate_username(&state, &flash, &form).await,
        Err(e) => {
            error!("Failed to check username '{}': {}", account.username, e);
            flash.error(format!("Signup failed: {}", e)).await;
            return render_signup(&state, &flash, &form, &FormErrors::default()).await;
        }
    }

    match register(&state, &account).await {
        Ok(user) => match session_cookie(&user, &state.config.security) {
            Ok(cookie) => {
                info!("Registered user '{}' ({})", user.username, user.id);
                flash.success("Signup successful.").await;
                ([(SET_COOKIE, cookie)], Redirect::to("/")).into_response()
            }
            Err(e) => {
                error!("Session for new user '{}' failed: {}", user.username, e);
                flash.error(format!("Signup failed: {}", e)).await;
                render_signup(&state, &flash, &form, &FormErrors::default()).await
            }
        },
        // Lost a race with a concurrent signup for the same name
        Err(SignupError::Database(DatabaseError::Conflict(_))) => {
            duplicate_username(&state, &flash, &form).await
        }
        Err(e) => {
            error!("Signup for '{}' failed: {}", account.username, e);
            flash.error(format!("Signup failed: {}", e)).await;
            render_signup(&state, &flash, &form, &FormErrors::default()).await
        }
    }
}

#[derive(Debug, Error)]
enum SignupError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

async fn register(state: &AppState, account: &NewAccount) -> Result<User, SignupError> {
    let hash = hash_password_blocking(account.password.clone()).await?;
    Ok(state.users.create_user(&account.username, &hash).await?)
}

async fn duplicate_username(state: &AppState, flash: &Flash, form: &SignupForm) -> Response {
    let mut errors = FormErrors::default();
    errors.add("username", DUPLICATE_USERNAME_MESSAGE);
    render_signup(state, flash, form, &errors).await
}

async fn render_signup(
    state: &AppState,
    flash: &Flash,
    form: &SignupForm,
    errors: &FormErrors,
) -> Response {
    let messages = flash.take().await;
    let ctx = PageContext::new("Sign up", None, &messages);
    views::accounts::signup_page(&ctx, form, errors, state.config.security.min_password_length)
        .into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// GET /accounts/login/
pub async fn login_form(session: Session, Query(query): Query<LoginQuery>) -> Response {
    let flash = Flash::new(session);
    let form = LoginForm {
        next: query.next,
        ..LoginForm::default()
    };
    render_login(&flash, &form, &FormErrors::default()).await
}

/// POST /accounts/login/ - check credentials, then redirect to `next` or the list
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let flash = Flash::new(session);

    if let Err(errors) = form.validate() {
        return render_login(&flash, &form, &errors).await;
    }

    let user = match check_credentials(&state, form.username.trim(), &form.password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Failed login for '{}'", form.username.trim());
            let mut errors = FormErrors::default();
            errors.add_non_field(INVALID_LOGIN_MESSAGE);
            return render_login(&flash, &form, &errors).await;
        }
        Err(e) => {
            error!("Login for '{}' failed: {}", form.username.trim(), e);
            flash.error(format!("Login failed: {}", e)).await;
            return render_login(&flash, &form, &FormErrors::default()).await;
        }
    };

    let cookie = match session_cookie(&user, &state.config.security) {
        Ok(cookie) => cookie,
        Err(e) => return e.into_response(),
    };
    info!("User '{}' ({}) logged in", user.username, user.id);

    let target = safe_next(form.next.as_deref()).unwrap_or("/");
    ([(SET_COOKIE, cookie)], Redirect::to(target)).into_response()
}

/// `Ok(None)` for an unknown username or a wrong password
async fn check_credentials(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = state.users.find_by_username(username).await? else {
        return Ok(None);
    };
    let valid = verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
    Ok(valid.then_some(user))
}

async fn render_login(flash: &Flash, form: &LoginForm, errors: &FormErrors) -> Response {
    let messages = flash.take().await;
    let ctx = PageContext::new("Log in", None, &messages);
    views::accounts::login_page(&ctx, form, errors).into_response()
}

/// POST /accounts/logout/ - drop the auth cookie and return to the login page
pub async fn logout(session: Session) -> Response {
    let flash = Flash::new(session);
    match clear_session_cookie() {
        Ok(cookie) => {
            flash.info("You have been logged out.").await;
            ([(SET_COOKIE, cookie)], Redirect::to(LOGIN_PATH)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
