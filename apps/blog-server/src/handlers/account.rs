//! Account views: registration, login and logout.

use actix_web::{HttpResponse, web};

use yablog_core::domain::User;
use yablog_core::error::RepoError;
use yablog_core::ports::BaseRepository;
use yablog_core::forms::{
    FormErrors, MSG_DUPLICATE_EMAIL, MSG_DUPLICATE_USERNAME, MSG_INVALID_LOGIN, NON_FIELD_ERRORS,
    validate_login, validate_registration,
};
use yablog_shared::dto::{LoginForm, NextQuery, RegisterForm, local_path};

use super::{html, see_other};
use crate::middleware::auth::{OptionalIdentity, removal_cookie, session_cookie};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::pages::{LoginPage, RegisterPage, TitledPage, messages, non_field_messages};

const DEFAULT_REDIRECT: &str = "/blog/";

fn render_register(state: &AppState, form: &RegisterForm, errors: Option<&FormErrors>) -> HttpResponse {
    let view = RegisterPage {
        username: form.username.clone(),
        email: form.email.clone(),
        non_field_errors: non_field_messages(errors),
        username_errors: messages(errors, "username"),
        email_errors: messages(errors, "email"),
        password1_errors: messages(errors, "password1"),
        password2_errors: messages(errors, "password2"),
    };

    html(state.templates.render(&state.templates.register, "Register", None, &view))
}

fn render_login(
    state: &AppState,
    username: &str,
    next: Option<&str>,
    errors: Option<&FormErrors>,
) -> HttpResponse {
    let view = LoginPage {
        username: username.to_string(),
        next: next.unwrap_or_default().to_string(),
        non_field_errors: non_field_messages(errors),
        username_errors: messages(errors, "username"),
        password_errors: messages(errors, "password"),
    };

    html(state.templates.render(&state.templates.login, "Log in", None, &view))
}

/// Set the session cookie for `user` and redirect to `location`.
fn start_session(state: &AppState, user: &User, location: &str) -> AppResult<HttpResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, &user.email)?;
    let cookie = session_cookie(
        token,
        state.tokens.expiration_seconds(),
        state.site.cookie_secure,
    );

    let mut response = see_other(location);
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

/// GET /account/register/
pub async fn register_form(state: web::Data<AppState>) -> HttpResponse {
    render_register(&state, &RegisterForm::default(), None)
}

/// POST /account/register/ - create the account and log it in.
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let registration = match validate_registration(
        &form.username,
        &form.email,
        &form.password1,
        &form.password2,
    ) {
        Ok(registration) => registration,
        Err(errors) => return Ok(render_register(&state, &form, Some(&errors))),
    };

    let mut errors = FormErrors::new();
    if state
        .users
        .find_by_username(&registration.username)
        .await?
        .is_some()
    {
        errors.add("username", MSG_DUPLICATE_USERNAME);
    }
    if state
        .users
        .find_by_email(&registration.email)
        .await?
        .is_some()
    {
        errors.add("email", MSG_DUPLICATE_EMAIL);
    }
    if !errors.is_empty() {
        return Ok(render_register(&state, &form, Some(&errors)));
    }

    let password_hash = state.passwords.hash(&registration.password)?;
    let user = User::new(registration.username, registration.email, password_hash);

    let user = match state.users.save(user).await {
        Ok(user) => user,
        // Lost a race with a concurrent registration.
        Err(RepoError::Constraint(_)) => {
            errors.add(NON_FIELD_ERRORS, "A user with that username or email already exists.");
            return Ok(render_register(&state, &form, Some(&errors)));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "User registered");
    start_session(&state, &user, DEFAULT_REDIRECT)
}

/// GET /account/login/
pub async fn login_form(
    state: web::Data<AppState>,
    query: web::Query<NextQuery>,
) -> HttpResponse {
    render_login(&state, "", query.local_path(), None)
}

/// POST /account/login/ - verify credentials and redirect to `next`.
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let next = local_path(form.next.as_deref());

    let credentials = match validate_login(&form.username, &form.password) {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(render_login(&state, &form.username, next, Some(&errors))),
    };

    let user = state.users.find_by_username(&credentials.username).await?;
    let verified = match &user {
        Some(user) => state
            .passwords
            .verify(&credentials.password, &user.password_hash)?,
        None => {
            // Keep the response time of unknown usernames close to a wrong password.
            let _ = state.passwords.hash(&credentials.password);
            false
        }
    };

    match user.filter(|_| verified) {
        Some(user) => {
            tracing::info!(user_id = %user.id, "User logged in");
            start_session(&state, &user, next.unwrap_or(DEFAULT_REDIRECT))
        }
        None => {
            tracing::info!("Failed login attempt");
            let mut errors = FormErrors::new();
            errors.add(NON_FIELD_ERRORS, MSG_INVALID_LOGIN);
            Ok(render_login(&state, &form.username, next, Some(&errors)))
        }
    }
}

/// POST /account/logout/
pub async fn logout(state: web::Data<AppState>, identity: OptionalIdentity) -> AppResult<HttpResponse> {
    if let Some(identity) = &identity.0 {
        tracing::info!(user_id = %identity.user_id, "User logged out");
    }

    let page = TitledPage { title: "Logged out" };
    let mut response = html(state.templates.render(
        &state.templates.logged_out,
        "Logged out",
        None,
        &page,
    ));
    response
        .add_removal_cookie(&removal_cookie())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

/// GET /account/confirm_logout/
pub async fn confirm_logout(state: web::Data<AppState>, identity: OptionalIdentity) -> HttpResponse {
    let page = TitledPage { title: "Log out" };
    html(state.templates.render(
        &state.templates.confirm_logout,
        "Log out",
        identity.0.as_ref(),
        &page,
    ))
}
