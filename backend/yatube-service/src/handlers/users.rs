/// Account pages - signup, login and logout
use super::{base_context, redirect};
use crate::auth::{hash_password, safe_next, verify_password, CurrentUser};
use crate::error::{AppError, Result};
use crate::forms::{LoginForm, SignupForm, Submission};
use crate::metrics::{record_content_write, ContentWrite};
use crate::models::NewUser;
use crate::templates;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn render_signup(user: &CurrentUser, form: &SignupForm) -> Result<HttpResponse> {
    let mut ctx = base_context(user);
    ctx.insert("form", form);
    ctx.insert("fields", &form.fields());
    templates::page("users/signup.html", &ctx)
}

fn render_login(user: &CurrentUser, form: &LoginForm, next: &str) -> Result<HttpResponse> {
    let mut ctx = base_context(user);
    ctx.insert("form", form);
    ctx.insert("next", next);
    templates::page("users/login.html", &ctx)
}

pub async fn signup_form(user: CurrentUser) -> Result<HttpResponse> {
    render_signup(&user, &SignupForm::default())
}

/// Register an account and log it in
pub async fn signup(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let submission = Submission::read(&req, payload, state.media.max_upload_bytes()).await?;

    let input = match SignupForm::validate(&submission) {
        Ok(input) => input,
        Err(form) => return render_signup(&user, &form),
    };

    let taken = || {
        let form = SignupForm {
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            username: input.username.clone(),
            email: input.email.clone().unwrap_or_default(),
            ..SignupForm::default()
        };
        render_signup(&user, &form.with_username_taken())
    };

    if state
        .store
        .find_user_by_username(&input.username)
        .await?
        .is_some()
    {
        return taken();
    }

    let created = state
        .store
        .create_user(NewUser {
            username: input.username.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone().unwrap_or_default(),
            password_hash: hash_password(&input.password1)?,
        })
        .await;

    let account = match created {
        Ok(account) => account,
        // lost a race with another signup for the same name
        Err(AppError::Conflict(_)) => return taken(),
        Err(err) => return Err(err),
    };

    record_content_write(ContentWrite::UserSignedUp);
    info!(user_id = account.id, username = %account.username, "user signed up");

    let cookie = state.sessions.login_cookie(&account)?;
    let mut response = redirect("/");
    response.add_cookie(&cookie).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

pub async fn login_form(user: CurrentUser, query: web::Query<NextQuery>) -> Result<HttpResponse> {
    let next = query.next.clone().unwrap_or_default();
    render_login(&user, &LoginForm::default(), &next)
}

/// Check credentials, set the session cookie and follow `next`
pub async fn login(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let submission = Submission::read(&req, payload, state.media.max_upload_bytes()).await?;
    let query_next = web::Query::<NextQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().next);
    let next = submission
        .text("next")
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or(query_next)
        .unwrap_or_default();

    let input = match LoginForm::validate(&submission) {
        Ok(input) => input,
        Err(form) => return render_login(&user, &form, &next),
    };

    let account = state.store.find_user_by_username(&input.username).await?;
    let verified = match &account {
        Some(account) => verify_password(&input.password, &account.password_hash)?,
        None => false,
    };

    let account = match account {
        Some(account) if verified => account,
        _ => {
            warn!(username = %input.username, "failed login attempt");
            return render_login(&user, &LoginForm::rejected(&input.username), &next);
        }
    };

    info!(user_id = account.id, username = %account.username, "user logged in");

    let cookie = state.sessions.login_cookie(&account)?;
    let target = safe_next(Some(&next)).unwrap_or_else(|| "/".to_string());
    let mut response = redirect(target);
    response.add_cookie(&cookie).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

/// Clear the session cookie
pub async fn logout(state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse> {
    if let Some(account) = user.user() {
        info!(user_id = account.id, username = %account.username, "user logged out");
    }

    let mut response = templates::page("users/logged_out.html", &base_context(&CurrentUser(None)))?;
    response
        .add_cookie(&state.sessions.logout_cookie())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}
