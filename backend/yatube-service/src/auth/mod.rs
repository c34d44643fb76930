/// Authentication for yatube-service
///
/// Provides password hashing, signed session cookies and the request
/// extractors handlers use to learn who is calling:
/// - `CurrentUser`: the logged-in user, if any
/// - `LoginRequired`: the logged-in user, or a redirect to the login page
pub mod password;
pub mod session;

pub use password::{hash_password, password_problems, verify_password};
pub use session::{Claims, SessionKeys};

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use actix_web::{
    dev::Payload, error::InternalError, http::header, web, FromRequest, HttpRequest, HttpResponse,
};
use futures::future::LocalBoxFuture;
use tracing::debug;

pub const LOGIN_URL: &str = "/auth/login/";

/// User resolved from the session cookie; `None` for anonymous visitors.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

/// User that must be logged in
///
/// Anonymous requests are answered with a 302 to the login page carrying
/// the requested path in `next`.
#[derive(Debug, Clone)]
pub struct LoginRequired(pub User);

async fn resolve_user(req: &HttpRequest) -> Result<Option<User>, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state is not configured".into()))?;

    let Some(cookie) = req.cookie(state.sessions.cookie_name()) else {
        return Ok(None);
    };

    let claims = match state.sessions.verify(cookie.value()) {
        Ok(claims) => claims,
        Err(err) => {
            debug!(error = %err, "ignoring invalid session cookie");
            return Ok(None);
        }
    };

    let Some(user_id) = claims.user_id() else {
        return Ok(None);
    };

    // a deleted account leaves a dangling cookie behind
    let user = state.store.find_user(user_id).await?;
    Ok(user.filter(|u| u.username == claims.username))
}

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(CurrentUser(resolve_user(&req).await?)) })
    }
}

impl FromRequest for LoginRequired {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match resolve_user(&req).await? {
                Some(user) => Ok(LoginRequired(user)),
                None => {
                    let path = req
                        .uri()
                        .path_and_query()
                        .map(|pq| pq.as_str())
                        .unwrap_or("/");
                    let response = HttpResponse::Found()
                        .insert_header((header::LOCATION, login_redirect(path)))
                        .finish();
                    Err(InternalError::from_response("login required", response).into())
                }
            }
        })
    }
}

/// Login page URL that returns to `path` afterwards
pub fn login_redirect(path: &str) -> String {
    format!(
        "{}?next={}",
        LOGIN_URL,
        urlencoding::encode(path).replace("%2F", "/")
    )
}

/// Accept only local absolute paths as a post-login target
pub fn safe_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    // browsers drop tabs and newlines, so "/\t/host" would become "//host"
    if next.chars().any(|c| c.is_ascii_control()) {
        return None;
    }
    let local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.contains("://");
    local.then(|| next.to_string())
}
