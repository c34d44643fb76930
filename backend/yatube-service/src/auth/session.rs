/// Signed session tokens carried in a cookie
///
/// The token is an HS256 JWT; the cookie is HttpOnly and `SameSite=Lax`.
use crate::config::SessionConfig;
use crate::error::{AppError, Result};
use crate::models::User;
use actix_web::cookie::{time, Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
    cookie_name: String,
    cookie_secure: bool,
}

impl SessionKeys {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl_hours: config.ttl_hours.max(1),
            cookie_name: config.cookie_name.clone(),
            cookie_secure: config.cookie_secure,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Sign a session token for `user`
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.ttl_hours)).timestamp(),
        };

        Ok(encode(
            &Header::new(SESSION_ALGORITHM),
            &claims,
            &self.encoding,
        )?)
    }

    /// Check signature and expiry of a session token
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(SESSION_ALGORITHM);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if data.claims.user_id().is_none() {
            return Err(AppError::Unauthorized("malformed session subject".into()));
        }
        Ok(data.claims)
    }

    /// Session cookie logging `user` in
    pub fn login_cookie(&self, user: &User) -> Result<Cookie<'static>> {
        let token = self.issue(user)?;
        Ok(Cookie::build(self.cookie_name.clone(), token)
            .path("/")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::hours(self.ttl_hours))
            .finish())
    }

    /// Expired cookie that clears the session
    pub fn logout_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.cookie_name.clone(), "")
            .path("/")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}
