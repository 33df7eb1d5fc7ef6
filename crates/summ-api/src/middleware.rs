use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use summ_types::api::{Claims, SessionUser};

use crate::AppState;
use crate::redirect;

pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_PATH: &str = "/auth/login";

/// Attaches the logged-in `SessionUser` to the request when the session
/// cookie carries a valid token. Anonymous requests pass through untouched.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        match decode_session(&state.session_secret, cookie.value()) {
            Some(user) => {
                req.extensions_mut().insert(user);
            }
            None => debug!("Ignoring invalid session cookie"),
        }
    }
    next.run(req).await
}

/// Sends anonymous callers to the login page.
pub async fn require_login(req: Request, next: Next) -> Response {
    if req.extensions().get::<SessionUser>().is_none() {
        return redirect(LOGIN_PATH);
    }
    next.run(req).await
}

pub fn decode_session(secret: &str, token: &str) -> Option<SessionUser> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.into())
}

/// The session user if there is one; never rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<SessionUser>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<SessionUser>().cloned()))
    }
}
