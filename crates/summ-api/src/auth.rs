use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use summ_db::Database;
use summ_llm::{Summarizer, TranscriptSource, VideoMetadata};
use summ_types::api::{Claims, LoginForm, RegisterForm};

use crate::error::{AppError, db_call};
use crate::middleware::{LOGIN_PATH, MaybeUser, SESSION_COOKIE};
use crate::templates::{self, Page};
use crate::{flash, redirect};

const SESSION_DAYS: i64 = 7;
const MAX_USERNAME_LEN: usize = 32;

pub type AppState = Arc<AppStateInner>;

/// Long-lived services shared by every handler. Built once by the binary.
pub struct AppStateInner {
    pub db: Database,
    pub session_secret: String,
    pub metadata: Arc<dyn VideoMetadata>,
    pub transcripts: Arc<dyn TranscriptSource>,
    pub summarizer: Summarizer,
}

pub async fn register_form(MaybeUser(user): MaybeUser, jar: CookieJar) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    let page = Page::new(user.as_ref(), flashes);
    (jar, Html(templates::register_page(&page, "")))
}

pub async fn register(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim().to_string();

    let error = if username.is_empty() {
        Some("Username is required.".to_string())
    } else if username.chars().count() > MAX_USERNAME_LEN {
        Some(format!("Username must be at most {MAX_USERNAME_LEN} characters."))
    } else if form.password.is_empty() {
        Some("Password is required.".to_string())
    } else {
        None
    };

    if let Some(error) = error {
        let page = Page::with_message(user.as_ref(), error);
        return Ok(Html(templates::register_page(&page, &username)).into_response());
    }

    let password_hash = hash_password(&form.password)?;

    let name = username.clone();
    match db_call(&state, move |db| db.create_user(&name, &password_hash)).await? {
        Ok(id) => {
            info!("Registered user {} ({})", username, id);
            Ok((jar, redirect(LOGIN_PATH)).into_response())
        }
        Err(e) if e.is_duplicate() => {
            let page = Page::with_message(
                user.as_ref(),
                format!("User {username} is already registered."),
            );
            Ok(Html(templates::register_page(&page, &username)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login_form(MaybeUser(user): MaybeUser, jar: CookieJar) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    let page = Page::new(user.as_ref(), flashes);
    (jar, Html(templates::login_page(&page, "")))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim().to_string();

    let name = username.clone();
    let found = db_call(&state, move |db| db.get_user_by_username(&name)).await??;

    let Some(user) = found else {
        let page = Page::with_message(None, "Incorrect username.".to_string());
        return Ok(Html(templates::login_page(&page, &username)).into_response());
    };

    if !verify_password(&form.password, &user.password)? {
        warn!("Failed login for {}", username);
        let page = Page::with_message(None, "Incorrect password.".to_string());
        return Ok(Html(templates::login_page(&page, &username)).into_response());
    }

    let token = create_token(&state.session_secret, user.id, &user.username)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), redirect("/")).into_response())
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(Cookie::build(SESSION_COOKIE).path("/")), redirect("/"))
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| anyhow::anyhow!("stored password hash is corrupt: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn create_token(secret: &str, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
