use serde::{Deserialize, Serialize};

// -- Session --

/// Claims carried by the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

/// The logged-in user attached to a request by the session middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

impl From<Claims> for SessionUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
        }
    }
}

// -- Auth forms --

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// -- Summaries --

/// `category_name` carries the category id, matching the select box value.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSummaryForm {
    #[serde(default)]
    pub yt_url: String,
    #[serde(default)]
    pub category_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSummaryForm {
    #[serde(default)]
    pub yt_title: String,
    #[serde(default)]
    pub yt_channel_name: String,
    #[serde(default)]
    pub summary_text: String,
    #[serde(default)]
    pub category_name: String,
}

/// Query string of the listing page. Empty values mean "no filter".
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub search: String,
}
