pub mod auth;
pub mod error;
pub mod favorites;
pub mod flash;
pub mod middleware;
pub mod routes;
pub mod summaries;
pub mod templates;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

pub use auth::{AppState, AppStateInner};
pub use routes::router;

/// `302 Found` to `location`.
pub(crate) fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
