use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::AppState;
use crate::templates;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<summ_db::Error> for AppError {
    fn from(e: summ_db::Error) -> Self {
        Self::Internal(e.into())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You are not allowed to change this summary.".to_string(),
            ),
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong on our side.".to_string(),
                )
            }
        };
        (status, Html(templates::error_page(status, &message))).into_response()
    }
}

/// Runs blocking database work off the async runtime. The outer result
/// carries join failures; the inner one is the query's own result so callers
/// can branch on constraint violations.
pub async fn db_call<F, T>(state: &AppState, f: F) -> Result<summ_db::Result<T>, AppError>
where
    F: FnOnce(&summ_db::Database) -> summ_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    Ok(tokio::task::spawn_blocking(move || f(&state.db)).await?)
}
