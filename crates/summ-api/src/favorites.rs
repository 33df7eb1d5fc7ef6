use axum::{
    Extension,
    extract::{Path, State},
    response::{Html, IntoResponse},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use summ_types::api::SessionUser;

use crate::AppState;
use crate::error::{AppError, db_call};
use crate::summaries::get_summary;
use crate::templates::{self, Page};
use crate::{flash, redirect};

/// POST /favorite/{id}: Any logged-in user may bookmark any existing summary.
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    get_summary(&state, id, None).await?;

    let user_id = user.id;
    let message = match db_call(&state, move |db| db.add_favorite(user_id, id)).await? {
        Ok(()) => {
            info!("User {} favorited summary {}", user_id, id);
            "Summary added to favorites"
        }
        Err(e) if e.is_duplicate() => "Summary is already in your favorites",
        Err(e) => return Err(e.into()),
    };

    Ok((flash::push(jar, message), redirect("/")))
}

/// POST /unfavorite/{id}: Succeeds whether or not the pair existed.
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user.id;
    db_call(&state, move |db| db.remove_favorite(user_id, id)).await??;

    Ok((
        flash::push(jar, "Summary removed from favorites."),
        redirect("/favorites"),
    ))
}

/// GET /favorites: The caller's bookmarks, newest first.
pub async fn favorites(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user.id;
    let summaries = db_call(&state, move |db| db.list_favorites(user_id)).await??;

    let (jar, flashes) = flash::take(jar);
    let page = Page::new(Some(&user), flashes);
    Ok((jar, Html(templates::favorites_page(&page, &summaries))))
}
