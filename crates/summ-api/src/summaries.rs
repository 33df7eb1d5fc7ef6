use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use summ_db::Error as DbError;
use summ_db::models::{CategoryRow, NewSummary, SummaryFilter, SummaryRow, SummaryUpdate};
use summ_db::queries;
use summ_llm::{extract_video_id, web_url};
use summ_types::api::{CreateSummaryForm, ListQuery, SessionUser, UpdateSummaryForm};

use crate::AppState;
use crate::error::{AppError, db_call};
use crate::middleware::MaybeUser;
use crate::templates::{self, Page};
use crate::{flash, redirect};

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn duplicate_message(title: &str) -> String {
    format!("A summary for \"{title}\" already exists.")
}

/// GET /: Listing, optionally filtered by category name and title substring.
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = SummaryFilter {
        category: non_empty(&query.category),
        search: non_empty(&query.search),
    };
    let user_id = user.as_ref().map(|u| u.id);

    let (summaries, categories, favorites) = db_call(&state, move |db| {
        db.with_conn(|conn| {
            let summaries = queries::list_summaries(conn, &filter)?;
            let categories = queries::list_categories(conn)?;
            let favorites = match user_id {
                Some(id) => queries::favorite_ids(conn, id)?,
                None => Vec::new(),
            };
            Ok((summaries, categories, favorites))
        })
    })
    .await??;

    let (jar, flashes) = flash::take(jar);
    let page = Page::new(user.as_ref(), flashes);
    Ok((
        jar,
        Html(templates::index_page(
            &page,
            &summaries,
            &categories,
            &query,
            &favorites,
        )),
    ))
}

/// Fetches a summary for display or mutation: 404 when it does not exist,
/// 403 when `author` is given and did not write it.
pub async fn get_summary(
    state: &AppState,
    id: i64,
    author: Option<&SessionUser>,
) -> Result<SummaryRow, AppError> {
    let summary = db_call(state, move |db| db.get_summary(id))
        .await??
        .ok_or_else(|| AppError::NotFound(format!("Summary id {id} doesn't exist.")))?;

    if let Some(user) = author {
        if summary.author_id != user.id {
            warn!(
                "User {} tried to modify summary {} owned by {}",
                user.id, id, summary.author_id
            );
            return Err(AppError::Forbidden);
        }
    }

    Ok(summary)
}

async fn load_categories(state: &AppState) -> Result<Vec<CategoryRow>, AppError> {
    Ok(db_call(state, |db| db.list_categories()).await??)
}

async fn render_create(
    state: &AppState,
    user: &SessionUser,
    status: StatusCode,
    messages: Vec<String>,
    form: &CreateSummaryForm,
) -> Result<Response, AppError> {
    let categories = load_categories(state).await?;
    let page = Page::new(Some(user), messages);
    Ok((
        status,
        Html(templates::create_page(
            &page,
            &categories,
            &form.yt_url,
            &form.category_name,
        )),
    )
        .into_response())
}

/// GET /create
pub async fn create_form(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, flashes) = flash::take(jar);
    let page = render_create(
        &state,
        &user,
        StatusCode::OK,
        flashes,
        &CreateSummaryForm::default(),
    )
    .await?;
    Ok((jar, page).into_response())
}

/// POST /create: Resolve metadata, fetch the transcript, summarize, insert.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<CreateSummaryForm>,
) -> Result<Response, AppError> {
    let reject = |message: String| render_create(&state, &user, StatusCode::OK, vec![message], &form);

    let Some(yt_url) = non_empty(&form.yt_url) else {
        return reject("Youtube URL is required".into()).await;
    };
    let Some(category) = non_empty(&form.category_name) else {
        return reject("Category is required".into()).await;
    };
    let Ok(category_id) = category.parse::<i64>() else {
        return reject("Category does not exist".into()).await;
    };
    let Some(video_id) = web_url(&yt_url).and_then(|_| extract_video_id(&yt_url)) else {
        return reject("Could not find a YouTube video id in that URL".into()).await;
    };

    let details = state.metadata.lookup(&yt_url).await;

    if let Some(title) = details.title.clone() {
        let exists = db_call(&state, move |db| db.summary_title_exists(&title)).await??;
        if exists {
            return reject(duplicate_message(details.title.as_deref().unwrap_or(""))).await;
        }
    }

    let transcript = match state.transcripts.fetch_transcript(&video_id).await {
        Ok(transcript) => transcript,
        Err(e) => {
            warn!("Transcript for {} unavailable: {}", video_id, e);
            return reject(format!("Could not fetch transcript: {e}")).await;
        }
    };

    let summary_text = state.summarizer.summarize(&transcript).await;

    let new_summary = NewSummary {
        yt_url,
        yt_title: details.title.clone(),
        yt_channel_name: details.channel_name,
        transcript,
        summary_text,
        author_id: user.id,
        category_id,
    };

    match db_call(&state, move |db| db.insert_summary(&new_summary)).await? {
        Ok(id) => {
            info!("User {} created summary {} for video {}", user.id, id, video_id);
            Ok(redirect("/"))
        }
        Err(DbError::Duplicate(_)) => {
            reject(duplicate_message(details.title.as_deref().unwrap_or(""))).await
        }
        Err(DbError::MissingReference(_)) => reject("Category does not exist".into()).await,
        Err(e) => Err(e.into()),
    }
}

/// GET /detail/{id}, public.
pub async fn detail(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let summary = get_summary(&state, id, None).await?;
    let (jar, flashes) = flash::take(jar);
    let page = Page::new(user.as_ref(), flashes);
    Ok((jar, Html(templates::detail_page(&page, &summary))))
}

/// GET /update/{id}, author only.
pub async fn update_form(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let summary = get_summary(&state, id, Some(&user)).await?;
    let categories = load_categories(&state).await?;

    let values = UpdateSummaryForm {
        yt_title: summary.yt_title.clone().unwrap_or_default(),
        yt_channel_name: summary.yt_channel_name.clone().unwrap_or_default(),
        summary_text: summary.summary_text.clone(),
        category_name: summary.category_id.to_string(),
    };

    let (jar, flashes) = flash::take(jar);
    let page = Page::new(Some(&user), flashes);
    Ok((
        jar,
        Html(templates::update_page(&page, id, &values, &categories)),
    ))
}

/// POST /update/{id}: Author only; a blank title re-renders the form with 400.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
    Form(form): Form<UpdateSummaryForm>,
) -> Result<Response, AppError> {
    get_summary(&state, id, Some(&user)).await?;
    let categories = load_categories(&state).await?;

    let reject = |status: StatusCode, message: String| {
        let page = Page::with_message(Some(&user), message);
        (
            status,
            Html(templates::update_page(&page, id, &form, &categories)),
        )
            .into_response()
    };

    let Some(yt_title) = non_empty(&form.yt_title) else {
        return Ok(reject(
            StatusCode::BAD_REQUEST,
            "YouTube title is required.".into(),
        ));
    };
    let Some(category_id) = non_empty(&form.category_name).and_then(|c| c.parse::<i64>().ok())
    else {
        return Ok(reject(
            StatusCode::BAD_REQUEST,
            "Category is required.".into(),
        ));
    };

    let update = SummaryUpdate {
        yt_title: yt_title.clone(),
        yt_channel_name: form.yt_channel_name.trim().to_string(),
        summary_text: form.summary_text.clone(),
        category_id,
    };

    match db_call(&state, move |db| db.update_summary(id, &update)).await? {
        Ok(_) => {
            info!("User {} updated summary {}", user.id, id);
            Ok(redirect("/"))
        }
        Err(DbError::Duplicate(_)) => Ok(reject(StatusCode::OK, duplicate_message(&yt_title))),
        Err(DbError::MissingReference(_)) => Ok(reject(
            StatusCode::BAD_REQUEST,
            "Category does not exist.".into(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// POST /delete/{id}, author only.
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    get_summary(&state, id, Some(&user)).await?;
    db_call(&state, move |db| db.delete_summary(id)).await??;
    info!("User {} deleted summary {}", user.id, id);

    let jar = flash::push(jar, "Summary deleted.");
    Ok((jar, redirect("/")))
}
