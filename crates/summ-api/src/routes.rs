use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::{load_session, require_login};
use crate::{AppState, auth, favorites, summaries};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(summaries::index))
        .route("/detail/{id}", get(summaries::detail))
        .route(
            "/auth/register",
            get(auth::register_form).post(auth::register),
        )
        .route("/auth/login", get(auth::login_form).post(auth::login))
        .route("/auth/logout", get(auth::logout))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route(
            "/create",
            get(summaries::create_form).post(summaries::create),
        )
        .route(
            "/update/{id}",
            get(summaries::update_form).post(summaries::update),
        )
        .route("/delete/{id}", post(summaries::delete))
        .route("/favorite/{id}", post(favorites::add_favorite))
        .route("/unfavorite/{id}", post(favorites::remove_favorite))
        .route("/favorites", get(favorites::favorites))
        .layer(middleware::from_fn(require_login));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
