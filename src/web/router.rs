use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use crate::web::{AppState, auth, avatar, landing, profile};

const ROBOTS_TXT_BODY: &str = include_str!("../../robots.txt");

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing::landing_page))
        .route("/home", get(landing::landing_page))
        .route("/login", get(auth::login_page).post(auth::auth_action))
        .route("/register", get(auth::register_page).post(auth::auth_action))
        .route("/logout", post(auth::logout))
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        // Profile routes stay last so fixed paths win over the catch-all
        // username segment.
        .route(
            "/:username",
            get(profile::profile_page).post(avatar::avatar_action),
        )
        .route("/:username/links", get(profile::links_page))
        .route("/:username/folders", get(profile::folders_page))
        // Avatar uploads are the only large bodies this service accepts.
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(state)
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT_BODY,
    )
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
