use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use lexeme_db::{IndexStore, LanguageMap};
use serde::Serialize;
use thiserror::Error;

pub const MAX_WORD_LEN: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<IndexStore>,
    pub disable_cache: bool,
}

#[derive(Serialize)]
pub struct WordResponse<'a> {
    word: String,
    found: bool,
    languages: &'a LanguageMap,
}

#[derive(Serialize)]
pub struct StatsResponse<'a> {
    words: usize,
    languages: Vec<&'a str>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/stats", get(stats))
        .route("/v1/words/{word}", get(word))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn stats(State(state): State<AppState>) -> Response {
    let index = state.store.index();
    Json(StatsResponse {
        words: index.len(),
        languages: index.languages().into_iter().collect(),
    })
    .into_response()
}

async fn word(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let word = raw.trim().to_lowercase();
    if word.is_empty() {
        return Err(ApiError::bad_request("word is required"));
    }
    if word.chars().count() > MAX_WORD_LEN {
        return Err(ApiError::bad_request(format!(
            "word must be at most {MAX_WORD_LEN} characters"
        )));
    }

    let languages = state.store.lookup(&word);
    let response = WordResponse {
        found: !languages.is_empty(),
        word,
        languages,
    };

    if state.disable_cache {
        Ok(Json(response).into_response())
    } else {
        Ok((
            [(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=300"),
            )],
            Json(response),
        )
            .into_response())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }
    }
}
