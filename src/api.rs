use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::pipeline::HighlightPipeline;
use crate::status::ReferenceSet;
use crate::types::{Acquired, Highlight, Language};

pub const STATUS_HEADER: &str = "x-highlights-status";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<HighlightPipeline>,
    pub reference: Arc<ReferenceSet>,
}

impl AppState {
    pub fn new(pipeline: HighlightPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            reference: Arc::new(ReferenceSet::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/highlights", get(get_highlights).post(post_highlights))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

#[derive(Deserialize)]
struct AcquireReq {
    #[serde(default)]
    lang: Language,
    #[serde(default)]
    previous_highlights: Vec<Highlight>,
}

fn respond(state: &AppState, acquired: Acquired) -> Response {
    state.reference.observe(&acquired.data);
    let status = acquired.data.status.as_str();
    ([(STATUS_HEADER, status)], Json(acquired)).into_response()
}

/// Uses the server-side reference set as `previousHighlights`.
async fn get_highlights(State(state): State<AppState>, Query(q): Query<LangQuery>) -> Response {
    let language = match q.lang.as_deref().map(str::parse::<Language>) {
        None => Language::En,
        Some(Ok(l)) => l,
        Some(Err(e)) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };
    let previous = state.reference.get(language);
    let acquired = state.pipeline.acquire(language, &previous).await;
    respond(&state, acquired)
}

/// Caller supplies its own `previous_highlights`.
async fn post_highlights(State(state): State<AppState>, Json(body): Json<AcquireReq>) -> Response {
    let acquired = state
        .pipeline
        .acquire(body.lang, &body.previous_highlights)
        .await;
    respond(&state, acquired)
}
