//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for ingestion, search, streamed chat and study
//! material. Chat answers are sent as an event stream.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::LecternError;
use crate::orchestrator::Orchestrator;
use crate::rag::{Flashcard, QuizQuestion};
use crate::vector_store::{ChatTurn, ContentType};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let orchestrator = Orchestrator::new(settings)?;

    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Lectern API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ingest", "POST /ingest");
    Output::kv("Search", "POST /search");
    Output::kv("Chat (stream)", "POST /chat");
    Output::kv("Flashcards", "POST /flashcards");
    Output::kv("Quiz", "POST /quiz");
    Output::kv("History", "GET/POST /history/{content_id}");
    Output::kv("Clear", "POST /clear");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(orchestrator: Orchestrator) -> Router {
    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest))
        .route("/search", post(search))
        .route("/chat", post(chat))
        .route("/flashcards", post(flashcards))
        .route("/quiz", post(quiz))
        .route("/history/{content_id}", get(get_history).post(append_history))
        .route("/clear", post(clear))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct IngestRequest {
    content_type: ContentType,
    /// Already-extracted text.
    text: String,
}

#[derive(Serialize)]
struct IngestResponse {
    content_id: String,
    chunks_indexed: usize,
    fallback_chunks: usize,
}

#[derive(Deserialize)]
struct SearchRequest {
    content_id: String,
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<String>,
}

#[derive(Deserialize)]
struct ChatRequest {
    content_ids: Vec<String>,
    message: String,
    #[serde(default)]
    history: Vec<ChatTurn>,
}

#[derive(Deserialize)]
struct StudyRequest {
    content_ids: Vec<String>,
}

#[derive(Serialize)]
struct FlashcardsResponse {
    flashcards: Vec<Flashcard>,
}

#[derive(Serialize)]
struct QuizResponse {
    questions: Vec<QuizQuestion>,
}

#[derive(Serialize)]
struct HistoryResponse {
    content_id: String,
    history: Vec<ChatTurn>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map an error to a JSON response, logging server-side failures with the
/// operation that produced them.
fn error_response(operation: &str, e: LecternError) -> Response {
    let status = match e {
        LecternError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("{} failed: {}", operation, e);
    }

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ingest(State(state): State<Arc<AppState>>, Json(req): Json<IngestRequest>) -> Response {
    match state.orchestrator.ingest_content(req.content_type, &req.text).await {
        Ok(result) => Json(IngestResponse {
            content_id: result.content_id,
            chunks_indexed: result.chunks_indexed,
            fallback_chunks: result.fallback_chunks,
        })
        .into_response(),
        Err(e) => error_response("ingest", e),
    }
}

async fn search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> Response {
    let limit = req
        .limit
        .unwrap_or(state.orchestrator.settings().rag.search_limit);

    match state.orchestrator.search(&req.content_id, &req.query, limit).await {
        Ok(results) => Json(SearchResponse { results }).into_response(),
        Err(e) => error_response(&format!("search in {}", req.content_id), e),
    }
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    match state
        .orchestrator
        .chat_stream(&req.content_ids, &req.message, &req.history)
        .await
    {
        Ok(events) => (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(events),
        )
            .into_response(),
        Err(e) => error_response(&format!("chat over {:?}", req.content_ids), e),
    }
}

async fn flashcards(State(state): State<Arc<AppState>>, Json(req): Json<StudyRequest>) -> Response {
    match state.orchestrator.generate_flashcards(&req.content_ids).await {
        Ok(flashcards) => Json(FlashcardsResponse { flashcards }).into_response(),
        Err(e) => error_response(&format!("flashcards for {:?}", req.content_ids), e),
    }
}

async fn quiz(State(state): State<Arc<AppState>>, Json(req): Json<StudyRequest>) -> Response {
    match state.orchestrator.generate_quiz(&req.content_ids).await {
        Ok(questions) => Json(QuizResponse { questions }).into_response(),
        Err(e) => error_response(&format!("quiz for {:?}", req.content_ids), e),
    }
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(content_id): Path<String>,
) -> Response {
    match state.orchestrator.history(&content_id).await {
        Ok(history) => Json(HistoryResponse { content_id, history }).into_response(),
        Err(e) => error_response(&format!("history of {}", content_id), e),
    }
}

async fn append_history(
    State(state): State<Arc<AppState>>,
    Path(content_id): Path<String>,
    Json(turn): Json<ChatTurn>,
) -> Response {
    match state.orchestrator.record_turn(&content_id, turn).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&format!("append to history of {}", content_id), e),
    }
}

async fn clear(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.clear_all().await {
        Ok(()) => Json(serde_json::json!({ "status": "cleared" })).into_response(),
        Err(e) => error_response("clear", e),
    }
}
