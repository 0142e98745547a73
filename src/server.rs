use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;

use tracing::{error, info, warn};

use crate::AppState;
use crate::config::AppConfig;
use crate::engine::{ResponseEngine, memory::ConversationMemory, preferences::PreferenceLearner};
use crate::feedback::{FeedbackEntry, FeedbackStore};
use crate::llm::{ChatCompletionsDriver, LlmDriver, LlmSettings};
use crate::protocol::{ChatReply, ChatRequest, FeedbackRequest, StatusBody};

/// Build the engine and feedback store described by `config`.
pub async fn build_state(config: Arc<AppConfig>, settings: Option<LlmSettings>) -> AppState {
    let driver: Option<Arc<dyn LlmDriver>> = settings.map(|settings| {
        info!(
            name: "llm.config.loaded",
            base_url = %settings.base_url,
            model = %settings.model,
            "LLM configuration loaded"
        );
        Arc::new(ChatCompletionsDriver::new(settings)) as Arc<dyn LlmDriver>
    });

    let memory =
        ConversationMemory::load(&config.engine.memory_path, config.engine.memory_limit).await;
    let engine = ResponseEngine::new(config.engine.mode, driver, memory)
        .with_temperature(config.engine.temperature)
        .with_context_turns(config.engine.context_turns);

    AppState {
        engine: Arc::new(engine),
        feedback: Arc::new(FeedbackStore::new(&config.feedback.path)),
        config,
    }
}

/// Routes and middleware for the chat API.
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;

    // Timeout disabled -> one year.
    let timeout_duration = if server.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60)
    } else {
        Duration::from_secs(server.request_timeout_secs)
    };
    let body_limit = server.body_limit_bytes;

    Router::new()
        .route("/chat", post(chat))
        .route("/feedback", post(feedback))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(
    config: Arc<AppConfig>,
    settings: Option<LlmSettings>,
) -> anyhow::Result<()> {
    let state = build_state(Arc::clone(&config), settings).await;
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        mode = %config.engine.mode,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /chat - Reply to a message with the learned tone.
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, (StatusCode, Json<StatusBody>)> {
    let Json(req) = payload.map_err(|e| {
        warn!(error = %e, "Rejected chat request");
        (StatusCode::BAD_REQUEST, Json(StatusBody::error(e.body_text())))
    })?;

    let learner = PreferenceLearner::from_entries(&state.feedback.load().await);
    let tone = learner.recommend_tone().unwrap_or_default();
    let mood = state.engine.detect_mood(&req.message);
    let response = state
        .engine
        .generate_response(&req.message, tone, mood, &learner)
        .await;

    info!(
        name: "chat.reply",
        mood = %mood,
        tone = %tone,
        reply_length = response.len(),
        "Chat reply generated"
    );

    Ok(Json(ChatReply {
        response: Some(response),
        detected_mood: Some(mood.to_string()),
        tone_used: Some(tone.to_string()),
    }))
}

/// POST /feedback - Store a thumbs-up or thumbs-down.
async fn feedback(
    State(state): State<AppState>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> (StatusCode, Json<StatusBody>) {
    let Ok(Json(req)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusBody::error("No data provided")),
        );
    };
    if req.feedback.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusBody::error("Feedback type is required")),
        );
    }

    let entry = FeedbackEntry::new(req.message, req.response, req.feedback, req.mood)
        .with_tone(req.tone);
    match state.feedback.save(entry).await {
        Ok(()) => (StatusCode::OK, Json(StatusBody::ok("success"))),
        Err(e) => {
            error!(error = %e, path = %state.feedback.path().display(), "Failed to save feedback");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusBody::error("Failed to save feedback")),
            )
        }
    }
}

/// GET /health - Liveness check.
async fn health() -> Json<StatusBody> {
    Json(StatusBody::ok("ok"))
}
