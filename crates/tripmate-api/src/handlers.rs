//! Route handler functions for all API endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tripmate_chat::{EvidenceCounts, SessionSummary};
use tripmate_core::TravelMemory;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Omit to start a new session.
    pub session_id: Option<Uuid>,
}

/// Response for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: Uuid,
    pub trip_info: TravelMemory,
    pub evidence: EvidenceCountsBody,
}

/// Result counts per search type; absent when the type did not run.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EvidenceCountsBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotels: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flights: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attractions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trains: Option<usize>,
}

impl From<EvidenceCounts> for EvidenceCountsBody {
    fn from(counts: EvidenceCounts) -> Self {
        Self {
            hotels: counts.hotels,
            flights: counts.flights,
            attractions: counts.attractions,
            trains: counts.trains,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionMemoryResponse {
    pub session_id: Uuid,
    pub trip_info: TravelMemory,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /chat - run one conversational turn.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (reply, session_id) = state
        .planner
        .handle_message(&body.message, body.session_id)
        .await?;

    Ok(Json(ChatResponse {
        reply: reply.reply,
        session_id,
        trip_info: reply.trip_info,
        evidence: reply.evidence.into(),
    }))
}

/// GET /sessions - list live sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.planner.list_sessions().await,
    })
}

/// GET /sessions/{id} - current travel memory of a session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionMemoryResponse>, ApiError> {
    let trip_info = state.planner.get_memory(id).await?;
    Ok(Json(SessionMemoryResponse {
        session_id: id,
        trip_info,
    }))
}

/// POST /sessions/{id}/reset - forget the trip, keep the session.
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionMemoryResponse>, ApiError> {
    let trip_info = state.planner.reset_session(id).await?;
    Ok(Json(SessionMemoryResponse {
        session_id: id,
        trip_info,
    }))
}

/// DELETE /sessions/{id} - drop a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.planner.delete_session(id)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
