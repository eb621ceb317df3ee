//! Roster and counter endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::store::Participant;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoModeRequest {
    pub is_demo_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct DemoModeResponse {
    pub success: bool,
    pub message: String,
}

/// Participant record with its ID inlined
#[derive(Debug, Serialize)]
pub struct ParticipantEntry {
    pub id: String,
    #[serde(flatten)]
    pub participant: Participant,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalPeopleResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub total_people: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCountResponse {
    pub daily_check_in_count: u64,
}

/// POST /api/set-demo-mode
pub async fn set_demo_mode(
    State(state): State<AppState>,
    Json(req): Json<DemoModeRequest>,
) -> Json<DemoModeResponse> {
    state.shared.set_demo_mode(req.is_demo_mode);
    let mode = if req.is_demo_mode { "Demo" } else { "Production" };

    Json(DemoModeResponse {
        success: true,
        message: format!("Switched to {} mode", mode),
    })
}

/// GET /api/participants
pub async fn list_participants(State(state): State<AppState>) -> Json<Vec<ParticipantEntry>> {
    let store = state.shared.store().await;
    let entries = store
        .iter()
        .map(|(id, participant)| ParticipantEntry {
            id: id.clone(),
            participant: participant.clone(),
        })
        .collect();
    Json(entries)
}

/// POST /api/clear-participants
pub async fn clear_participants(
    State(state): State<AppState>,
) -> ApiResult<Json<TotalPeopleResponse>> {
    state.shared.clear().await?;

    Ok(Json(TotalPeopleResponse {
        message: Some("All participant data cleared successfully".to_string()),
        total_people: 0,
    }))
}

/// GET /api/total-people
pub async fn total_people(State(state): State<AppState>) -> Json<TotalPeopleResponse> {
    Json(TotalPeopleResponse {
        message: None,
        total_people: state.shared.total_people().await,
    })
}

/// GET /api/daily-check-in-count
pub async fn daily_check_in_count(State(state): State<AppState>) -> Json<DailyCountResponse> {
    Json(DailyCountResponse {
        daily_check_in_count: state.shared.daily_check_in_count(),
    })
}
