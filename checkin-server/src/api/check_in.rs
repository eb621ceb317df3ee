//! QR check-in endpoint

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use checkin_common::time::{from_epoch_millis, parse_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::checkin::CheckInOutcome;
use crate::error::{ApiError, ApiResult};
use crate::store::Participant;
use crate::AppState;

/// Client clock reading: a timestamp string or epoch milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CheckInTime {
    EpochMillis(i64),
    Text(String),
}

impl CheckInTime {
    pub fn resolve(&self, tz: Tz) -> checkin_common::Result<DateTime<Utc>> {
        match self {
            CheckInTime::EpochMillis(millis) => from_epoch_millis(*millis),
            CheckInTime::Text(raw) => parse_timestamp(raw, tz),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    /// Participant ID read from the QR code
    pub qr_data: Option<String>,
    pub check_in_time: Option<CheckInTime>,
    /// Allows a repeat check-in on the same day; absent means off
    pub is_demo_mode: Option<bool>,
    /// Echoed back untouched
    pub activity_name: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<Participant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_check_ins: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_count: Option<usize>,
    pub daily_check_in_count: u64,
    pub total_people: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_name: Option<Value>,
}

/// POST /api/check-in
///
/// Unknown, invalid and already-checked-in participants still get 200; only
/// a malformed request or a failed persist is an error.
pub async fn check_in(
    State(state): State<AppState>,
    Json(req): Json<CheckInRequest>,
) -> ApiResult<Json<CheckInResponse>> {
    let id = req
        .qr_data
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("qrData is required".to_string()))?;
    let at = req
        .check_in_time
        .ok_or_else(|| ApiError::BadRequest("checkInTime is required".to_string()))?
        .resolve(state.shared.timezone())?;

    let report = state
        .shared
        .check_in(&id, at, req.is_demo_mode.unwrap_or(false))
        .await?;
    let message = report.outcome.message();

    let (participant, multiple_check_ins, check_in_count) = match report.outcome {
        CheckInOutcome::NotFound | CheckInOutcome::Invalid => {
            debug!("Check-in refused for {}: {}", id, message);
            (None, None, None)
        }
        CheckInOutcome::Recorded {
            participant,
            ordinal,
            repeat,
        } => {
            info!("Checked in {} (#{} today)", id, ordinal);
            (Some(participant), Some(repeat), Some(ordinal))
        }
        CheckInOutcome::AlreadyCheckedIn {
            participant,
            ordinal,
        } => {
            debug!("{} already checked in today", id);
            (Some(participant), Some(true), Some(ordinal))
        }
    };

    Ok(Json(CheckInResponse {
        message,
        participant,
        multiple_check_ins,
        check_in_count,
        daily_check_in_count: report.daily_check_in_count,
        total_people: report.total_people,
        activity_name: req.activity_name,
    }))
}
