//! Check-in export endpoint

use axum::{extract::State, http::header, response::IntoResponse};
use tracing::info;

use crate::error::ApiResult;
use crate::export::{export_workbook, EXPORT_FILENAME, XLSX_CONTENT_TYPE};
use crate::AppState;

/// GET /api/export-checkins
///
/// Returns the roster with its check-ins as an `.xlsx` attachment.
pub async fn export_checkins(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let (bytes, rows) = {
        let store = state.shared.store().await;
        (export_workbook(&store, state.shared.timezone())?, store.len())
    };
    info!("Exported check-ins for {} participants ({} bytes)", rows, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", EXPORT_FILENAME),
            ),
        ],
        bytes,
    ))
}
