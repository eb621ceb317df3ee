//! Roster upload endpoint

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::roster::{extension_for, read_roster};
use crate::AppState;

/// Multipart field carrying the spreadsheet
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub message: String,
    pub total_people: usize,
}

/// Uploaded file parked on disk, removed when dropped
struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    fn new(upload_dir: &Path, extension: &str) -> Self {
        Self {
            path: upload_dir.join(format!("{}.{}", Uuid::new_v4(), extension)),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed upload {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove upload {}: {}", self.path.display(), e),
        }
    }
}

/// POST /api/upload-participants
///
/// Accepts a single `.xlsx` or `.xls` file in the `file` field and replaces
/// the whole roster with its rows. Any row error rejects the upload and
/// leaves the current roster in place.
pub async fn upload_participants(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportResponse>> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let extension = extension_for(&content_type).ok_or_else(|| {
            debug!("Rejected upload with content type '{}'", content_type);
            ApiError::UnsupportedMedia("Only .xlsx and .xls format allowed!".to_string())
        })?;

        tokio::fs::create_dir_all(&state.config.upload_dir)
            .await
            .map_err(checkin_common::Error::from)?;
        let upload = TempUpload::new(&state.config.upload_dir, extension);

        let mut file = tokio::fs::File::create(upload.path())
            .await
            .map_err(checkin_common::Error::from)?;
        let mut written = 0usize;
        while let Some(chunk) = field.chunk().await? {
            written += chunk.len();
            file.write_all(&chunk)
                .await
                .map_err(checkin_common::Error::from)?;
        }
        file.flush().await.map_err(checkin_common::Error::from)?;
        drop(file);
        debug!("Stored upload {} ({} bytes)", upload.path().display(), written);

        let path = upload.path().to_path_buf();
        let roster = tokio::task::spawn_blocking(move || read_roster(&path))
            .await
            .map_err(|e| ApiError::Internal(format!("Import task failed: {}", e)))??;

        let total_people = state.shared.replace_roster(roster).await?;
        info!("Imported roster with {} participants", total_people);

        return Ok(Json(ImportResponse {
            message: "Participants updated successfully".to_string(),
            total_people,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded.".to_string()))
}
