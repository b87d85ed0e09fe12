use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use trafficcmp_core::{run_analysis, CoreError};
use trafficcmp_report::render_charts;

use crate::error::AppError;
use crate::html::render_results;
use crate::state::AppState;
use crate::uploads::{is_csv_filename, save_upload};

const OLDER_FIELD: &str = "file1";
const NEWER_FIELD: &str = "file2";

struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

/// `POST /analyze`: compares two uploaded CSV exports.
///
/// Missing fields, empty filenames and non-`.csv` names send the browser back
/// to the form with `303 See Other`. The analysis itself runs on the blocking
/// pool; uploads are deleted when the handler returns on any path.
#[tracing::instrument(skip_all)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut files: HashMap<&'static str, UploadedFile> = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let key = match field.name() {
            Some(OLDER_FIELD) => OLDER_FIELD,
            Some(NEWER_FIELD) => NEWER_FIELD,
            _ => continue,
        };
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        files.insert(
            key,
            UploadedFile {
                filename,
                data: data.to_vec(),
            },
        );
    }

    let (Some(older), Some(newer)) = (files.remove(OLDER_FIELD), files.remove(NEWER_FIELD)) else {
        warn!("Upload missing one of the two files");
        return Ok(Redirect::to("/").into_response());
    };
    if !is_csv_filename(&older.filename) || !is_csv_filename(&newer.filename) {
        warn!(
            older = %older.filename,
            newer = %newer.filename,
            "Upload rejected: both files must be .csv"
        );
        return Ok(Redirect::to("/").into_response());
    }

    let upload_dir = &state.config.upload_dir;
    let older_file = save_upload(upload_dir, &older.data).await?;
    let newer_file = save_upload(upload_dir, &newer.data).await?;

    let options = state.config.analysis_options();
    let older_path = older_file.path().to_path_buf();
    let newer_path = newer_file.path().to_path_buf();
    let outcome = tokio::task::spawn_blocking(move || {
        let report = run_analysis(&older_path, &newer_path, &options)?;
        let charts = render_charts(&report);
        Ok::<_, CoreError>((report, charts))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("analysis task failed: {e}")))?;

    let (report, charts) = outcome?;
    info!(
        older = %older.filename,
        newer = %newer.filename,
        insights = report.insights.len(),
        charts = charts.len(),
        "Comparison rendered"
    );
    Ok(Html(render_results(&report, &charts)).into_response())
}
