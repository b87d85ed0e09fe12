//! Per-request storage of uploaded exports.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// An uploaded file on disk, removed when dropped.
///
/// Removal runs on every exit path of the handler that owns it, including
/// early returns and unwinding.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove upload"),
        }
    }
}

/// Writes `data` to `<dir>/<uuid-v4>.csv`.
pub async fn save_upload(dir: &Path, data: &[u8]) -> std::io::Result<TempUpload> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.csv", Uuid::new_v4()));
    tokio::fs::write(&path, data).await?;
    Ok(TempUpload { path })
}

/// True for a non-empty filename with a `.csv` extension, any case.
pub fn is_csv_filename(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
