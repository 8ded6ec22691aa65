use crate::errors::AppError;
use crate::models::StoredDocument;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error};

/// Strict read: an absent file is the empty document, anything else that
/// goes wrong is surfaced.
pub async fn read_document(path: &Path) -> Result<StoredDocument, AppError> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|err| AppError::from(std::io::Error::new(std::io::ErrorKind::InvalidData, err))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no tracker data yet");
            Ok(StoredDocument::default())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn load_document(path: &Path) -> StoredDocument {
    read_document(path).await.unwrap_or_else(|err| {
        error!(path = %path.display(), error = ?err, "tracker data unavailable, serving empty document");
        StoredDocument::default()
    })
}

// written beside the target and renamed over it
pub async fn persist_document(path: &Path, document: &StoredDocument) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(document).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let staging = staging_path(path);
    if let Err(err) = fs::write(&staging, payload).await {
        let _ = fs::remove_file(&staging).await;
        return Err(err.into());
    }
    if let Err(err) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(err.into());
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
