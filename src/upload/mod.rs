//! Upload path
//!
//! A user-picked video file, checked against the upload ceiling.

use crate::utils::{CampaignError, CampaignResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A user-chosen video file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub path: Option<PathBuf>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, size_bytes: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
            path: None,
        }
    }

    /// Describe a file on disk
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a file: {:?}", path),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            name,
            size_bytes: metadata.len(),
            mime_type: mime_type_for(path).to_string(),
            path: Some(path.to_path_buf()),
        })
    }

    /// Playable reference: an asset-protocol URL for files on disk, a
    /// named handle otherwise
    pub fn object_url(&self) -> String {
        match &self.path {
            Some(path) => format!(
                "asset://localhost/{}",
                urlencoding::encode(&path.to_string_lossy())
            ),
            None => format!("blob:upload/{}", urlencoding::encode(&self.name)),
        }
    }
}

/// Accept `file` if it fits under `max_bytes`
pub fn check_size(file: &SelectedFile, max_bytes: u64) -> CampaignResult<()> {
    if file.size_bytes > max_bytes {
        tracing::warn!(
            "Rejected upload {}: {} bytes exceeds {}",
            file.name,
            file.size_bytes,
            max_bytes
        );
        return Err(CampaignError::FileTooLarge);
    }
    Ok(())
}

/// MIME type from the file extension
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "3gp" => "video/3gpp",
        _ => "application/octet-stream",
    }
}
