//! Campaign configuration
//!
//! Every field has a default matching the live campaign, so an empty JSON
//! object (or no file at all) is a valid configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming an optional JSON config file
pub const CONFIG_ENV_VAR: &str = "SOCIAL_CAMPAIGN_CONFIG";

/// Upload ceiling: 100 MB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignConfig {
    /// Social page opened by "follow us"
    pub social_page_url: String,

    /// Handle shown next to the follow checkbox
    pub social_handle: String,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: u64,

    /// Simulated submission delay in milliseconds
    pub submit_delay_ms: u64,

    /// MIME type of finalized recordings
    pub recording_mime_type: String,

    /// Guidelines shown in the criteria dialog
    pub criteria: VideoCriteria,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            social_page_url: "https://instagram.com/downtown.30".to_string(),
            social_handle: "@downtown.30".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            submit_delay_ms: 2000,
            recording_mime_type: "video/webm".to_string(),
            criteria: VideoCriteria::default(),
        }
    }
}

impl CampaignConfig {
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    /// Read a config from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: CampaignConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;

        tracing::debug!("Loaded campaign config from {:?}", path);
        Ok(config)
    }

    /// Load from `SOCIAL_CAMPAIGN_CONFIG` if set, defaults otherwise
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

/// Video submission guidelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoCriteria {
    pub min_duration_secs: u32,
    pub max_duration_secs: u32,
    pub format: String,
    pub must_include: Vec<String>,
    pub prompt: String,
}

impl Default for VideoCriteria {
    fn default() -> Self {
        Self {
            min_duration_secs: 15,
            max_duration_secs: 60,
            format: "Selfie / Reel format".to_string(),
            must_include: vec![
                "McDonald's McCafe".to_string(),
                "Downtown 30 building/premises".to_string(),
                "A Merry Christmas or Happy New Year greeting".to_string(),
            ],
            prompt: "Tell us what you liked/loved about your experience!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_object_is_default() {
        let config: CampaignConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CampaignConfig::default());
        assert_eq!(config.max_upload_bytes, 104_857_600);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("campaign.json");
        std::fs::write(&path, r#"{ "submitDelayMs": 10, "socialHandle": "@elsewhere" }"#).unwrap();

        let config = CampaignConfig::load(&path).unwrap();
        assert_eq!(config.submit_delay(), Duration::from_millis(10));
        assert_eq!(config.social_handle, "@elsewhere");
        assert_eq!(config.criteria.max_duration_secs, 60);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = CampaignConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
