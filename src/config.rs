//! Configuration loading and validation.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::earthdata::SearchQuery;
use crate::types::{Action, DayNight};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Archive search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Product short name in the archive
    #[serde(default = "default_short_name")]
    pub short_name: String,

    /// MGRS tile, e.g. "18TUN"; empty searches every tile
    #[serde(default = "default_tile")]
    pub tile: String,

    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,

    #[serde(default)]
    pub day_night: DayNight,

    /// File-type suffixes to download, e.g. "LST.tif"
    #[serde(default = "default_file_types")]
    pub file_types: Vec<String>,
}

fn default_short_name() -> String {
    "ECO_L2T_LSTE".to_string()
}

fn default_tile() -> String {
    "18TUN".to_string()
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 20).unwrap_or_default()
}

fn default_file_types() -> Vec<String> {
    [
        "LST.tif",
        "LST_err.tif",
        "EmisWB.tif",
        "view_zenith.tif",
        "height.tif",
        "QC.tif",
        "cloud.tif",
        "water.tif",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            short_name: default_short_name(),
            tile: default_tile(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            day_night: DayNight::default(),
            file_types: default_file_types(),
        }
    }
}

/// Local download layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Files land under `<root>/<band>/`
    #[serde(default = "default_download_root")]
    pub root: PathBuf,
}

fn default_download_root() -> PathBuf {
    PathBuf::from("ecostress")
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            root: default_download_root(),
        }
    }
}

/// Upload tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload command to invoke
    #[serde(default = "default_upload_program")]
    pub program: String,

    /// Account the upload tool acts as
    #[serde(default)]
    pub user_email: String,

    /// Base manifest path; per-band manifests are derived from it
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Destination collection prefix, e.g. "projects/p/assets/Ecostress"
    #[serde(default)]
    pub collection_base: String,
}

fn default_upload_program() -> String {
    "geeup".to_string()
}

fn default_manifest() -> PathBuf {
    PathBuf::from("metadata_ecostress.csv")
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            program: default_upload_program(),
            user_email: String::new(),
            manifest: default_manifest(),
            collection_base: String::new(),
        }
    }
}

impl UploadConfig {
    /// Destination collection for one band.
    pub fn collection_for(&self, band: &str) -> String {
        format!("{}/ecostress_{}", self.collection_base, band.to_lowercase())
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Persistent log file written alongside console output
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("ecosync.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

/// Main workflow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub action: Action,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            action: Action::default(),
            search: SearchConfig::default(),
            download: DownloadConfig::default(),
            upload: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl WorkflowConfig {
    /// Parse configuration from a TOML file without validating it. Callers
    /// that adjust fields afterwards validate the final result themselves.
    pub fn read_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.start_date > self.search.end_date {
            return Err(ConfigError::ValidationError(format!(
                "start_date {} is after end_date {}",
                self.search.start_date, self.search.end_date
            )));
        }

        if self.search.file_types.is_empty() {
            return Err(ConfigError::ValidationError(
                "file_types must name at least one suffix".to_string(),
            ));
        }

        if !self.search.tile.is_empty() {
            if let Err(err) = crate::granule::utm_epsg(&self.search.tile) {
                return Err(ConfigError::ValidationError(format!(
                    "search.tile: {}",
                    err
                )));
            }
        }

        if self.action.includes_upload() {
            if self.upload.user_email.is_empty() {
                return Err(ConfigError::ValidationError(
                    "upload.user_email is required for upload runs".to_string(),
                ));
            }
            if self.upload.collection_base.is_empty() {
                return Err(ConfigError::ValidationError(
                    "upload.collection_base is required for upload runs".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Search criteria for the configured tile and date range.
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            short_name: self.search.short_name.clone(),
            tile: self.search.tile.clone(),
            start_date: self.search.start_date,
            end_date: self.search.end_date,
            day_night: self.search.day_night,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = WorkflowConfig::default();

        assert_eq!(config.action, Action::Both);
        assert_eq!(config.search.short_name, "ECO_L2T_LSTE");
        assert_eq!(config.search.tile, "18TUN");
        assert_eq!(config.search.day_night, DayNight::Day);
        assert_eq!(config.search.file_types.len(), 8);
        assert_eq!(config.download.root, PathBuf::from("ecostress"));
        assert_eq!(config.upload.program, "geeup");
        assert_eq!(config.logging.file, PathBuf::from("ecosync.log"));
    }

    #[test]
    fn test_collection_for_lowercases_band() {
        let mut upload = UploadConfig::default();
        upload.collection_base = "projects/p/assets/Ecostress".to_string();

        assert_eq!(
            upload.collection_for("LST"),
            "projects/p/assets/Ecostress/ecostress_lst"
        );
        assert_eq!(
            upload.collection_for("LST_err"),
            "projects/p/assets/Ecostress/ecostress_lst_err"
        );
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ecosync.toml");
        fs::write(
            &path,
            r#"
action = "download"

[search]
tile = "10SFH"
start_date = "2024-06-01"
end_date = "2024-06-30"
day_night = "NIGHT"
file_types = ["LST.tif", "QC.tif"]

[download]
root = "/tmp/ecostress"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = WorkflowConfig::from_file(&path).unwrap();
        assert_eq!(config.action, Action::Download);
        assert_eq!(config.search.tile, "10SFH");
        assert_eq!(config.search.day_night, DayNight::Night);
        assert_eq!(config.search.file_types, vec!["LST.tif", "QC.tif"]);
        assert_eq!(
            config.search.start_date,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert_eq!(config.download.root, PathBuf::from("/tmp/ecostress"));
        assert_eq!(config.logging.level, "debug");
        // unset sections keep defaults
        assert_eq!(config.search.short_name, "ECO_L2T_LSTE");
        assert_eq!(config.upload.program, "geeup");
    }

    #[test]
    fn test_read_file_defers_validation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ecosync.toml");
        // upload action with no account details: parseable, not yet valid
        fs::write(&path, "action = \"upload\"\n").unwrap();

        assert!(WorkflowConfig::from_file(&path).is_err());

        let config = WorkflowConfig::read_file(&path).unwrap();
        assert_eq!(config.action, Action::Upload);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_reversed_dates() {
        let mut config = WorkflowConfig::default();
        config.action = Action::Download;
        config.search.start_date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        config.search.end_date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_file_types() {
        let mut config = WorkflowConfig::default();
        config.action = Action::Download;
        config.search.file_types.clear();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_upload_runs_require_email_and_collection() {
        let mut config = WorkflowConfig::default();
        config.action = Action::Upload;
        assert!(config.validate().is_err());

        config.upload.user_email = "user@example.com".to_string();
        assert!(config.validate().is_err());

        config.upload.collection_base = "projects/p/assets/Ecostress".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_download_only_needs_no_upload_settings() {
        let mut config = WorkflowConfig::default();
        config.action = Action::Download;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_malformed_tile() {
        let mut config = WorkflowConfig::default();
        config.action = Action::Download;
        config.search.tile = "18T".to_string();
        assert!(config.validate().is_err());

        // empty tile means search everywhere
        config.search.tile = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_search_query_carries_config_fields() {
        let config = WorkflowConfig::default();
        let query = config.search_query();
        assert_eq!(query.short_name, "ECO_L2T_LSTE");
        assert_eq!(query.tile, "18TUN");
        assert_eq!(query.day_night, DayNight::Day);
    }

    #[test]
    fn test_config_serialization() {
        let config = WorkflowConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: WorkflowConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.search.tile, parsed.search.tile);
        assert_eq!(config.search.start_date, parsed.search.start_date);
    }
}
