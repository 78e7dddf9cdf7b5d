//! Shared types and enums used across ECOSYNC.
//! Includes the workflow `Action` selector, the `DayNight` acquisition
//! filter, and the `band_name` file-type helper.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which workflow stages to run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Download,
    Upload,
    Both,
}

impl Default for Action {
    fn default() -> Self {
        Action::Both
    }
}

impl Action {
    pub fn includes_download(&self) -> bool {
        matches!(self, Action::Download | Action::Both)
    }

    pub fn includes_upload(&self) -> bool {
        matches!(self, Action::Upload | Action::Both)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Download => "download",
            Action::Upload => "upload",
            Action::Both => "both",
        };
        write!(f, "{}", s)
    }
}

/// Day/night acquisition filter, in the archive's spelling.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayNight {
    Day,
    Night,
}

impl Default for DayNight {
    fn default() -> Self {
        DayNight::Day
    }
}

impl std::fmt::Display for DayNight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DayNight::Day => "DAY",
            DayNight::Night => "NIGHT",
        };
        write!(f, "{}", s)
    }
}

/// Band name for a file-type suffix: everything before the first dot
/// (`"LST.tif"` -> `"LST"`, `"LST_err.tif"` -> `"LST_err"`).
pub fn band_name(file_type: &str) -> &str {
    match file_type.split_once('.') {
        Some((band, _)) => band,
        None => file_type,
    }
}
