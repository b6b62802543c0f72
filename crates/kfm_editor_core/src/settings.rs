// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings, stored as RON.

use crate::history::DEFAULT_HISTORY_CAPACITY;
use kfm_editor_format::DEFAULT_TRANSITION_KIND;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name looked up next to the working directory
pub const SETTINGS_FILE_NAME: &str = "kfm_editor.ron";

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid settings RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] ron::Error),

    /// File was written by a newer editor
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version understood
        supported: u32,
    },
}

fn default_version() -> u32 {
    SETTINGS_FORMAT_VERSION
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_transition_kind() -> i32 {
    DEFAULT_TRANSITION_KIND
}

fn default_log_filter() -> String {
    "kfm_editor_core=info".to_string()
}

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Settings format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Maximum retained history entries, including the load snapshot
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Type tag written for auto-generated transitions
    #[serde(default = "default_transition_kind")]
    pub default_transition_kind: i32,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Print the transcript after a scripted session
    #[serde(default)]
    pub echo_transcript: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_transition_kind: DEFAULT_TRANSITION_KIND,
            log_filter: default_log_filter(),
            echo_transcript: false,
        }
    }
}

impl EditorSettings {
    /// Parse settings from RON text
    pub fn from_ron(content: &str) -> Result<Self, SettingsError> {
        let settings: EditorSettings = ron::from_str(content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}
