// SPDX-License-Identifier: MIT OR Apache-2.0
//! File handling around a [`Dispatcher`].

use crate::command::{Command, FieldEdit};
use crate::dispatcher::{Dispatcher, EditObserver, ExecuteResult};
use crate::error::EditError;
use crate::settings::{EditorSettings, SettingsError};
use kfm_editor_format::CodecError;
use std::path::{Path, PathBuf};

/// Window title prefix
pub const TITLE: &str = "KFM Editor";

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not a readable KFM document
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The dispatcher refused
    #[error(transparent)]
    Edit(#[from] EditError),

    /// Settings file could not be used
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Save without a path
    #[error("No file is open")]
    NoPath,
}

/// An opened KFM file and its edit state
#[derive(Debug, Default)]
pub struct Session {
    dispatcher: Dispatcher,
    settings: EditorSettings,
    path: Option<PathBuf>,
}

impl Session {
    /// Create an empty session with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session using `settings`
    pub fn with_settings(settings: &EditorSettings) -> Self {
        Self {
            dispatcher: Dispatcher::with_settings(settings),
            settings: settings.clone(),
            path: None,
        }
    }

    /// Create an empty session from a settings file, using defaults when it is missing
    pub fn from_settings_file(path: &Path) -> Result<Self, SessionError> {
        let settings = EditorSettings::load_or_default(path)?;
        Ok(Self::with_settings(&settings))
    }

    /// Settings the session was created with
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Read and load a KFM file.
    ///
    /// On failure the previously opened document, if any, stays loaded.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        let transcript = self.dispatcher.transcript().clone();
        transcript.line(format!("Reading {} ...", path.display()));

        let document = match std::fs::read(path)
            .map_err(SessionError::from)
            .and_then(|bytes| Ok(self.dispatcher.decode(&bytes)?))
        {
            Ok(document) => document,
            Err(error) => {
                tracing::debug!("Failed to open {:?}: {error}", path);
                transcript.line(error.to_string());
                return Err(error);
            }
        };

        transcript.line(format!("... version {}", document.version));
        transcript.line(format!("    NIF File Name {}", document.primary_asset_name));
        transcript.line(format!("    Found {} animations", document.animation_count()));
        transcript.blank();

        tracing::info!(
            animations = document.animation_count(),
            version = %document.version,
            "Opened {:?}",
            path
        );
        self.dispatcher.load(document)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Write the document back to the opened path
    pub fn save(&mut self) -> Result<(), SessionError> {
        let path = self.path.clone().ok_or(SessionError::NoPath)?;
        self.write_to(&path)
    }

    /// Write the document to `path`, which becomes the opened path
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        self.write_to(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write_to(&mut self, path: &Path) -> Result<(), SessionError> {
        let bytes = self.dispatcher.encode()?;
        std::fs::write(path, bytes)?;
        self.dispatcher.mark_saved();
        tracing::info!("Saved {:?}", path);
        Ok(())
    }

    /// First of `<stem>.<ext>`, `<stem>_1.<ext>`, ... that does not exist yet
    pub fn default_save_path(&self) -> Option<PathBuf> {
        self.path.as_deref().map(next_free_path)
    }

    /// Path of the opened file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether edits have not been written yet
    pub fn has_unsaved_changes(&self) -> bool {
        self.dispatcher.is_dirty()
    }

    /// Window title: `KFM Editor <path>`, with ` *` when there are unsaved changes
    pub fn title(&self) -> String {
        let mut title = TITLE.to_string();
        if let Some(path) = &self.path {
            title.push(' ');
            title.push_str(&path.display().to_string());
        }
        if self.has_unsaved_changes() {
            title.push_str(" *");
        }
        title
    }

    /// The underlying dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Mutable access to the underlying dispatcher
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Execute a command
    pub fn execute(&mut self, command: Command, observer: &mut dyn EditObserver) -> ExecuteResult {
        self.dispatcher.execute_with(command, observer)
    }

    /// Execute a tree-view edit
    pub fn execute_field(
        &mut self,
        edit: &FieldEdit,
        observer: &mut dyn EditObserver,
    ) -> ExecuteResult {
        self.dispatcher.execute_field(edit, observer)
    }

    /// Undo one step
    pub fn undo(&mut self, observer: &mut dyn EditObserver) -> Result<(), EditError> {
        self.dispatcher.undo(observer)
    }

    /// Redo one step
    pub fn redo(&mut self, observer: &mut dyn EditObserver) -> Result<(), EditError> {
        self.dispatcher.redo(observer)
    }
}

fn next_free_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut candidate = path.to_path_buf();
    let mut count = 1u32;
    while candidate.exists() {
        let name = match &ext {
            Some(ext) => format!("{stem}_{count}.{ext}"),
            None => format!("{stem}_{count}"),
        };
        candidate = path.with_file_name(name);
        count += 1;
    }
    candidate
}
