// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command dispatcher - runs commands against the live document.
//!
//! The dispatcher exclusively owns the document and the history log. A
//! successful command is snapshotted into the log; a failed one is undone
//! by decoding the snapshot at the history pointer over the live document.

use crate::command::{Command, CommandKind, FieldEdit};
use crate::error::EditError;
use crate::history::{HistoryLog, Snapshot};
use crate::ops::{self, EditContext, Removal};
use crate::settings::EditorSettings;
use crate::transcript::Transcript;
use kfm_editor_format::{CodecError, Document, DocumentCodec, KfmCodec};

/// A command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    /// Kind of the command
    pub kind: CommandKind,
    /// Element removed by the command, for observers caching tree state
    pub removed: Option<Removal>,
}

/// A command that was rejected or rolled back
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct Failed {
    /// Kind of the command, when the input mapped to one
    pub kind: Option<CommandKind>,
    /// Why it failed
    pub error: EditError,
}

/// Result of [`Dispatcher::execute`]
pub type ExecuteResult = Result<Applied, Failed>;

/// Receives notifications from the dispatcher
pub trait EditObserver {
    /// Called after every execute, successful or not
    fn command_finished(&mut self, _result: &ExecuteResult) {}

    /// Called after undo/redo with the transcript of the landed-on entry
    fn history_restored(&mut self, _transcript: &str) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EditObserver for NoopObserver {}

/// Owner of the live document and its history
pub struct Dispatcher {
    document: Option<Document>,
    history: HistoryLog,
    codec: Box<dyn DocumentCodec>,
    transcript: Transcript,
    default_kind: i32,
    dirty: bool,
}

impl Dispatcher {
    /// Create a dispatcher with the KFM codec and default settings
    pub fn new() -> Self {
        Self::with_codec(Box::new(KfmCodec), &EditorSettings::default())
    }

    /// Create a dispatcher using `settings`
    pub fn with_settings(settings: &EditorSettings) -> Self {
        Self::with_codec(Box::new(KfmCodec), settings)
    }

    /// Create a dispatcher with a custom codec
    pub fn with_codec(codec: Box<dyn DocumentCodec>, settings: &EditorSettings) -> Self {
        Self {
            document: None,
            history: HistoryLog::with_capacity(settings.history_capacity),
            codec,
            transcript: Transcript::new(),
            default_kind: settings.default_transition_kind,
            dirty: false,
        }
    }

    /// Replace the live document and seed the history with its snapshot
    pub fn load(&mut self, document: Document) -> Result<(), CodecError> {
        let snapshot = Snapshot::new(self.codec.encode(&document)?);
        self.history.seed(snapshot, self.transcript.text());
        self.document = Some(document);
        self.dirty = false;
        Ok(())
    }

    /// Decode `bytes` and load the result
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        let document = self.decode(bytes)?;
        self.load(document)
    }

    /// Decode `bytes` with the dispatcher's codec without loading them
    pub fn decode(&self, bytes: &[u8]) -> Result<Document, CodecError> {
        self.codec.decode(bytes)
    }

    /// Encode the live document
    pub fn encode(&self) -> Result<Vec<u8>, EditError> {
        let document = self.document.as_ref().ok_or(EditError::NoDocument)?;
        Ok(self.codec.encode(document)?)
    }

    /// The live document
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The history log
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// The transcript shared with the presentation layer
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Whether the document changed since load or the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after a save
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Execute a command without an observer
    pub fn execute(&mut self, command: Command) -> ExecuteResult {
        self.execute_with(command, &mut NoopObserver)
    }

    /// Execute a command and notify `observer` of the outcome
    pub fn execute_with(
        &mut self,
        command: Command,
        observer: &mut dyn EditObserver,
    ) -> ExecuteResult {
        let result = self.run(command);
        observer.command_finished(&result);
        result
    }

    /// Convert a tree-view edit into a command and execute it
    pub fn execute_field(
        &mut self,
        edit: &FieldEdit,
        observer: &mut dyn EditObserver,
    ) -> ExecuteResult {
        let command = match edit.to_command() {
            Ok(command) => command,
            Err(error) => {
                tracing::info!(
                    field = %edit.field,
                    value = %edit.value,
                    "Rejected edit: {error}"
                );
                self.transcript.line(error.to_string());
                let result = Err(Failed {
                    kind: edit.kind(),
                    error,
                });
                observer.command_finished(&result);
                return result;
            }
        };
        self.execute_with(command, observer)
    }

    fn run(&mut self, command: Command) -> ExecuteResult {
        let kind = command.kind();
        let fail = |error: EditError| Failed {
            kind: Some(kind),
            error,
        };

        let Some(document) = self.document.as_mut() else {
            return Err(fail(EditError::NoDocument));
        };

        let mut ctx =
            EditContext::new(document, &self.transcript).with_default_kind(self.default_kind);
        let outcome = ops::apply(&command, &mut ctx);

        let removed = match outcome {
            Ok(removed) => removed,
            Err(error) => {
                let error = EditError::from(error);
                self.transcript.line(error.to_string());
                return Err(fail(self.rollback(&command, error)));
            }
        };

        let bytes = match self.encode() {
            Ok(bytes) => bytes,
            Err(error) => return Err(fail(self.rollback(&command, error))),
        };

        if let Some(document) = self.document.as_ref().filter(|d| !d.is_consistent()) {
            tracing::warn!(
                command = %command,
                violations = document.check_integrity().len(),
                "Document is inconsistent after command"
            );
        }

        tracing::info!(command = %command, "Applied {}", command.description());
        self.transcript.blank();
        self.history
            .record(command, Snapshot::new(bytes), self.transcript.text());
        self.dirty = true;

        Ok(Applied { kind, removed })
    }

    /// Restore the snapshot at the history pointer, returning the error to report
    fn rollback(&mut self, command: &Command, error: EditError) -> EditError {
        tracing::info!(command = %command, "Rolling back: {error}");

        let Some(entry) = self.history.current() else {
            tracing::error!("No snapshot to roll back to");
            return EditError::EmptyHistory;
        };

        match self.codec.decode(&entry.snapshot.data) {
            Ok(document) => {
                self.document = Some(document);
                error
            }
            Err(codec) => {
                tracing::error!("Rollback failed, history snapshot is unreadable: {codec}");
                EditError::RollbackFailed {
                    reason: error.to_string(),
                    codec,
                }
            }
        }
    }

    /// Step back one history entry
    pub fn undo(&mut self, observer: &mut dyn EditObserver) -> Result<(), EditError> {
        let (data, transcript) = self
            .history
            .peek_undo()
            .map(|entry| (entry.snapshot.data.clone(), entry.transcript.clone()))
            .ok_or(EditError::NothingToUndo)?;
        self.restore(&data, transcript, observer)?;
        self.history.step_back();
        tracing::info!(pointer = self.history.pointer(), "Undo");
        Ok(())
    }

    /// Step forward one history entry
    pub fn redo(&mut self, observer: &mut dyn EditObserver) -> Result<(), EditError> {
        let (data, transcript) = self
            .history
            .peek_redo()
            .map(|entry| (entry.snapshot.data.clone(), entry.transcript.clone()))
            .ok_or(EditError::NothingToRedo)?;
        self.restore(&data, transcript, observer)?;
        self.history.step_forward();
        tracing::info!(pointer = self.history.pointer(), "Redo");
        Ok(())
    }

    /// Decode a stored snapshot over the live document; on failure nothing changes
    fn restore(
        &mut self,
        data: &[u8],
        transcript: String,
        observer: &mut dyn EditObserver,
    ) -> Result<(), EditError> {
        let document = self.codec.decode(data).map_err(|codec| {
            tracing::error!("History snapshot is unreadable: {codec}");
            EditError::Codec(codec)
        })?;

        self.document = Some(document);
        self.transcript.replace(&transcript);
        self.dirty = true;
        observer.history_restored(&transcript);
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("document", &self.document)
            .field("history", &self.history)
            .field("default_kind", &self.default_kind)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
