// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edit engine for KFM documents.
//!
//! Every change to a document goes through a [`Command`]:
//! - The [`Dispatcher`] runs the matching edit operation on the live document
//! - On success the new state is encoded and appended to the [`HistoryLog`]
//! - On failure the document is restored from the latest snapshot
//! - Undo/redo move through the log and re-decode the stored snapshot
//!
//! The [`Session`] adds file handling on top of the dispatcher.

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod ops;
pub mod session;
pub mod settings;
pub mod transcript;

pub use command::{Command, CommandKind, Field, FieldEdit};
pub use dispatcher::{Applied, Dispatcher, EditObserver, ExecuteResult, Failed, NoopObserver};
pub use error::{EditError, OperationError};
pub use history::{HistoryEntry, HistoryLog, HistoryStats, Snapshot, DEFAULT_HISTORY_CAPACITY};
pub use ops::{EditContext, Removal};
pub use session::{Session, SessionError};
pub use settings::{EditorSettings, SettingsError, SETTINGS_FILE_NAME};
pub use transcript::Transcript;
