// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edit scripts - RON lists of steps replayed against a session.
//!
//! ```ron
//! [
//!     Command(SetAnimationCount(count: 3)),
//!     Field(field: "Event Code", value: "12", animation: Some(2)),
//!     Undo,
//!     Redo,
//! ]
//! ```

use kfm_editor_core::{Command, EditObserver, FieldEdit, Session};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Script loading errors
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not a valid script
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptStep {
    /// Execute a command
    Command(Command),
    /// Edit a tree field by label and raw text
    Field {
        /// Field label, e.g. `Num Transitions`
        field: String,
        /// Text to enter
        value: String,
        /// Owning animation position
        #[serde(default)]
        animation: Option<usize>,
        /// Owning transition position
        #[serde(default)]
        transition: Option<usize>,
    },
    /// Step back one history entry
    Undo,
    /// Step forward one history entry
    Redo,
}

/// Counts of what a script run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptReport {
    /// Steps that changed the document
    pub applied: usize,
    /// Steps that were rejected or had nothing to do
    pub failed: usize,
}

/// Parse a script from RON text
pub fn parse(content: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    Ok(ron::from_str(content)?)
}

/// Load a script file
pub fn load(path: &Path) -> Result<Vec<ScriptStep>, ScriptError> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Run every step; a failing step is logged and the run continues
pub fn run(
    steps: &[ScriptStep],
    session: &mut Session,
    observer: &mut dyn EditObserver,
) -> ScriptReport {
    let mut report = ScriptReport::default();

    for (number, step) in steps.iter().enumerate() {
        let outcome = match step {
            ScriptStep::Command(command) => session
                .execute(command.clone(), observer)
                .map(|_| ())
                .map_err(|failed| failed.error),
            ScriptStep::Field {
                field,
                value,
                animation,
                transition,
            } => {
                let edit = FieldEdit {
                    field: field.clone(),
                    value: value.clone(),
                    animation: *animation,
                    transition: *transition,
                };
                session
                    .execute_field(&edit, observer)
                    .map(|_| ())
                    .map_err(|failed| failed.error)
            }
            ScriptStep::Undo => session.undo(observer),
            ScriptStep::Redo => session.redo(observer),
        };

        match outcome {
            Ok(()) => report.applied += 1,
            Err(error) => {
                tracing::warn!(step = number + 1, "Script step failed: {error}");
                report.failed += 1;
            }
        }
    }

    report
}
