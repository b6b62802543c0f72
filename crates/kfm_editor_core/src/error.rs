// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the edit engine.
//!
//! Animation and transition positions are zero-based in the types and shown
//! one-based in messages, matching the tree labels (`Animation 1`, ...).

use kfm_editor_format::CodecError;

/// A precondition of an edit operation was violated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// Animation position past the end of the document
    #[error("Animation {} does not exist ({len} animations)", .index + 1)]
    AnimationOutOfRange {
        /// Requested position
        index: usize,
        /// Number of animations
        len: usize,
    },

    /// Transition position past the end of an animation's transitions
    #[error(
        "Transition {} of Animation {} does not exist ({len} transitions)",
        .index + 1,
        .animation + 1
    )]
    TransitionOutOfRange {
        /// Owning animation position
        animation: usize,
        /// Requested position
        index: usize,
        /// Number of transitions
        len: usize,
    },

    /// Text where an integer is required
    #[error("{field} expects an integer, got {value:?}")]
    NotANumber {
        /// Field label
        field: &'static str,
        /// The rejected text
        value: String,
    },

    /// A count below zero
    #[error("{field} cannot be negative, got {value}")]
    NegativeCount {
        /// Field label
        field: &'static str,
        /// The rejected value
        value: i64,
    },

    /// A field edit without the animation it belongs to
    #[error("{field} edit needs an animation index")]
    MissingAnimationIndex {
        /// Field label
        field: &'static str,
    },

    /// A field edit without the transition it belongs to
    #[error("{field} edit needs a transition index")]
    MissingTransitionIndex {
        /// Field label
        field: &'static str,
    },

    /// Event code already owned by another animation
    #[error("Event code {event_code} already used by Animation {}", .animation + 1)]
    DuplicateEventCode {
        /// The requested code
        event_code: i32,
        /// Position of the animation owning it
        animation: usize,
    },

    /// Transition target that no animation owns
    #[error("Can't find animation with event code {0}")]
    UnknownEventCode(i32),

    /// No fresh event code above the current maximum
    #[error("No event code available above {0}")]
    EventCodeOverflow(i32),

    /// A count above what growth will allocate
    #[error("{field} of {requested} exceeds the limit of {limit}")]
    TooLarge {
        /// Field label
        field: &'static str,
        /// The requested count
        requested: usize,
        /// Largest accepted count
        limit: usize,
    },

    /// A new transition has nothing to point at
    #[error("Animation {} has no other animation to transition to", .animation + 1)]
    NoTransitionTarget {
        /// Animation gaining transitions
        animation: usize,
    },

    /// Truncating animations would orphan a transition
    #[error(
        "Animation {} still transitions to event code {event_code}, which would be removed",
        .animation + 1
    )]
    WouldDangle {
        /// Surviving animation holding the transition
        animation: usize,
        /// Code of the animation that would be truncated
        event_code: i32,
    },
}

/// Error returned across the dispatcher boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// Field or command the engine does not handle
    #[error("Unsupported edit: {0}")]
    Unsupported(String),

    /// Operation precondition failed; the document was restored
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// Snapshot could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Restoring the last snapshot failed after a failed operation
    #[error("Rollback after '{reason}' failed: {codec}")]
    RollbackFailed {
        /// Why the operation failed
        reason: String,
        /// Why the snapshot could not be decoded
        codec: CodecError,
    },

    /// The history log holds no snapshot to roll back to
    #[error("No snapshot to roll back to")]
    EmptyHistory,

    /// No document has been loaded
    #[error("No document loaded")]
    NoDocument,

    /// History pointer is at the oldest entry
    #[error("Nothing to undo")]
    NothingToUndo,

    /// History pointer is at the newest entry
    #[error("Nothing to redo")]
    NothingToRedo,
}
