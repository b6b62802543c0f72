// SPDX-License-Identifier: MIT OR Apache-2.0
//! Front end pieces of the KFM Editor: the tree view, edit scripts and the
//! tracing bridge into the session transcript.

pub mod console;
pub mod script;
pub mod tree;

pub use console::TranscriptBridge;
pub use script::{ScriptError, ScriptReport, ScriptStep};
pub use tree::{RowKind, RowPath, TreeRow, TreeView};
