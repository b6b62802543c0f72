// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transcript - the running text log shown next to the tree.
//!
//! Each history entry stores a copy of the transcript so that undo/redo can
//! restore the text that was visible at that point.

use parking_lot::Mutex;
use std::sync::Arc;

/// Shared handle to the transcript text
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    text: Arc<Mutex<String>>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line
    pub fn line(&self, line: impl AsRef<str>) {
        let mut text = self.text.lock();
        text.push_str(line.as_ref());
        text.push('\n');
    }

    /// Append an empty line
    pub fn blank(&self) {
        self.text.lock().push('\n');
    }

    /// Copy of the current text
    pub fn text(&self) -> String {
        self.text.lock().clone()
    }

    /// Replace the whole text
    pub fn replace(&self, text: &str) {
        let mut current = self.text.lock();
        current.clear();
        current.push_str(text);
    }

    /// Clear the text
    pub fn clear(&self) {
        self.text.lock().clear();
    }

    /// Check if the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.text.lock().is_empty()
    }
}
