// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of whole-document snapshots.
//!
//! Entry 0 is the snapshot taken right after load. Every successful command
//! appends the encoded post-command state; undo and redo move a pointer over
//! the entries and the dispatcher re-decodes the snapshot it lands on.

use crate::command::Command;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default number of retained entries
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Encoded document state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Codec output
    pub data: Vec<u8>,
    /// Seconds since the Unix epoch when the snapshot was taken
    pub timestamp: u64,
}

impl Snapshot {
    /// Wrap encoded bytes
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One history position
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Command that produced this state (`None` for the load snapshot)
    pub command: Option<Command>,
    /// Document state after the command
    pub snapshot: Snapshot,
    /// Transcript text at that point
    pub transcript: String,
}

/// History statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    /// Steps available to undo
    pub undo_count: usize,
    /// Steps available to redo
    pub redo_count: usize,
    /// Bytes held by snapshots
    pub memory_used: usize,
    /// Maximum retained entries
    pub capacity: usize,
    /// Timestamp of the oldest retained snapshot
    pub oldest_timestamp: Option<u64>,
    /// Timestamp of the newest snapshot
    pub newest_timestamp: Option<u64>,
}

/// Bounded, linear snapshot log
#[derive(Debug)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    pointer: usize,
    capacity: usize,
    memory_used: usize,
}

impl HistoryLog {
    /// Create an empty log with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create with a custom capacity (at least 1, so the undo floor survives)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            pointer: 0,
            capacity: capacity.max(1),
            memory_used: 0,
        }
    }

    /// Start over from a freshly loaded document
    pub fn seed(&mut self, snapshot: Snapshot, transcript: String) {
        self.clear();
        self.memory_used = snapshot.size();
        self.entries.push_back(HistoryEntry {
            command: None,
            snapshot,
            transcript,
        });
    }

    /// Append the state after a successful command.
    ///
    /// Entries after the pointer (the redo branch) are dropped first. When
    /// the log is over capacity the oldest entry is evicted.
    pub fn record(&mut self, command: Command, snapshot: Snapshot, transcript: String) {
        if !self.entries.is_empty() {
            for stale in self.entries.drain(self.pointer + 1..) {
                self.memory_used = self.memory_used.saturating_sub(stale.snapshot.size());
            }
        }

        self.memory_used += snapshot.size();
        self.entries.push_back(HistoryEntry {
            command: Some(command),
            snapshot,
            transcript,
        });
        self.pointer = self.entries.len() - 1;

        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                self.memory_used = self.memory_used.saturating_sub(evicted.snapshot.size());
                self.pointer = self.pointer.saturating_sub(1);
            }
        }
    }

    /// Entry at the pointer
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.pointer)
    }

    /// Entry undo would land on
    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        if self.can_undo() {
            self.entries.get(self.pointer - 1)
        } else {
            None
        }
    }

    /// Entry redo would land on
    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        if self.can_redo() {
            self.entries.get(self.pointer + 1)
        } else {
            None
        }
    }

    /// Move the pointer back one entry
    pub fn step_back(&mut self) -> bool {
        if self.can_undo() {
            self.pointer -= 1;
            true
        } else {
            false
        }
    }

    /// Move the pointer forward one entry
    pub fn step_forward(&mut self) -> bool {
        if self.can_redo() {
            self.pointer += 1;
            true
        } else {
            false
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.entries.len()
    }

    /// Current pointer position
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been seeded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum retained entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate entries oldest first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pointer = 0;
        self.memory_used = 0;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.pointer,
            redo_count: self.entries.len().saturating_sub(self.pointer + 1),
            memory_used: self.memory_used,
            capacity: self.capacity,
            oldest_timestamp: self.entries.front().map(|e| e.snapshot.timestamp),
            newest_timestamp: self.entries.back().map(|e| e.snapshot.timestamp),
        }
    }

    /// Description of the command undo would revert
    pub fn undo_description(&self) -> Option<String> {
        if !self.can_undo() {
            return None;
        }
        self.current()?.command.as_ref().map(Command::description)
    }

    /// Description of the command redo would reapply
    pub fn redo_description(&self) -> Option<String> {
        self.peek_redo()?.command.as_ref().map(Command::description)
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}
