// SPDX-License-Identifier: MIT OR Apache-2.0
//! Format version token carried in the KFM header line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the KFM file format.
///
/// The label is kept verbatim (e.g. `2.2.0.0b`) so re-encoding writes the
/// exact header that was read. The packed form orders versions and selects
/// which optional fields the codec reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KfmVersion {
    label: String,
    packed: u32,
}

impl KfmVersion {
    /// First version with the endianness byte and master name
    pub const ENDIAN_AWARE: u32 = 0x0200_0000;
    /// Last version with the legacy header values and per-animation names
    pub const LEGACY_LAST: u32 = 0x0102_0400;

    /// Parse a version label such as `2.2.0.0b` or `1.2.4b`.
    ///
    /// Returns `None` when the numeric part is empty, has more than four
    /// components, or a component does not fit in a byte.
    pub fn parse(label: &str) -> Option<Self> {
        let numeric = label.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        if numeric.is_empty() {
            return None;
        }

        let mut packed = 0u32;
        let mut parts = 0;
        for part in numeric.split('.') {
            if parts == 4 {
                return None;
            }
            let value: u8 = part.parse().ok()?;
            packed |= u32::from(value) << (24 - 8 * parts);
            parts += 1;
        }

        Some(Self {
            label: label.to_string(),
            packed,
        })
    }

    /// The version written by the current toolchain
    pub fn latest() -> Self {
        Self {
            label: "2.2.0.0b".to_string(),
            packed: 0x0202_0000,
        }
    }

    /// The verbatim label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The packed `a.b.c.d` value
    pub fn packed(&self) -> u32 {
        self.packed
    }

    /// Whether the endianness byte and master name are present
    pub fn has_endian_byte(&self) -> bool {
        self.packed >= Self::ENDIAN_AWARE
    }

    /// Whether the legacy header values and animation names are present
    pub fn is_legacy(&self) -> bool {
        self.packed <= Self::LEGACY_LAST
    }
}

impl Default for KfmVersion {
    fn default() -> Self {
        Self::latest()
    }
}

impl fmt::Display for KfmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
