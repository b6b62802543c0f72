// SPDX-License-Identifier: MIT OR Apache-2.0
//! KFM document model and binary codec for the KFM Editor.
//!
//! A KFM file describes a set of animations for one model and the
//! transitions allowed between them. This crate provides:
//! - The in-memory [`Document`] graph (animations and their transitions)
//! - Integrity checks over the graph
//! - A lossless binary codec used for both persistence and undo snapshots
//!
//! ## Architecture
//!
//! The model stores sequences only; every count field of the on-disk
//! format is derived from sequence lengths at encode time.

pub mod codec;
pub mod document;
pub mod version;

pub use codec::{decode, encode, CodecError, DocumentCodec, KfmCodec};
pub use document::{
    Animation, Document, IntegrityViolation, LegacyHeader, Transition, DEFAULT_TRANSITION_KIND,
};
pub use version::KfmVersion;
