// SPDX-License-Identifier: MIT OR Apache-2.0
//! Document model - animations and the transitions between them.
//!
//! Animations are addressed by position (display order matters) and
//! referenced from transitions by their event code.

use crate::version::KfmVersion;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Transition type written for auto-generated transitions
pub const DEFAULT_TRANSITION_KIND: i32 = 5;

/// Header values only present in legacy (1.2.4 and older) files
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyHeader {
    /// First unknown integer
    pub int1: i32,
    /// Second unknown integer
    pub int2: i32,
    /// First unknown float
    pub float1: f32,
    /// Second unknown float
    pub float2: f32,
}

/// A directed edge from an animation to the animation owning `target_event_code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// Event code of the destination animation
    pub target_event_code: i32,
    /// Transition type tag
    pub kind: i32,
}

impl Transition {
    /// Create a transition to `target_event_code`
    pub fn new(target_event_code: i32, kind: i32) -> Self {
        Self {
            target_event_code,
            kind,
        }
    }
}

/// One animation entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// KF file holding the animation data
    pub asset_name: String,
    /// Identifier referenced by transitions; unique per document
    pub event_code: i32,
    /// Free-form index attribute
    pub index: i32,
    /// Outgoing transitions, in display order
    pub transitions: Vec<Transition>,
    /// Animation name (legacy files only)
    #[serde(default)]
    pub name: String,
}

impl Animation {
    /// Create an animation with no transitions
    pub fn new(asset_name: impl Into<String>, event_code: i32) -> Self {
        Self {
            asset_name: asset_name.into(),
            event_code,
            ..Default::default()
        }
    }

    /// Add a transition (builder style)
    pub fn with_transition(mut self, target_event_code: i32, kind: i32) -> Self {
        self.transitions.push(Transition::new(target_event_code, kind));
        self
    }

    /// Position of the first transition targeting `event_code`
    pub fn transition_to(&self, event_code: i32) -> Option<usize> {
        self.transitions
            .iter()
            .position(|t| t.target_event_code == event_code)
    }
}

/// A consistency problem found by [`Document::check_integrity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// Two animations share an event code
    DuplicateEventCode {
        /// The shared code
        event_code: i32,
        /// Position of the first animation using it
        first: usize,
        /// Position of the later animation using it
        second: usize,
    },
    /// A transition points at a code no animation owns
    DanglingTransition {
        /// Owning animation position
        animation: usize,
        /// Transition position
        transition: usize,
        /// The unresolved code
        target_event_code: i32,
    },
    /// A transition points back at its own animation
    SelfLoop {
        /// Owning animation position
        animation: usize,
        /// Transition position
        transition: usize,
    },
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEventCode {
                event_code,
                first,
                second,
            } => write!(
                f,
                "event code {event_code} used by Animation {} and Animation {}",
                first + 1,
                second + 1
            ),
            Self::DanglingTransition {
                animation,
                transition,
                target_event_code,
            } => write!(
                f,
                "Transition {} of Animation {} targets missing event code {target_event_code}",
                transition + 1,
                animation + 1
            ),
            Self::SelfLoop {
                animation,
                transition,
            } => write!(
                f,
                "Transition {} of Animation {} targets its own animation",
                transition + 1,
                animation + 1
            ),
        }
    }
}

/// A KFM document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version from the header line
    pub version: KfmVersion,
    /// NIF file the animations apply to
    pub primary_asset_name: String,
    /// Master name (2.0 and newer)
    #[serde(default)]
    pub master: String,
    /// Legacy header values (1.2.4 and older)
    #[serde(default)]
    pub legacy: LegacyHeader,
    /// Animations in display order
    pub animations: Vec<Animation>,
    /// Trailing footer value
    #[serde(default)]
    pub footer: i32,
}

impl Document {
    /// Create an empty document for `primary_asset_name`
    pub fn new(primary_asset_name: impl Into<String>) -> Self {
        Self {
            primary_asset_name: primary_asset_name.into(),
            ..Default::default()
        }
    }

    /// Add an animation (builder style)
    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animations.push(animation);
        self
    }

    /// Number of animations
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Check whether any animation owns `event_code`
    pub fn contains_code(&self, event_code: i32) -> bool {
        self.animations.iter().any(|a| a.event_code == event_code)
    }

    /// Position of the animation owning `event_code`
    pub fn animation_by_code(&self, event_code: i32) -> Option<usize> {
        self.animations
            .iter()
            .position(|a| a.event_code == event_code)
    }

    /// Largest event code in use
    pub fn max_event_code(&self) -> Option<i32> {
        self.animations.iter().map(|a| a.event_code).max()
    }

    /// All event codes, ordered and deduplicated
    pub fn event_codes(&self) -> BTreeSet<i32> {
        self.animations.iter().map(|a| a.event_code).collect()
    }

    /// Total transitions across all animations
    pub fn transition_count(&self) -> usize {
        self.animations.iter().map(|a| a.transitions.len()).sum()
    }

    /// Collect every integrity violation in the graph
    pub fn check_integrity(&self) -> Vec<IntegrityViolation> {
        let mut violations = Vec::new();
        let mut owners: HashMap<i32, usize> = HashMap::new();

        for (position, animation) in self.animations.iter().enumerate() {
            if let Some(&first) = owners.get(&animation.event_code) {
                violations.push(IntegrityViolation::DuplicateEventCode {
                    event_code: animation.event_code,
                    first,
                    second: position,
                });
            } else {
                owners.insert(animation.event_code, position);
            }
        }

        for (position, animation) in self.animations.iter().enumerate() {
            for (t, transition) in animation.transitions.iter().enumerate() {
                if !owners.contains_key(&transition.target_event_code) {
                    violations.push(IntegrityViolation::DanglingTransition {
                        animation: position,
                        transition: t,
                        target_event_code: transition.target_event_code,
                    });
                } else if transition.target_event_code == animation.event_code {
                    violations.push(IntegrityViolation::SelfLoop {
                        animation: position,
                        transition: t,
                    });
                }
            }
        }

        violations
    }

    /// Whether event codes are unique and every transition resolves
    pub fn is_consistent(&self) -> bool {
        self.check_integrity()
            .iter()
            .all(|v| matches!(v, IntegrityViolation::SelfLoop { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_animations() -> Document {
        Document::new("actor.nif")
            .with_animation(
                Animation::new("idle.kf", 5).with_transition(6, DEFAULT_TRANSITION_KIND),
            )
            .with_animation(
                Animation::new("walk.kf", 6).with_transition(5, DEFAULT_TRANSITION_KIND),
            )
    }

    #[test]
    fn test_lookup_helpers() {
        let doc = two_animations();
        assert_eq!(doc.animation_count(), 2);
        assert_eq!(doc.animation_by_code(6), Some(1));
        assert_eq!(doc.animation_by_code(7), None);
        assert_eq!(doc.max_event_code(), Some(6));
        assert!(doc.contains_code(5));
        assert_eq!(doc.transition_count(), 2);
        assert_eq!(doc.animations[0].transition_to(6), Some(0));
    }

    #[test]
    fn test_consistent_document_has_no_violations() {
        let doc = two_animations();
        assert!(doc.check_integrity().is_empty());
        assert!(doc.is_consistent());
    }

    #[test]
    fn test_integrity_reports_each_violation() {
        let mut doc = two_animations();
        doc.animations[0].transitions.push(Transition::new(42, 0));
        doc.animations[1].transitions.push(Transition::new(6, 0));
        doc.animations.push(Animation::new("dup.kf", 5));

        let violations = doc.check_integrity();
        assert!(violations.contains(&IntegrityViolation::DuplicateEventCode {
            event_code: 5,
            first: 0,
            second: 2,
        }));
        assert!(violations.contains(&IntegrityViolation::DanglingTransition {
            animation: 0,
            transition: 1,
            target_event_code: 42,
        }));
        assert!(violations.contains(&IntegrityViolation::SelfLoop {
            animation: 1,
            transition: 1,
        }));
        assert!(!doc.is_consistent());
    }

    #[test]
    fn test_self_loop_alone_is_still_consistent() {
        let mut doc = two_animations();
        doc.animations[0].transitions.push(Transition::new(5, 0));
        assert_eq!(doc.check_integrity().len(), 1);
        assert!(doc.is_consistent());
    }
}
