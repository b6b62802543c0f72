// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor commands.
//!
//! [`Command`] is the closed set of edits the engine understands. The tree
//! view edits by field label and raw text instead; [`FieldEdit`] converts
//! such an edit into a command, rejecting read-only fields and bad numbers.

use crate::error::{EditError, OperationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An edit to a KFM document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Replace the NIF file name
    SetPrimaryAssetName {
        /// New name
        name: String,
    },
    /// Grow or shrink the animation list
    SetAnimationCount {
        /// New number of animations
        count: usize,
    },
    /// Replace an animation's KF file name
    SetAnimationAssetName {
        /// Animation position
        animation: usize,
        /// New name
        name: String,
    },
    /// Replace an animation's index attribute
    SetAnimationIndexAttr {
        /// Animation position
        animation: usize,
        /// New index value
        index: i32,
    },
    /// Rename an event code and every transition referencing it
    SetAnimationEventCode {
        /// Animation position
        animation: usize,
        /// New event code
        event_code: i32,
    },
    /// Grow or shrink one animation's transition list
    SetAnimationTransitionCount {
        /// Animation position
        animation: usize,
        /// New number of transitions
        count: usize,
    },
    /// Point a transition at another animation
    SetTransitionTarget {
        /// Animation position
        animation: usize,
        /// Transition position
        transition: usize,
        /// Event code of the new target
        event_code: i32,
    },
    /// Replace a transition's type tag
    SetTransitionKind {
        /// Animation position
        animation: usize,
        /// Transition position
        transition: usize,
        /// New type tag
        kind: i32,
    },
    /// Delete an animation and the transitions leading to it
    RemoveAnimation {
        /// Animation position
        animation: usize,
    },
    /// Delete one transition
    RemoveTransition {
        /// Animation position
        animation: usize,
        /// Transition position
        transition: usize,
    },
}

/// Discriminant of a [`Command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// [`Command::SetPrimaryAssetName`]
    SetPrimaryAssetName,
    /// [`Command::SetAnimationCount`]
    SetAnimationCount,
    /// [`Command::SetAnimationAssetName`]
    SetAnimationAssetName,
    /// [`Command::SetAnimationIndexAttr`]
    SetAnimationIndexAttr,
    /// [`Command::SetAnimationEventCode`]
    SetAnimationEventCode,
    /// [`Command::SetAnimationTransitionCount`]
    SetAnimationTransitionCount,
    /// [`Command::SetTransitionTarget`]
    SetTransitionTarget,
    /// [`Command::SetTransitionKind`]
    SetTransitionKind,
    /// [`Command::RemoveAnimation`]
    RemoveAnimation,
    /// [`Command::RemoveTransition`]
    RemoveTransition,
}

impl CommandKind {
    /// Stable snake-case name
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetPrimaryAssetName => "set_primary_asset_name",
            Self::SetAnimationCount => "set_animation_count",
            Self::SetAnimationAssetName => "set_animation_asset_name",
            Self::SetAnimationIndexAttr => "set_animation_index",
            Self::SetAnimationEventCode => "set_animation_event_code",
            Self::SetAnimationTransitionCount => "set_animation_transition_count",
            Self::SetTransitionTarget => "set_transition_target",
            Self::SetTransitionKind => "set_transition_kind",
            Self::RemoveAnimation => "remove_animation",
            Self::RemoveTransition => "remove_transition",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Command {
    /// The command's kind
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::SetPrimaryAssetName { .. } => CommandKind::SetPrimaryAssetName,
            Self::SetAnimationCount { .. } => CommandKind::SetAnimationCount,
            Self::SetAnimationAssetName { .. } => CommandKind::SetAnimationAssetName,
            Self::SetAnimationIndexAttr { .. } => CommandKind::SetAnimationIndexAttr,
            Self::SetAnimationEventCode { .. } => CommandKind::SetAnimationEventCode,
            Self::SetAnimationTransitionCount { .. } => CommandKind::SetAnimationTransitionCount,
            Self::SetTransitionTarget { .. } => CommandKind::SetTransitionTarget,
            Self::SetTransitionKind { .. } => CommandKind::SetTransitionKind,
            Self::RemoveAnimation { .. } => CommandKind::RemoveAnimation,
            Self::RemoveTransition { .. } => CommandKind::RemoveTransition,
        }
    }

    /// Human-readable description for menus and logs
    pub fn description(&self) -> String {
        match self {
            Self::SetPrimaryAssetName { .. } => "Edit NIF File Name".to_string(),
            Self::SetAnimationCount { count } => format!("Set Animation Count to {count}"),
            Self::SetAnimationAssetName { animation, .. } => {
                format!("Edit KF File Name of Animation {}", animation + 1)
            }
            Self::SetAnimationIndexAttr { animation, .. } => {
                format!("Edit Index of Animation {}", animation + 1)
            }
            Self::SetAnimationEventCode { animation, .. } => {
                format!("Edit Event Code of Animation {}", animation + 1)
            }
            Self::SetAnimationTransitionCount { animation, count } => {
                format!("Set Transition Count of Animation {} to {count}", animation + 1)
            }
            Self::SetTransitionTarget {
                animation,
                transition,
                ..
            } => format!(
                "Retarget Transition {} of Animation {}",
                transition + 1,
                animation + 1
            ),
            Self::SetTransitionKind {
                animation,
                transition,
                ..
            } => format!(
                "Edit Type of Transition {} of Animation {}",
                transition + 1,
                animation + 1
            ),
            Self::RemoveAnimation { animation } => format!("Remove Animation {}", animation + 1),
            Self::RemoveTransition {
                animation,
                transition,
            } => format!(
                "Remove Transition {} of Animation {}",
                transition + 1,
                animation + 1
            ),
        }
    }

    /// The new value carried by the command, if any
    fn value(&self) -> Option<String> {
        match self {
            Self::SetPrimaryAssetName { name } | Self::SetAnimationAssetName { name, .. } => {
                Some(name.clone())
            }
            Self::SetAnimationCount { count } | Self::SetAnimationTransitionCount { count, .. } => {
                Some(count.to_string())
            }
            Self::SetAnimationIndexAttr { index, .. } => Some(index.to_string()),
            Self::SetAnimationEventCode { event_code, .. }
            | Self::SetTransitionTarget { event_code, .. } => Some(event_code.to_string()),
            Self::SetTransitionKind { kind, .. } => Some(kind.to_string()),
            Self::RemoveAnimation { .. } | Self::RemoveTransition { .. } => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{} : {value}", self.kind()),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Field labels shown by the tree view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// Header line (read-only)
    HeaderString,
    /// Document NIF file name
    NifFileName,
    /// Number of animations
    NumAnimations,
    /// Animation KF file name
    KfFileName,
    /// Animation event code
    EventCode,
    /// Animation index attribute
    Index,
    /// Number of transitions of an animation
    NumTransitions,
    /// Transition target event code
    TransitionAnimation,
    /// Transition type tag
    TransitionType,
}

impl Field {
    /// Label as displayed in the tree
    pub fn label(&self) -> &'static str {
        match self {
            Self::HeaderString => "Header String",
            Self::NifFileName => "NIF File Name",
            Self::NumAnimations => "Num Animations",
            Self::KfFileName => "KF File Name",
            Self::EventCode => "Event Code",
            Self::Index => "Index",
            Self::NumTransitions => "Num Transitions",
            Self::TransitionAnimation => "Animation",
            Self::TransitionType => "Type",
        }
    }

    /// Look a field up by its tree label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.label() == label)
    }

    /// Every field, in tree order
    pub fn all() -> &'static [Field] {
        &[
            Field::HeaderString,
            Field::NifFileName,
            Field::NumAnimations,
            Field::KfFileName,
            Field::EventCode,
            Field::Index,
            Field::NumTransitions,
            Field::TransitionAnimation,
            Field::TransitionType,
        ]
    }

    /// Whether edits to this field are accepted
    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::HeaderString)
    }
}

/// A raw edit coming from the tree view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEdit {
    /// Field label, e.g. `Event Code`
    pub field: String,
    /// Text entered by the user
    pub value: String,
    /// Owning animation, for animation and transition fields
    #[serde(default)]
    pub animation: Option<usize>,
    /// Owning transition, for transition fields
    #[serde(default)]
    pub transition: Option<usize>,
}

impl FieldEdit {
    /// Create an edit of a document-level field
    pub fn new(field: Field, value: impl Into<String>) -> Self {
        Self {
            field: field.label().to_string(),
            value: value.into(),
            animation: None,
            transition: None,
        }
    }

    /// Attach the animation position
    pub fn on_animation(mut self, animation: usize) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Attach the transition position
    pub fn on_transition(mut self, transition: usize) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Kind of the command this edit would produce
    pub fn kind(&self) -> Option<CommandKind> {
        let kind = match Field::from_label(&self.field)? {
            Field::HeaderString => return None,
            Field::NifFileName => CommandKind::SetPrimaryAssetName,
            Field::NumAnimations => CommandKind::SetAnimationCount,
            Field::KfFileName => CommandKind::SetAnimationAssetName,
            Field::EventCode => CommandKind::SetAnimationEventCode,
            Field::Index => CommandKind::SetAnimationIndexAttr,
            Field::NumTransitions => CommandKind::SetAnimationTransitionCount,
            Field::TransitionAnimation => CommandKind::SetTransitionTarget,
            Field::TransitionType => CommandKind::SetTransitionKind,
        };
        Some(kind)
    }

    /// Convert into a command
    pub fn to_command(&self) -> Result<Command, EditError> {
        let Some(field) = Field::from_label(&self.field) else {
            return Err(EditError::Unsupported(format!("unknown field '{}'", self.field)));
        };
        let label = field.label();
        let command = match field {
            Field::HeaderString => {
                return Err(EditError::Unsupported(format!("field '{label}' is read-only")));
            }
            Field::NifFileName => Command::SetPrimaryAssetName {
                name: self.value.clone(),
            },
            Field::NumAnimations => Command::SetAnimationCount {
                count: parse_count(label, &self.value)?,
            },
            Field::KfFileName => Command::SetAnimationAssetName {
                animation: self.require_animation(label)?,
                name: self.value.clone(),
            },
            Field::EventCode => Command::SetAnimationEventCode {
                animation: self.require_animation(label)?,
                event_code: parse_int(label, &self.value)?,
            },
            Field::Index => Command::SetAnimationIndexAttr {
                animation: self.require_animation(label)?,
                index: parse_int(label, &self.value)?,
            },
            Field::NumTransitions => Command::SetAnimationTransitionCount {
                animation: self.require_animation(label)?,
                count: parse_count(label, &self.value)?,
            },
            Field::TransitionAnimation => Command::SetTransitionTarget {
                animation: self.require_animation(label)?,
                transition: self.require_transition(label)?,
                event_code: parse_int(label, &self.value)?,
            },
            Field::TransitionType => Command::SetTransitionKind {
                animation: self.require_animation(label)?,
                transition: self.require_transition(label)?,
                kind: parse_int(label, &self.value)?,
            },
        };
        Ok(command)
    }

    fn require_animation(&self, field: &'static str) -> Result<usize, OperationError> {
        self.animation
            .ok_or(OperationError::MissingAnimationIndex { field })
    }

    fn require_transition(&self, field: &'static str) -> Result<usize, OperationError> {
        self.transition
            .ok_or(OperationError::MissingTransitionIndex { field })
    }
}

fn parse_int(field: &'static str, value: &str) -> Result<i32, OperationError> {
    value
        .trim()
        .parse()
        .map_err(|_| OperationError::NotANumber {
            field,
            value: value.to_string(),
        })
}

fn parse_count(field: &'static str, value: &str) -> Result<usize, OperationError> {
    let parsed: i64 = value
        .trim()
        .parse()
        .map_err(|_| OperationError::NotANumber {
            field,
            value: value.to_string(),
        })?;
    usize::try_from(parsed).map_err(|_| OperationError::NegativeCount {
        field,
        value: parsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_transcript_format() {
        let command = Command::SetAnimationCount { count: 3 };
        assert_eq!(command.to_string(), "set_animation_count : 3");

        let command = Command::RemoveAnimation { animation: 0 };
        assert_eq!(command.to_string(), "remove_animation");
    }

    #[test]
    fn test_field_labels_round_trip() {
        for field in Field::all() {
            assert_eq!(Field::from_label(field.label()), Some(*field));
        }
        assert_eq!(Field::from_label("Transitions"), None);
    }

    #[test]
    fn test_field_edit_parses_numbers() {
        let edit = FieldEdit::new(Field::EventCode, " 12 ").on_animation(1);
        assert_eq!(
            edit.to_command().unwrap(),
            Command::SetAnimationEventCode {
                animation: 1,
                event_code: 12,
            }
        );

        let edit = FieldEdit::new(Field::TransitionType, "2")
            .on_animation(0)
            .on_transition(3);
        assert_eq!(
            edit.to_command().unwrap(),
            Command::SetTransitionKind {
                animation: 0,
                transition: 3,
                kind: 2,
            }
        );
    }

    #[test]
    fn test_field_edit_rejects_bad_input() {
        let edit = FieldEdit::new(Field::NumAnimations, "three");
        assert!(matches!(
            edit.to_command(),
            Err(EditError::Operation(OperationError::NotANumber { .. }))
        ));

        let edit = FieldEdit::new(Field::NumAnimations, "-1");
        assert_eq!(
            edit.to_command(),
            Err(EditError::Operation(OperationError::NegativeCount {
                field: "Num Animations",
                value: -1,
            }))
        );

        let edit = FieldEdit::new(Field::Index, "4");
        assert!(matches!(
            edit.to_command(),
            Err(EditError::Operation(OperationError::MissingAnimationIndex { .. }))
        ));
    }

    #[test]
    fn test_field_edit_unsupported_fields() {
        let edit = FieldEdit::new(Field::HeaderString, "3.0");
        assert!(matches!(edit.to_command(), Err(EditError::Unsupported(_))));
        assert_eq!(edit.kind(), None);

        let edit = FieldEdit {
            field: "Transitions".to_string(),
            value: String::new(),
            animation: None,
            transition: None,
        };
        assert!(matches!(edit.to_command(), Err(EditError::Unsupported(_))));
    }

    #[test]
    fn test_command_ron_round_trip() {
        let command = Command::SetTransitionTarget {
            animation: 0,
            transition: 1,
            event_code: 7,
        };
        let text = ron::to_string(&command).unwrap();
        let loaded: Command = ron::from_str(&text).unwrap();
        assert_eq!(loaded, command);
    }
}
