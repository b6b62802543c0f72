// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edit operations - one mutation per command kind.
//!
//! Operations mutate the live document in place and write progress notes to
//! the transcript. They check their preconditions before mutating, and the
//! dispatcher restores the last snapshot if one fails anyway.

use crate::command::Command;
use crate::error::OperationError;
use crate::transcript::Transcript;
use kfm_editor_format::{Animation, Document, Transition, DEFAULT_TRANSITION_KIND};
use std::collections::HashSet;

/// Largest animation count growth will produce
pub const MAX_ANIMATIONS: usize = 1024;

/// Largest transition count `SetAnimationTransitionCount` will grow to
pub const MAX_TRANSITIONS: usize = 1024;

/// Element removed by a successful command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Animation at this position was deleted
    Animation(usize),
    /// Transition was deleted from an animation
    Transition {
        /// Animation position
        animation: usize,
        /// Transition position
        transition: usize,
    },
}

/// Everything an edit operation may touch
pub struct EditContext<'a> {
    /// The live document
    pub document: &'a mut Document,
    /// Where progress notes go
    pub transcript: &'a Transcript,
    /// Type tag for auto-generated transitions
    pub default_kind: i32,
}

impl<'a> EditContext<'a> {
    /// Create a context using the default transition kind
    pub fn new(document: &'a mut Document, transcript: &'a Transcript) -> Self {
        Self {
            document,
            transcript,
            default_kind: DEFAULT_TRANSITION_KIND,
        }
    }

    /// Override the kind written for auto-generated transitions
    pub fn with_default_kind(mut self, kind: i32) -> Self {
        self.default_kind = kind;
        self
    }
}

/// Apply `command` to the context's document
pub fn apply(
    command: &Command,
    ctx: &mut EditContext<'_>,
) -> Result<Option<Removal>, OperationError> {
    let doc = &mut *ctx.document;
    let transcript = ctx.transcript;
    let kind = ctx.default_kind;

    match command {
        Command::SetPrimaryAssetName { name } => {
            doc.primary_asset_name = name.clone();
        }
        Command::SetAnimationCount { count } => {
            set_animation_count(doc, transcript, kind, *count)?;
        }
        Command::SetAnimationAssetName { animation, name } => {
            animation_mut(doc, *animation)?.asset_name = name.clone();
        }
        Command::SetAnimationIndexAttr { animation, index } => {
            animation_mut(doc, *animation)?.index = *index;
        }
        Command::SetAnimationEventCode {
            animation,
            event_code,
        } => {
            rename_event_code(doc, transcript, *animation, *event_code)?;
        }
        Command::SetAnimationTransitionCount { animation, count } => {
            set_transition_count(doc, transcript, kind, *animation, *count)?;
        }
        Command::SetTransitionTarget {
            animation,
            transition,
            event_code,
        } => {
            transition_mut(doc, *animation, *transition)?;
            if !doc.contains_code(*event_code) {
                return Err(OperationError::UnknownEventCode(*event_code));
            }
            transition_mut(doc, *animation, *transition)?.target_event_code = *event_code;
        }
        Command::SetTransitionKind {
            animation,
            transition,
            kind,
        } => {
            transition_mut(doc, *animation, *transition)?.kind = *kind;
        }
        Command::RemoveAnimation { animation } => {
            remove_animation(doc, transcript, *animation)?;
            return Ok(Some(Removal::Animation(*animation)));
        }
        Command::RemoveTransition {
            animation,
            transition,
        } => {
            transition_mut(doc, *animation, *transition)?;
            doc.animations[*animation].transitions.remove(*transition);
            return Ok(Some(Removal::Transition {
                animation: *animation,
                transition: *transition,
            }));
        }
    }

    Ok(None)
}

fn note(transcript: &Transcript, line: String) {
    tracing::debug!("{line}");
    transcript.line(line);
}

fn animation_mut(doc: &mut Document, index: usize) -> Result<&mut Animation, OperationError> {
    let len = doc.animations.len();
    doc.animations
        .get_mut(index)
        .ok_or(OperationError::AnimationOutOfRange { index, len })
}

fn transition_mut(
    doc: &mut Document,
    animation: usize,
    index: usize,
) -> Result<&mut Transition, OperationError> {
    let owner = animation_mut(doc, animation)?;
    let len = owner.transitions.len();
    owner
        .transitions
        .get_mut(index)
        .ok_or(OperationError::TransitionOutOfRange {
            animation,
            index,
            len,
        })
}

/// Resize the animation list.
///
/// Growing appends animations with fresh codes above the current maximum,
/// each wired to every pre-existing animation, then gives every animation a
/// transition to each new code other than its own. Shrinking truncates and
/// refuses to orphan transitions held by the survivors.
fn set_animation_count(
    doc: &mut Document,
    transcript: &Transcript,
    kind: i32,
    count: usize,
) -> Result<(), OperationError> {
    let old = doc.animations.len();

    if count < old {
        let removed: HashSet<i32> = doc.animations[count..]
            .iter()
            .map(|a| a.event_code)
            .collect();
        for (position, animation) in doc.animations[..count].iter().enumerate() {
            if let Some(t) = animation
                .transitions
                .iter()
                .find(|t| removed.contains(&t.target_event_code))
            {
                return Err(OperationError::WouldDangle {
                    animation: position,
                    event_code: t.target_event_code,
                });
            }
        }
        doc.animations.truncate(count);
        note(transcript, format!("... removed {} animations from the end", old - count));
        return Ok(());
    }

    if count == old {
        return Ok(());
    }
    if count > MAX_ANIMATIONS {
        return Err(OperationError::TooLarge {
            field: "Num Animations",
            requested: count,
            limit: MAX_ANIMATIONS,
        });
    }

    let first_code = match doc.max_event_code() {
        Some(max) => max
            .checked_add(1)
            .ok_or(OperationError::EventCodeOverflow(max))?,
        None => 1,
    };
    let added_len = count - old;
    let last_code = i32::try_from(added_len - 1)
        .ok()
        .and_then(|offset| first_code.checked_add(offset))
        .ok_or(OperationError::EventCodeOverflow(first_code - 1))?;

    let existing: Vec<i32> = doc.animations.iter().map(|a| a.event_code).collect();
    let added: Vec<i32> = (first_code..=last_code).collect();
    if added.len() != added_len {
        return Err(OperationError::EventCodeOverflow(first_code - 1));
    }

    for &code in &added {
        let mut animation = Animation::new(String::new(), code);
        animation.transitions = existing
            .iter()
            .map(|&target| Transition::new(target, kind))
            .collect();
        doc.animations.push(animation);

        transcript.blank();
        note(transcript, format!("Next animation event code {code}"));
        note(transcript, "... adding transition to every other animation.".to_string());
    }

    for (position, animation) in doc.animations.iter_mut().enumerate() {
        for &code in &added {
            if code == animation.event_code {
                continue;
            }
            animation.transitions.push(Transition::new(code, kind));
            note(
                transcript,
                format!("... adding transition to {code} for Animation {}", position + 1),
            );
        }
    }

    Ok(())
}

/// Change an animation's event code and follow every reference to it
fn rename_event_code(
    doc: &mut Document,
    transcript: &Transcript,
    animation: usize,
    event_code: i32,
) -> Result<(), OperationError> {
    animation_mut(doc, animation)?;

    if let Some(owner) = doc.animation_by_code(event_code) {
        if owner == animation {
            return Ok(());
        }
        return Err(OperationError::DuplicateEventCode {
            event_code,
            animation: owner,
        });
    }

    let old = std::mem::replace(&mut doc.animations[animation].event_code, event_code);

    for (position, other) in doc.animations.iter_mut().enumerate() {
        for transition in other
            .transitions
            .iter_mut()
            .filter(|t| t.target_event_code == old)
        {
            transition.target_event_code = event_code;
            note(
                transcript,
                format!(
                    "... updating transition for Animation {}, event code {old} -> {event_code}",
                    position + 1
                ),
            );
        }
    }

    Ok(())
}

/// Resize one animation's transition list.
///
/// New transitions go first to animations not yet targeted, in document
/// order, then cycle through all other animations.
fn set_transition_count(
    doc: &mut Document,
    transcript: &Transcript,
    kind: i32,
    animation: usize,
    count: usize,
) -> Result<(), OperationError> {
    let owner = animation_mut(doc, animation)?;
    let current = owner.transitions.len();
    if count <= current {
        owner.transitions.truncate(count);
        return Ok(());
    }
    if count > MAX_TRANSITIONS {
        return Err(OperationError::TooLarge {
            field: "Num Transitions",
            requested: count,
            limit: MAX_TRANSITIONS,
        });
    }

    let own_code = owner.event_code;
    let targeted: HashSet<i32> = owner
        .transitions
        .iter()
        .map(|t| t.target_event_code)
        .collect();
    let others: Vec<i32> = doc
        .animations
        .iter()
        .map(|a| a.event_code)
        .filter(|&code| code != own_code)
        .collect();
    if others.is_empty() {
        return Err(OperationError::NoTransitionTarget { animation });
    }

    let targets: Vec<i32> = others
        .iter()
        .filter(|code| !targeted.contains(*code))
        .chain(others.iter().cycle())
        .take(count - current)
        .copied()
        .collect();

    let owner = &mut doc.animations[animation];
    for code in targets {
        owner.transitions.push(Transition::new(code, kind));
        note(
            transcript,
            format!("... adding transition to {code} for Animation {}", animation + 1),
        );
    }

    Ok(())
}

/// Delete an animation and the first transition to it in every other animation
fn remove_animation(
    doc: &mut Document,
    transcript: &Transcript,
    animation: usize,
) -> Result<(), OperationError> {
    animation_mut(doc, animation)?;
    let removed = doc.animations.remove(animation);
    let code = removed.event_code;

    for (position, other) in doc.animations.iter_mut().enumerate() {
        let Some(t) = other.transition_to(code) else {
            continue;
        };
        other.transitions.remove(t);
        note(
            transcript,
            format!("... removing transition for Animation {}", position + 1),
        );

        // Only the first match is excised
        let leftover = other
            .transitions
            .iter()
            .filter(|t| t.target_event_code == code)
            .count();
        if leftover > 0 {
            tracing::info!(
                animation = position,
                event_code = code,
                leftover,
                "Animation keeps transitions to a removed event code"
            );
            let number = position + 1;
            let text = format!(
                "... Animation {number} still has {leftover} transition(s) to removed code {code}"
            );
            note(transcript, text);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two animations with codes 5 and 6, wired to each other
    fn pair() -> Document {
        Document::new("actor.nif")
            .with_animation(Animation::new("idle.kf", 5).with_transition(6, 0))
            .with_animation(Animation::new("walk.kf", 6).with_transition(5, 0))
    }

    fn run(doc: &mut Document, command: Command) -> Result<Option<Removal>, OperationError> {
        let transcript = Transcript::new();
        apply(&command, &mut EditContext::new(doc, &transcript))
    }

    fn targets(animation: &Animation) -> Vec<i32> {
        animation
            .transitions
            .iter()
            .map(|t| t.target_event_code)
            .collect()
    }

    #[test]
    fn test_simple_field_edits() {
        let mut doc = pair();
        run(&mut doc, Command::SetPrimaryAssetName { name: "hero.nif".into() }).unwrap();
        run(
            &mut doc,
            Command::SetAnimationAssetName {
                animation: 1,
                name: "run.kf".into(),
            },
        )
        .unwrap();
        run(&mut doc, Command::SetAnimationIndexAttr { animation: 0, index: 9 }).unwrap();
        run(
            &mut doc,
            Command::SetTransitionKind {
                animation: 1,
                transition: 0,
                kind: 3,
            },
        )
        .unwrap();

        assert_eq!(doc.primary_asset_name, "hero.nif");
        assert_eq!(doc.animations[1].asset_name, "run.kf");
        assert_eq!(doc.animations[0].index, 9);
        assert_eq!(doc.animations[1].transitions[0].kind, 3);
    }

    #[test]
    fn test_out_of_range_indices() {
        let mut doc = pair();
        assert_eq!(
            run(&mut doc, Command::SetAnimationIndexAttr { animation: 2, index: 1 }),
            Err(OperationError::AnimationOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            run(
                &mut doc,
                Command::RemoveTransition {
                    animation: 0,
                    transition: 1,
                }
            ),
            Err(OperationError::TransitionOutOfRange {
                animation: 0,
                index: 1,
                len: 1,
            })
        );
        assert_eq!(doc, pair());
    }

    #[test]
    fn test_grow_mesh_wires_new_animations() {
        let mut doc = pair();
        let transcript = Transcript::new();
        apply(
            &Command::SetAnimationCount { count: 3 },
            &mut EditContext::new(&mut doc, &transcript),
        )
        .unwrap();

        assert_eq!(doc.animation_count(), 3);
        let added = &doc.animations[2];
        assert_eq!(added.event_code, 7);
        assert_eq!(targets(added), vec![5, 6]);
        assert!(added.transitions.iter().all(|t| t.kind == DEFAULT_TRANSITION_KIND));
        assert_eq!(targets(&doc.animations[0]), vec![6, 7]);
        assert_eq!(targets(&doc.animations[1]), vec![5, 7]);
        assert!(doc.check_integrity().is_empty());

        let text = transcript.text();
        assert!(text.contains("Next animation event code 7"));
        assert!(text.contains("... adding transition to 7 for Animation 1"));
        assert!(text.contains("... adding transition to 7 for Animation 2"));
    }

    #[test]
    fn test_grow_by_several_covers_all_new_codes() {
        let mut doc = pair();
        run(&mut doc, Command::SetAnimationCount { count: 5 }).unwrap();

        let old_codes = [5, 6];
        let new_codes = [7, 8, 9];
        for (position, animation) in doc.animations.iter().enumerate() {
            let own = animation.event_code;
            let set: HashSet<i32> = targets(animation).into_iter().collect();
            for code in new_codes.iter().filter(|&&c| c != own) {
                assert!(set.contains(code), "Animation {position} misses {code}");
            }
            assert!(!set.contains(&own));
            if position >= 2 {
                // Pre-wired to every old animation first
                assert_eq!(&targets(animation)[..2], &old_codes);
                assert_eq!(animation.transitions.len(), 2 + 2);
            }
        }
        assert!(doc.check_integrity().is_empty());
    }

    #[test]
    fn test_grow_empty_document() {
        let mut doc = Document::new("empty.nif");
        run(&mut doc, Command::SetAnimationCount { count: 2 }).unwrap();
        assert_eq!(doc.event_codes().into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(targets(&doc.animations[0]), vec![2]);
        assert_eq!(targets(&doc.animations[1]), vec![1]);
    }

    #[test]
    fn test_grow_rejects_code_overflow() {
        let mut doc =
            Document::new("edge.nif").with_animation(Animation::new("a.kf", i32::MAX - 1));
        assert!(matches!(
            run(&mut doc, Command::SetAnimationCount { count: 3 }),
            Err(OperationError::EventCodeOverflow(_))
        ));
        assert_eq!(doc.animation_count(), 1);
    }

    #[test]
    fn test_grow_rejects_oversized_counts() {
        for count in [MAX_ANIMATIONS + 1, 100_000, usize::MAX] {
            let mut doc = pair();
            assert_eq!(
                run(&mut doc, Command::SetAnimationCount { count }),
                Err(OperationError::TooLarge {
                    field: "Num Animations",
                    requested: count,
                    limit: MAX_ANIMATIONS,
                })
            );
            assert_eq!(doc, pair());
        }
    }

    #[test]
    fn test_grow_to_limit_with_high_codes_overflows() {
        let mut doc =
            Document::new("edge.nif").with_animation(Animation::new("a.kf", i32::MAX - 10));
        assert_eq!(
            run(&mut doc, Command::SetAnimationCount { count: 20 }),
            Err(OperationError::EventCodeOverflow(i32::MAX - 10))
        );
        assert_eq!(doc.animation_count(), 1);

        let mut doc =
            Document::new("edge.nif").with_animation(Animation::new("a.kf", i32::MAX - 10));
        run(&mut doc, Command::SetAnimationCount { count: 11 }).unwrap();
        assert_eq!(doc.max_event_code(), Some(i32::MAX));
    }

    #[test]
    fn test_shrink_truncates_unreferenced_tail() {
        let mut doc = pair();
        doc.animations.push(Animation::new("extra.kf", 9));
        run(&mut doc, Command::SetAnimationCount { count: 2 }).unwrap();
        assert_eq!(doc, pair());
    }

    #[test]
    fn test_shrink_refuses_to_orphan_transitions() {
        let mut doc = pair();
        assert_eq!(
            run(&mut doc, Command::SetAnimationCount { count: 1 }),
            Err(OperationError::WouldDangle {
                animation: 0,
                event_code: 6,
            })
        );
        assert_eq!(doc, pair());
    }

    #[test]
    fn test_rename_rewrites_references() {
        let mut doc = pair();
        doc.animations.push(Animation::new("jump.kf", 8).with_transition(5, 1));
        let transcript = Transcript::new();
        apply(
            &Command::SetAnimationEventCode {
                animation: 0,
                event_code: 12,
            },
            &mut EditContext::new(&mut doc, &transcript),
        )
        .unwrap();

        assert_eq!(doc.animations[0].event_code, 12);
        assert_eq!(targets(&doc.animations[1]), vec![12]);
        assert_eq!(targets(&doc.animations[2]), vec![12]);
        assert!(doc
            .animations
            .iter()
            .flat_map(|a| a.transitions.iter())
            .all(|t| t.target_event_code != 5));
        assert!(transcript
            .text()
            .contains("... updating transition for Animation 3, event code 5 -> 12"));
    }

    #[test]
    fn test_rename_rejects_duplicate() {
        let mut doc = pair();
        assert_eq!(
            run(
                &mut doc,
                Command::SetAnimationEventCode {
                    animation: 0,
                    event_code: 6,
                }
            ),
            Err(OperationError::DuplicateEventCode {
                event_code: 6,
                animation: 1,
            })
        );
        assert_eq!(doc, pair());
    }

    #[test]
    fn test_rename_to_own_code_is_noop() {
        let mut doc = pair();
        run(
            &mut doc,
            Command::SetAnimationEventCode {
                animation: 1,
                event_code: 6,
            },
        )
        .unwrap();
        assert_eq!(doc, pair());
    }

    #[test]
    fn test_transition_count_grow_prefers_untargeted() {
        let mut doc = pair();
        doc.animations.push(Animation::new("jump.kf", 8));
        run(
            &mut doc,
            Command::SetAnimationTransitionCount {
                animation: 0,
                count: 4,
            },
        )
        .unwrap();
        // 6 already targeted, so 8 comes first, then cycle 6, 8
        assert_eq!(targets(&doc.animations[0]), vec![6, 8, 6, 8]);
        assert!(doc.is_consistent());
    }

    #[test]
    fn test_transition_count_shrink_and_lonely_animation() {
        let mut doc = pair();
        run(
            &mut doc,
            Command::SetAnimationTransitionCount {
                animation: 1,
                count: 0,
            },
        )
        .unwrap();
        assert!(doc.animations[1].transitions.is_empty());

        assert_eq!(
            run(
                &mut doc,
                Command::SetAnimationTransitionCount {
                    animation: 0,
                    count: usize::MAX,
                }
            ),
            Err(OperationError::TooLarge {
                field: "Num Transitions",
                requested: usize::MAX,
                limit: MAX_TRANSITIONS,
            })
        );
        assert_eq!(doc.animations[0].transitions.len(), 1);

        let mut lonely = Document::new("solo.nif").with_animation(Animation::new("a.kf", 1));
        assert_eq!(
            run(
                &mut lonely,
                Command::SetAnimationTransitionCount {
                    animation: 0,
                    count: 1,
                }
            ),
            Err(OperationError::NoTransitionTarget { animation: 0 })
        );
    }

    #[test]
    fn test_set_transition_target_requires_existing_code() {
        let mut doc = pair();
        doc.animations.push(Animation::new("jump.kf", 8));
        assert_eq!(
            run(
                &mut doc,
                Command::SetTransitionTarget {
                    animation: 0,
                    transition: 0,
                    event_code: 99,
                }
            ),
            Err(OperationError::UnknownEventCode(99))
        );
        run(
            &mut doc,
            Command::SetTransitionTarget {
                animation: 0,
                transition: 0,
                event_code: 8,
            },
        )
        .unwrap();
        assert_eq!(targets(&doc.animations[0]), vec![8]);
    }

    #[test]
    fn test_remove_animation_compacts_and_excises() {
        let mut doc = pair();
        run(&mut doc, Command::SetAnimationCount { count: 3 }).unwrap();

        let removal = run(&mut doc, Command::RemoveAnimation { animation: 1 }).unwrap();
        assert_eq!(removal, Some(Removal::Animation(1)));
        assert_eq!(doc.event_codes().into_iter().collect::<Vec<_>>(), vec![5, 7]);
        assert_eq!(doc.animations[1].event_code, 7);
        assert_eq!(targets(&doc.animations[0]), vec![7]);
        assert_eq!(targets(&doc.animations[1]), vec![5]);
        assert!(doc.check_integrity().is_empty());
    }

    #[test]
    fn test_remove_animation_excises_first_match_only() {
        let mut doc = pair();
        doc.animations[0].transitions.push(Transition::new(6, 2));
        let transcript = Transcript::new();
        apply(
            &Command::RemoveAnimation { animation: 1 },
            &mut EditContext::new(&mut doc, &transcript),
        )
        .unwrap();

        assert_eq!(doc.animations[0].transitions, vec![Transition::new(6, 2)]);
        assert!(transcript
            .text()
            .contains("still has 1 transition(s) to removed code 6"));
    }

    #[test]
    fn test_remove_transition_preserves_order() {
        let mut doc = pair();
        run(&mut doc, Command::SetAnimationCount { count: 4 }).unwrap();
        assert_eq!(targets(&doc.animations[0]), vec![6, 7, 8]);

        let removal = run(
            &mut doc,
            Command::RemoveTransition {
                animation: 0,
                transition: 1,
            },
        )
        .unwrap();
        assert_eq!(
            removal,
            Some(Removal::Transition {
                animation: 0,
                transition: 1,
            })
        );
        assert_eq!(targets(&doc.animations[0]), vec![6, 8]);
    }

    #[test]
    fn test_custom_default_kind() {
        let mut doc = pair();
        let transcript = Transcript::new();
        apply(
            &Command::SetAnimationCount { count: 3 },
            &mut EditContext::new(&mut doc, &transcript).with_default_kind(1),
        )
        .unwrap();
        assert!(doc.animations[2].transitions.iter().all(|t| t.kind == 1));
        assert_eq!(doc.animations[0].transitions[1].kind, 1);
    }
}
