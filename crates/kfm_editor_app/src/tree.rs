// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tree view - `Name | Type | Value` rows over a KFM document.
//!
//! Rows are identified by their label path (`["Animations", "Animation 2",
//! "Event Code"]`). Expansion state is a set of such paths so it survives a
//! rebuild after every command.

use kfm_editor_core::{Applied, Command, EditObserver, ExecuteResult, Field, FieldEdit, Removal};
use kfm_editor_format::Document;
use std::collections::HashSet;
use std::fmt::Write as _;

/// Label path of a row
pub type RowPath = Vec<String>;

/// What a row stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Editable or read-only leaf
    Field(Field),
    /// The `Animations` group
    Animations,
    /// One `Animation N`
    Animation,
    /// The `Transitions` group of an animation
    Transitions,
    /// One `Transition N`
    Transition,
}

/// One rendered row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    /// Labels from the root down to this row
    pub path: RowPath,
    /// Type column
    pub type_name: &'static str,
    /// Value column
    pub value: String,
    /// What the row stands for
    pub kind: RowKind,
    /// Owning animation position
    pub animation: Option<usize>,
    /// Owning transition position
    pub transition: Option<usize>,
    /// Whether the row has children
    pub has_children: bool,
}

impl TreeRow {
    /// The Name column
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Nesting depth, 0 for top-level rows
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Edit that writes `value` into this row, if the row is editable
    pub fn edit(&self, value: impl Into<String>) -> Option<FieldEdit> {
        let RowKind::Field(field) = self.kind else {
            return None;
        };
        if !field.is_editable() {
            return None;
        }
        Some(FieldEdit {
            field: field.label().to_string(),
            value: value.into(),
            animation: self.animation,
            transition: self.transition,
        })
    }

    /// Command that deletes the item this row stands for
    pub fn remove_command(&self) -> Option<Command> {
        match (self.kind, self.animation, self.transition) {
            (RowKind::Animation, Some(animation), _) => {
                Some(Command::RemoveAnimation { animation })
            }
            (RowKind::Transition, Some(animation), Some(transition)) => {
                Some(Command::RemoveTransition { animation, transition })
            }
            _ => None,
        }
    }
}

fn animation_label(animation: usize) -> String {
    format!("Animation {}", animation + 1)
}

fn transition_label(transition: usize) -> String {
    format!("Transition {}", transition + 1)
}

/// Tree view state
#[derive(Debug, Default)]
pub struct TreeView {
    expanded: HashSet<RowPath>,
    transcript: String,
}

impl TreeView {
    /// Create a view with everything collapsed
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row of `document`, depth first
    pub fn rows(&self, document: &Document) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        let leaf = |path: RowPath,
                    field: Field,
                    type_name: &'static str,
                    value: String,
                    animation: Option<usize>,
                    transition: Option<usize>| TreeRow {
            path,
            type_name,
            value,
            kind: RowKind::Field(field),
            animation,
            transition,
            has_children: false,
        };

        rows.push(leaf(
            vec![Field::HeaderString.label().to_string()],
            Field::HeaderString,
            "HeaderString",
            document.version.to_string(),
            None,
            None,
        ));
        rows.push(leaf(
            vec![Field::NifFileName.label().to_string()],
            Field::NifFileName,
            "SizedString",
            document.primary_asset_name.clone(),
            None,
            None,
        ));
        rows.push(leaf(
            vec![Field::NumAnimations.label().to_string()],
            Field::NumAnimations,
            "int",
            document.animation_count().to_string(),
            None,
            None,
        ));

        let animations = vec!["Animations".to_string()];
        rows.push(TreeRow {
            path: animations.clone(),
            type_name: "Animation[]",
            value: String::new(),
            kind: RowKind::Animations,
            animation: None,
            transition: None,
            has_children: !document.animations.is_empty(),
        });

        for (a, animation) in document.animations.iter().enumerate() {
            let mut base = animations.clone();
            base.push(animation_label(a));
            rows.push(TreeRow {
                path: base.clone(),
                type_name: "Animation",
                value: String::new(),
                kind: RowKind::Animation,
                animation: Some(a),
                transition: None,
                has_children: true,
            });

            let child = |label: &str| {
                let mut path = base.clone();
                path.push(label.to_string());
                path
            };
            rows.push(leaf(
                child(Field::KfFileName.label()),
                Field::KfFileName,
                "SizedString",
                animation.asset_name.clone(),
                Some(a),
                None,
            ));
            rows.push(leaf(
                child(Field::EventCode.label()),
                Field::EventCode,
                "int",
                animation.event_code.to_string(),
                Some(a),
                None,
            ));
            rows.push(leaf(
                child(Field::Index.label()),
                Field::Index,
                "int",
                animation.index.to_string(),
                Some(a),
                None,
            ));
            rows.push(leaf(
                child(Field::NumTransitions.label()),
                Field::NumTransitions,
                "int",
                animation.transitions.len().to_string(),
                Some(a),
                None,
            ));

            let transitions = child("Transitions");
            rows.push(TreeRow {
                path: transitions.clone(),
                type_name: "Transitions[]",
                value: String::new(),
                kind: RowKind::Transitions,
                animation: Some(a),
                transition: None,
                has_children: !animation.transitions.is_empty(),
            });

            for (t, transition) in animation.transitions.iter().enumerate() {
                let mut item = transitions.clone();
                item.push(transition_label(t));
                rows.push(TreeRow {
                    path: item.clone(),
                    type_name: "Transition",
                    value: String::new(),
                    kind: RowKind::Transition,
                    animation: Some(a),
                    transition: Some(t),
                    has_children: true,
                });

                let mut target = item.clone();
                target.push(Field::TransitionAnimation.label().to_string());
                rows.push(leaf(
                    target,
                    Field::TransitionAnimation,
                    "int",
                    transition.target_event_code.to_string(),
                    Some(a),
                    Some(t),
                ));
                let mut kind = item;
                kind.push(Field::TransitionType.label().to_string());
                rows.push(leaf(
                    kind,
                    Field::TransitionType,
                    "int",
                    transition.kind.to_string(),
                    Some(a),
                    Some(t),
                ));
            }
        }

        rows
    }

    /// Rows whose ancestors are all expanded
    pub fn visible_rows(&self, document: &Document) -> Vec<TreeRow> {
        self.rows(document)
            .into_iter()
            .filter(|row| (1..row.path.len()).all(|end| self.expanded.contains(&row.path[..end])))
            .collect()
    }

    /// Find a row by its label path
    pub fn find(&self, document: &Document, path: &[&str]) -> Option<TreeRow> {
        self.rows(document)
            .into_iter()
            .find(|row| row.path.iter().map(String::as_str).eq(path.iter().copied()))
    }

    /// Check if a row is expanded
    pub fn is_expanded(&self, path: &[String]) -> bool {
        self.expanded.contains(path)
    }

    /// Expand or collapse a row
    pub fn toggle(&mut self, path: &[String]) {
        if !self.expanded.remove(path) {
            self.expanded.insert(path.to_vec());
        }
    }

    /// Expand a row
    pub fn expand(&mut self, path: &[String]) {
        self.expanded.insert(path.to_vec());
    }

    /// Collapse a row
    pub fn collapse(&mut self, path: &[String]) {
        self.expanded.remove(path);
    }

    /// Expand every row that has children
    pub fn expand_all(&mut self, document: &Document) {
        for row in self.rows(document) {
            if row.has_children {
                self.expanded.insert(row.path);
            }
        }
    }

    /// Collapse everything
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Transcript text received on the last undo/redo
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Render the visible rows as indented `Name | Type | Value` lines
    pub fn render(&self, document: &Document) -> String {
        let mut out = String::from("Name | Type | Value\n");
        for row in self.visible_rows(document) {
            let marker = match (row.has_children, self.expanded.contains(&row.path)) {
                (false, _) => "  ",
                (true, true) => "v ",
                (true, false) => "> ",
            };
            let _ = writeln!(
                out,
                "{}{marker}{} | {} | {}",
                "  ".repeat(row.depth()),
                row.name(),
                row.type_name,
                row.value
            );
        }
        out
    }

    fn forget_removed(&mut self, removed: Removal) {
        match removed {
            Removal::Animation(animation) => {
                let label = animation_label(animation);
                self.expanded.retain(|path| !path.contains(&label));
            }
            Removal::Transition { animation, transition } => {
                let owner = animation_label(animation);
                let label = transition_label(transition);
                self.expanded
                    .retain(|path| !(path.contains(&owner) && path.contains(&label)));
            }
        }
    }
}

impl EditObserver for TreeView {
    fn command_finished(&mut self, result: &ExecuteResult) {
        if let Ok(Applied {
            removed: Some(removed),
            ..
        }) = result
        {
            self.forget_removed(*removed);
        }
    }

    fn history_restored(&mut self, transcript: &str) {
        self.transcript = transcript.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfm_editor_core::{CommandKind, Dispatcher};
    use kfm_editor_format::{Animation, DEFAULT_TRANSITION_KIND};

    fn pair() -> Document {
        Document::new("actor.nif")
            .with_animation(
                Animation::new("idle.kf", 5).with_transition(6, DEFAULT_TRANSITION_KIND),
            )
            .with_animation(
                Animation::new("walk.kf", 6).with_transition(5, DEFAULT_TRANSITION_KIND),
            )
    }

    fn path(labels: &[&str]) -> RowPath {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rows_follow_document_layout() {
        let view = TreeView::new();
        let rows = view.rows(&pair());
        // 4 top-level rows, 2 animations x (1 + 4 + 1 + 1 transition x 3)
        assert_eq!(rows.len(), 4 + 2 * 9);

        let names: Vec<_> = rows.iter().take(4).map(TreeRow::name).collect();
        assert_eq!(names, ["Header String", "NIF File Name", "Num Animations", "Animations"]);

        let target = view
            .find(
                &pair(),
                &["Animations", "Animation 2", "Transitions", "Transition 1", "Animation"],
            )
            .unwrap();
        assert_eq!(target.value, "5");
        assert_eq!(target.animation, Some(1));
        assert_eq!(target.transition, Some(0));
        assert_eq!(target.depth(), 4);
    }

    #[test]
    fn test_collapsed_view_shows_top_level_only() {
        let view = TreeView::new();
        let rendered = view.render(&pair());
        assert_eq!(
            rendered,
            "Name | Type | Value\n\
             \x20 Header String | HeaderString | 2.2.0.0b\n\
             \x20 NIF File Name | SizedString | actor.nif\n\
             \x20 Num Animations | int | 2\n\
             > Animations | Animation[] | \n"
        );
    }

    #[test]
    fn test_expand_and_toggle() {
        let mut view = TreeView::new();
        let document = pair();
        view.expand(&path(&["Animations"]));
        assert_eq!(view.visible_rows(&document).len(), 6);

        view.toggle(&path(&["Animations", "Animation 1"]));
        assert_eq!(view.visible_rows(&document).len(), 11);
        view.toggle(&path(&["Animations", "Animation 1"]));
        assert_eq!(view.visible_rows(&document).len(), 6);

        view.expand_all(&document);
        assert_eq!(view.visible_rows(&document).len(), view.rows(&document).len());
        view.collapse_all();
        assert_eq!(view.visible_rows(&document).len(), 4);
    }

    #[test]
    fn test_row_edits_and_removals() {
        let view = TreeView::new();
        let document = pair();

        let header = view.find(&document, &["Header String"]).unwrap();
        assert_eq!(header.edit("3.0"), None);

        let code = view
            .find(&document, &["Animations", "Animation 2", "Event Code"])
            .unwrap();
        let edit = code.edit("9").unwrap();
        assert_eq!(edit.kind(), Some(CommandKind::SetAnimationEventCode));
        assert_eq!(
            edit.to_command().unwrap(),
            Command::SetAnimationEventCode {
                animation: 1,
                event_code: 9,
            }
        );

        let transition = view
            .find(&document, &["Animations", "Animation 1", "Transitions", "Transition 1"])
            .unwrap();
        assert_eq!(
            transition.remove_command(),
            Some(Command::RemoveTransition {
                animation: 0,
                transition: 0,
            })
        );
        assert_eq!(code.remove_command(), None);
    }

    #[test]
    fn test_removal_drops_expanded_paths() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.load(pair()).unwrap();
        let mut view = TreeView::new();
        view.expand_all(dispatcher.document().unwrap());

        dispatcher
            .execute_with(
                Command::RemoveTransition {
                    animation: 1,
                    transition: 0,
                },
                &mut view,
            )
            .unwrap();
        let second = path(&["Animations", "Animation 2", "Transitions", "Transition 1"]);
        let first = path(&["Animations", "Animation 1", "Transitions", "Transition 1"]);
        assert!(!view.is_expanded(&second));
        assert!(view.is_expanded(&first));

        dispatcher
            .execute_with(Command::RemoveAnimation { animation: 0 }, &mut view)
            .unwrap();
        assert!(!view.is_expanded(&path(&["Animations", "Animation 1"])));
        assert!(view.is_expanded(&path(&["Animations"])));
        assert!(view.is_expanded(&path(&["Animations", "Animation 2"])));
    }

    #[test]
    fn test_undo_hands_transcript_to_view() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.load(pair()).unwrap();
        let mut view = TreeView::new();

        dispatcher
            .execute_with(Command::SetAnimationCount { count: 3 }, &mut view)
            .unwrap();
        let grown = dispatcher.transcript().text();
        dispatcher.undo(&mut view).unwrap();
        assert_eq!(view.transcript(), "");
        dispatcher.redo(&mut view).unwrap();
        assert_eq!(view.transcript(), grown);
    }
}
