//! Ephemeral view state of the tree canvas — pan, zoom, expansion, selection.
//!
//! [`ViewState`] is a plain value.  Every transition borrows the current state
//! and returns the next one, so the event handler is a reducer and every
//! gesture can be tested without a terminal.

use std::collections::HashSet;

use super::tree::TreeNode;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;

/// Nodes down to and including this level start expanded.
pub const INITIAL_EXPAND_DEPTH: usize = 2;

/// A 2D point / offset in surface pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Scale factor, always within [`MIN_ZOOM`, `MAX_ZOOM`].
    pub zoom: f64,
    /// Pan translation applied before scaling.
    pub position: Point,
    /// Ids whose children are drawn.
    pub expanded: HashSet<String>,
    /// Id of the highlighted node.
    pub selected: Option<String>,
    /// `pointer - position` captured at press time; `Some` while dragging.
    pub drag_start: Option<Point>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            position: Point::ORIGIN,
            expanded: HashSet::new(),
            selected: None,
            drag_start: None,
        }
    }
}

impl ViewState {
    /// Fresh state for a newly loaded tree: every node at or above `depth` expanded.
    pub fn initial(root: &TreeNode, depth: usize) -> Self {
        let mut expanded = HashSet::new();
        expand_to_depth(root, 0, depth, &mut expanded);
        Self {
            expanded,
            ..Self::default()
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// Flip membership of `id`.  Descendant flags are left alone, so
    /// re-expanding a parent restores whatever was open underneath it.
    pub fn toggle_expand(&self, id: &str) -> Self {
        let mut expanded = self.expanded.clone();
        if !expanded.remove(id) {
            expanded.insert(id.to_string());
        }
        Self {
            expanded,
            ..self.clone()
        }
    }

    pub fn select(&self, node: &TreeNode) -> Self {
        Self {
            selected: Some(node.id.clone()),
            ..self.clone()
        }
    }

    pub fn clear_selection(&self) -> Self {
        Self {
            selected: None,
            ..self.clone()
        }
    }

    pub fn begin_drag(&self, pointer: Point) -> Self {
        Self {
            drag_start: Some(pointer - self.position),
            ..self.clone()
        }
    }

    /// 1:1 pointer-following pan.  No-op unless a drag is active.
    pub fn drag_to(&self, pointer: Point) -> Self {
        match self.drag_start {
            Some(start) => Self {
                position: pointer - start,
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    pub fn end_drag(&self) -> Self {
        Self {
            drag_start: None,
            ..self.clone()
        }
    }

    /// Shift the pan offset by `delta` (keyboard panning).
    pub fn pan_by(&self, delta: Point) -> Self {
        Self {
            position: self.position + delta,
            ..self.clone()
        }
    }

    pub fn zoom_in(&self) -> Self {
        self.with_zoom((self.zoom + ZOOM_STEP).min(MAX_ZOOM))
    }

    pub fn zoom_out(&self) -> Self {
        self.with_zoom((self.zoom - ZOOM_STEP).max(MIN_ZOOM))
    }

    pub fn reset(&self) -> Self {
        Self {
            zoom: 1.0,
            position: Point::ORIGIN,
            ..self.clone()
        }
    }

    fn with_zoom(&self, zoom: f64) -> Self {
        // Snap to tenths so repeated steps don't accumulate float drift.
        let zoom = ((zoom * 10.0).round() / 10.0).clamp(MIN_ZOOM, MAX_ZOOM);
        Self {
            zoom,
            ..self.clone()
        }
    }
}

fn expand_to_depth(node: &TreeNode, level: usize, depth: usize, out: &mut HashSet<String>) {
    if level > depth {
        return;
    }
    out.insert(node.id.clone());
    for child in &node.children {
        expand_to_depth(child, level + 1, depth, out);
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::core::tree::tests::node;

    fn sample() -> TreeNode {
        node(
            "a",
            "A",
            vec![
                node("b", "B", vec![node("d", "D", vec![node("f", "F", vec![])])]),
                node("c", "C", vec![node("e", "E", vec![])]),
            ],
        )
    }

    #[test]
    fn initial_expansion_includes_level_two() {
        let view = ViewState::initial(&sample(), INITIAL_EXPAND_DEPTH);
        for id in ["a", "b", "c", "d", "e"] {
            assert!(view.is_expanded(id), "{id} should start expanded");
        }
        for id in ["f"] {
            assert!(!view.is_expanded(id), "{id} should start collapsed");
        }
        assert_eq!(view.zoom, 1.0);
        assert_eq!(view.selected, None);
    }

    #[rstest]
    #[case("a")]
    #[case("d")]
    #[case("missing")]
    fn double_toggle_restores_membership(#[case] id: &str) {
        let view = ViewState::initial(&sample(), INITIAL_EXPAND_DEPTH);
        let twice = view.toggle_expand(id).toggle_expand(id);
        assert_eq!(twice.expanded, view.expanded);
    }

    #[test]
    fn depth_zero_expands_only_the_root() {
        let view = ViewState::initial(&sample(), 0);
        assert!(view.is_expanded("a"));
        assert!(!view.is_expanded("b"));
    }

    #[test]
    fn collapse_keeps_descendant_expansion() {
        let view = ViewState::default()
            .toggle_expand("a")
            .toggle_expand("b")
            .toggle_expand("a");
        assert!(!view.is_expanded("a"));
        assert!(view.is_expanded("b"));
        let reopened = view.toggle_expand("a");
        assert!(reopened.is_expanded("a") && reopened.is_expanded("b"));
    }

    #[test]
    fn toggle_does_not_touch_selection() {
        let tree = sample();
        let view = ViewState::default().select(&tree.children[0]);
        let toggled = view.toggle_expand("b");
        assert_eq!(toggled.selected.as_deref(), Some("b"));
    }

    #[test]
    fn select_replaces_and_keeps_expansion() {
        let tree = sample();
        let view = ViewState::initial(&tree, INITIAL_EXPAND_DEPTH);
        let picked = view.select(&tree.children[0]).select(&tree.children[1]);
        assert!(picked.is_selected("c"));
        assert!(!picked.is_selected("b"));
        assert_eq!(picked.expanded, view.expanded);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = ViewState::default();
        for _ in 0..30 {
            view = view.zoom_in();
            assert!(view.zoom <= MAX_ZOOM);
        }
        assert_eq!(view.zoom, MAX_ZOOM);
        for _ in 0..30 {
            view = view.zoom_out();
            assert!(view.zoom >= MIN_ZOOM);
        }
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn reset_restores_identity_transform() {
        let view = ViewState::default()
            .zoom_in()
            .zoom_in()
            .pan_by(Point::new(35.0, -12.0))
            .toggle_expand("a");
        let reset = view.reset();
        assert_eq!(reset.zoom, 1.0);
        assert_eq!(reset.position, Point::ORIGIN);
        assert!(reset.is_expanded("a"));
    }

    #[test]
    fn drag_follows_pointer_one_to_one() {
        let view = ViewState::default().pan_by(Point::new(10.0, 20.0));
        let dragging = view.begin_drag(Point::new(100.0, 100.0));
        assert_eq!(dragging.drag_start, Some(Point::new(90.0, 80.0)));

        let moved = dragging.drag_to(Point::new(130.0, 90.0));
        assert_eq!(moved.position, Point::new(40.0, 10.0));

        let released = moved.end_drag();
        assert!(!released.is_dragging());
        // Moves after release are ignored.
        assert_eq!(released.drag_to(Point::new(0.0, 0.0)).position, Point::new(40.0, 10.0));
    }
}
