//! Layout pass — assign an (x, y) to every visible node.
//!
//! The layout is a fixed grid: children fan out under their parent with a
//! constant horizontal spacing and sit one constant step lower, whatever the
//! size of their own subtrees.  Wide sibling subtrees can therefore overlap.
//! The result is a flat list of [`Placement`]s in pre-order, which the draw
//! pass walks without recursing.

use super::tree::TreeNode;
use super::view::{Point, ViewState};

pub const HORIZONTAL_SPACING: f64 = 180.0;
pub const VERTICAL_SPACING: f64 = 100.0;
pub const TOP_MARGIN: f64 = 50.0;

pub const NODE_WIDTH: f64 = 140.0;
pub const NODE_HEIGHT: f64 = 60.0;
pub const CORNER_RADIUS: f64 = 8.0;

/// Centre of the +/− toggle, relative to the node centre (top-right corner).
pub const TOGGLE_OFFSET: Point = Point {
    x: NODE_WIDTH / 2.0 - 12.0,
    y: -NODE_HEIGHT / 2.0 + 12.0,
};
pub const TOGGLE_RADIUS: f64 = 8.0;

/// One laid-out, visible node.  `(x, y)` is the centre of its box in
/// untransformed surface coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement<'a> {
    pub node: &'a TreeNode,
    pub x: f64,
    pub y: f64,
    pub level: usize,
    /// Index of the parent placement in the same list (`None` for the root).
    pub parent: Option<usize>,
}

impl Placement<'_> {
    pub fn node_id(&self) -> &str {
        &self.node.id
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Bottom-centre of the box, where edges to children start.
    pub fn bottom(&self) -> Point {
        Point::new(self.x, self.y + NODE_HEIGHT / 2.0)
    }

    /// Top-centre of the box, where the edge from the parent ends.
    pub fn top(&self) -> Point {
        Point::new(self.x, self.y - NODE_HEIGHT / 2.0)
    }

    pub fn toggle_center(&self) -> Point {
        self.center() + TOGGLE_OFFSET
    }
}

/// Anchor of the root: horizontal centre of the viewport, fixed top margin.
pub fn root_anchor(viewport_width: f64) -> Point {
    Point::new(viewport_width / 2.0, TOP_MARGIN)
}

/// Lay out every visible node below `root`.
pub fn compute_layout<'a>(root: &'a TreeNode, view: &ViewState, viewport_width: f64) -> Vec<Placement<'a>> {
    let mut out = Vec::new();
    let anchor = root_anchor(viewport_width);
    place(root, anchor.x, anchor.y, 0, None, view, &mut out);
    out
}

fn place<'a>(
    node: &'a TreeNode,
    x: f64,
    y: f64,
    level: usize,
    parent: Option<usize>,
    view: &ViewState,
    out: &mut Vec<Placement<'a>>,
) {
    let index = out.len();
    out.push(Placement {
        node,
        x,
        y,
        level,
        parent,
    });

    if !view.is_expanded(&node.id) || node.children.is_empty() {
        return;
    }

    let total_width = (node.children.len() - 1) as f64 * HORIZONTAL_SPACING;
    let first_x = x - total_width / 2.0;
    for (i, child) in node.children.iter().enumerate() {
        let child_x = first_x + i as f64 * HORIZONTAL_SPACING;
        place(child, child_x, y + VERTICAL_SPACING, level + 1, Some(index), view, out);
    }
}

// ───────────────────────────────────────── hit testing ───────

/// What a click landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    /// The +/− affordance of the node with this id.
    Toggle(String),
    /// The body of the node with this id.
    Node(String),
}

/// Map a surface-space pointer back through the view transform and find the
/// topmost node (or toggle) under it.  Later placements are drawn on top, so
/// they win.
///
/// `slop` widens the toggle target by that many surface pixels, for pointers
/// coarser than one pixel (a terminal cell).
pub fn hit_test(placements: &[Placement<'_>], view: &ViewState, pointer: Point, slop: f64) -> Option<Hit> {
    let world = Point::new(
        (pointer.x - view.position.x) / view.zoom,
        (pointer.y - view.position.y) / view.zoom,
    );
    let toggle_radius = TOGGLE_RADIUS + slop / view.zoom;

    for p in placements.iter().rev() {
        if p.node.has_children() {
            let t = p.toggle_center();
            let (dx, dy) = (world.x - t.x, world.y - t.y);
            if dx * dx + dy * dy <= toggle_radius * toggle_radius {
                return Some(Hit::Toggle(p.node.id.clone()));
            }
        }
        if (world.x - p.x).abs() <= NODE_WIDTH / 2.0 && (world.y - p.y).abs() <= NODE_HEIGHT / 2.0 {
            return Some(Hit::Node(p.node.id.clone()));
        }
    }
    None
}
