//! Draw pass — paint a laid-out tree onto a [`Surface`].
//!
//! Drawing is a flat loop over the placements produced by
//! [`compute_layout`]: edges first, then boxes, so boxes always sit on top
//! of the lines running into them.

use image::Rgba;

use super::format::format_earnings;
use super::layout::{compute_layout, Placement, CORNER_RADIUS, NODE_HEIGHT, NODE_WIDTH, TOGGLE_RADIUS};
use super::tree::TreeNode;
use super::view::{Point, ViewState};

// ───────────────────────────────────────── surface ───────────

/// Global transform: translate by `offset`, then scale by `scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub offset: Point,
    pub scale: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        offset: Point::ORIGIN,
        scale: 1.0,
    };

    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.offset.x + p.x * self.scale, self.offset.y + p.y * self.scale)
    }
}

/// Axis-aligned rectangle in untransformed coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub center: Point,
    pub width: f64,
    pub height: f64,
}

/// Which piece of a node a text run belongs to (drives styling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Name,
    Earnings,
    Toggle,
}

/// A drawing target.  Coordinates are untransformed; the surface applies the
/// transform set by [`Surface::set_transform`].
pub trait Surface {
    /// Logical width used to anchor the root.
    fn width(&self) -> f64;
    fn clear(&mut self, color: Rgba<u8>);
    fn set_transform(&mut self, transform: Transform);
    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba<u8>);
    fn fill_rounded_rect(&mut self, rect: RectF, radius: f64, color: Rgba<u8>);
    fn stroke_rounded_rect(&mut self, rect: RectF, radius: f64, width: f64, color: Rgba<u8>);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba<u8>);
    /// Centred text; `max_width` bounds it to the node box.
    fn text(&mut self, center: Point, text: &str, max_width: f64, role: TextRole, color: Rgba<u8>);
}

// ───────────────────────────────────────── palette ───────────

/// Colours for the canvas.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Rgba<u8>,
    pub edge: Rgba<u8>,
    pub node_fill: Rgba<u8>,
    pub node_fill_selected: Rgba<u8>,
    pub border: Rgba<u8>,
    pub border_selected: Rgba<u8>,
    pub name: Rgba<u8>,
    pub earnings: Rgba<u8>,
    pub active: Rgba<u8>,
    pub inactive: Rgba<u8>,
    pub toggle_fill: Rgba<u8>,
    pub toggle_text: Rgba<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgba([17, 24, 39, 255]),
            edge: Rgba([100, 116, 139, 255]),
            node_fill: Rgba([31, 41, 55, 255]),
            node_fill_selected: Rgba([30, 58, 138, 255]),
            border: Rgba([75, 85, 99, 255]),
            border_selected: Rgba([96, 165, 250, 255]),
            name: Rgba([243, 244, 246, 255]),
            earnings: Rgba([52, 211, 153, 255]),
            active: Rgba([34, 197, 94, 255]),
            inactive: Rgba([156, 163, 175, 255]),
            toggle_fill: Rgba([99, 102, 241, 255]),
            toggle_text: Rgba([255, 255, 255, 255]),
        }
    }
}

const EDGE_WIDTH: f64 = 2.0;
const BORDER_WIDTH: f64 = 1.0;
const BORDER_WIDTH_SELECTED: f64 = 3.0;
const STATUS_DOT_RADIUS: f64 = 5.0;

// ───────────────────────────────────────── draw ──────────────

/// Clear `surface` and draw the tree rooted at `root` under `view`.
///
/// With no root the surface is only cleared.
pub fn draw<S: Surface>(root: Option<&TreeNode>, view: &ViewState, palette: &Palette, surface: &mut S) {
    surface.set_transform(Transform::IDENTITY);
    surface.clear(palette.background);

    let Some(root) = root else {
        return;
    };
    let placements = compute_layout(root, view, surface.width());
    surface.set_transform(Transform {
        offset: view.position,
        scale: view.zoom,
    });
    draw_placements(&placements, view, palette, surface);
}

/// Paint already-computed placements; the transform must already be set.
fn draw_placements<S: Surface>(
    placements: &[Placement<'_>],
    view: &ViewState,
    palette: &Palette,
    surface: &mut S,
) {
    for p in placements {
        if let Some(parent) = p.parent.and_then(|i| placements.get(i)) {
            surface.stroke_line(parent.bottom(), p.top(), EDGE_WIDTH, palette.edge);
        }
    }
    for p in placements {
        draw_node(p, view.is_selected(p.node_id()), view.is_expanded(p.node_id()), palette, surface);
    }
}

fn draw_node<S: Surface>(p: &Placement<'_>, selected: bool, expanded: bool, palette: &Palette, surface: &mut S) {
    let rect = RectF {
        center: p.center(),
        width: NODE_WIDTH,
        height: NODE_HEIGHT,
    };
    let (fill, border, border_width) = if selected {
        (palette.node_fill_selected, palette.border_selected, BORDER_WIDTH_SELECTED)
    } else {
        (palette.node_fill, palette.border, BORDER_WIDTH)
    };
    surface.fill_rounded_rect(rect, CORNER_RADIUS, fill);
    surface.stroke_rounded_rect(rect, CORNER_RADIUS, border_width, border);

    let label_width = NODE_WIDTH - 24.0;
    surface.text(
        Point::new(p.x, p.y - 12.0),
        &p.node.name,
        label_width,
        TextRole::Name,
        palette.name,
    );
    surface.text(
        Point::new(p.x, p.y + 10.0),
        &format_earnings(p.node.earnings),
        label_width,
        TextRole::Earnings,
        palette.earnings,
    );

    let dot = Point::new(p.x - NODE_WIDTH / 2.0 + 12.0, p.y - NODE_HEIGHT / 2.0 + 12.0);
    let dot_color = if p.node.is_active { palette.active } else { palette.inactive };
    surface.fill_circle(dot, STATUS_DOT_RADIUS, dot_color);

    if p.node.has_children() {
        let center = p.toggle_center();
        surface.fill_circle(center, TOGGLE_RADIUS, palette.toggle_fill);
        let glyph = if expanded { "−" } else { "+" };
        surface.text(center, glyph, TOGGLE_RADIUS * 2.0, TextRole::Toggle, palette.toggle_text);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::tree::tests::node;

    /// Records every call so tests can count what got drawn.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub width: f64,
        pub transform: Option<Transform>,
        pub clears: usize,
        pub lines: Vec<(Point, Point)>,
        pub boxes: Vec<(RectF, Rgba<u8>)>,
        pub borders: Vec<(RectF, f64)>,
        pub circles: Vec<(Point, Rgba<u8>)>,
        pub texts: Vec<(String, TextRole)>,
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> f64 {
            self.width
        }
        fn clear(&mut self, _color: Rgba<u8>) {
            self.clears += 1;
        }
        fn set_transform(&mut self, transform: Transform) {
            self.transform = Some(transform);
        }
        fn stroke_line(&mut self, from: Point, to: Point, _width: f64, _color: Rgba<u8>) {
            self.lines.push((from, to));
        }
        fn fill_rounded_rect(&mut self, rect: RectF, _radius: f64, color: Rgba<u8>) {
            self.boxes.push((rect, color));
        }
        fn stroke_rounded_rect(&mut self, rect: RectF, _radius: f64, width: f64, _color: Rgba<u8>) {
            self.borders.push((rect, width));
        }
        fn fill_circle(&mut self, center: Point, _radius: f64, color: Rgba<u8>) {
            self.circles.push((center, color));
        }
        fn text(&mut self, _center: Point, text: &str, _max: f64, role: TextRole, _color: Rgba<u8>) {
            self.texts.push((text.to_string(), role));
        }
    }

    fn toggles(s: &RecordingSurface) -> usize {
        s.texts.iter().filter(|(_, r)| *r == TextRole::Toggle).count()
    }

    fn alice() -> TreeNode {
        let mut root = node(
            "u1",
            "Alice",
            vec![node("u2", "Bob", vec![]), node("u3", "Cara", vec![])],
        );
        root.earnings = 500.0;
        root.children[0].earnings = 200.0;
        root.children[1].is_active = false;
        root
    }

    #[test]
    fn example_scenario_draws_two_edges_and_one_toggle() {
        let tree = alice();
        let view = ViewState::default().toggle_expand("u1");
        let mut surface = RecordingSurface {
            width: 800.0,
            ..Default::default()
        };
        draw(Some(&tree), &view, &Palette::default(), &mut surface);

        assert_eq!(surface.clears, 1);
        assert_eq!(surface.lines.len(), 2);
        assert_eq!(surface.boxes.len(), 3);
        assert_eq!(toggles(&surface), 1);
        assert!(surface.texts.contains(&("−".to_string(), TextRole::Toggle)));
        assert!(surface.texts.contains(&("$500.00".to_string(), TextRole::Earnings)));

        // Edges run bottom-centre → top-centre.
        let (from, to) = surface.lines[0];
        assert_eq!(from, Point::new(400.0, 50.0 + NODE_HEIGHT / 2.0));
        assert_eq!(to, Point::new(310.0, 150.0 - NODE_HEIGHT / 2.0));
    }

    #[test]
    fn collapsed_parent_still_shows_plus() {
        let tree = alice();
        let mut surface = RecordingSurface::default();
        draw(Some(&tree), &ViewState::default(), &Palette::default(), &mut surface);
        assert!(surface.lines.is_empty());
        assert_eq!(surface.texts.iter().filter(|(t, _)| t == "+").count(), 1);
    }

    #[test]
    fn leaves_never_get_a_toggle() {
        let tree = node("solo", "Solo", vec![]);
        // Even when the leaf is (pointlessly) in the expanded set.
        let view = ViewState::default().toggle_expand("solo");
        let mut surface = RecordingSurface::default();
        draw(Some(&tree), &view, &Palette::default(), &mut surface);
        assert_eq!(toggles(&surface), 0);
        assert!(surface.lines.is_empty());
    }

    #[test]
    fn empty_tree_only_clears() {
        let mut surface = RecordingSurface::default();
        draw(None, &ViewState::default(), &Palette::default(), &mut surface);
        assert_eq!(surface.clears, 1);
        assert!(surface.boxes.is_empty() && surface.texts.is_empty());
    }

    #[test]
    fn selected_node_is_emphasised() {
        let tree = alice();
        let palette = Palette::default();
        let view = ViewState::default().toggle_expand("u1").select(&tree.children[1]);
        let mut surface = RecordingSurface::default();
        draw(Some(&tree), &view, &palette, &mut surface);

        let selected_fills = surface.boxes.iter().filter(|(_, c)| *c == palette.node_fill_selected).count();
        assert_eq!(selected_fills, 1);
        let thick = surface.borders.iter().filter(|(_, w)| *w == BORDER_WIDTH_SELECTED).count();
        assert_eq!(thick, 1);
    }

    #[test]
    fn transform_is_pan_then_zoom() {
        let tree = alice();
        let view = (0..5)
            .fold(ViewState::default(), |v, _| v.zoom_in())
            .pan_by(Point::new(5.0, 7.0));
        let mut surface = RecordingSurface::default();
        draw(Some(&tree), &view, &Palette::default(), &mut surface);
        let t = surface.transform.unwrap();
        assert_eq!(t.offset, Point::new(5.0, 7.0));
        assert_eq!(t.scale, 1.5);
        assert_eq!(t.apply(Point::new(10.0, 10.0)), Point::new(20.0, 22.0));
    }
}
