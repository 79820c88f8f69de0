//! The tree canvas: a [`RasterSurface`] painted as half-block cells, with the
//! surface's text labels overlaid as real characters.
//!
//! Each terminal cell is one device pixel wide and two tall (`▀` with the top
//! pixel as foreground and the bottom as background).  A device pixel stands
//! for 8×8 logical pixels, so a cell covers [`CELL_PX_W`]×[`CELL_PX_H`] of the
//! surface the layout works in.

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Widget},
};

use crate::core::{
    draw::{draw, Palette, TextRole},
    format::truncate,
    raster::{Label, RasterSurface},
    tree::TreeNode,
    view::{Point, ViewState},
};

use super::theme::Theme;

/// Logical pixels per terminal column.
pub const CELL_PX_W: f64 = 8.0;
/// Logical pixels per terminal row.
pub const CELL_PX_H: f64 = 16.0;
/// A mouse position is only known to the cell, so toggles get this much
/// extra reach.
pub const POINTER_SLOP: f64 = CELL_PX_H / 2.0;

const DEVICE_SCALE: f64 = 1.0 / CELL_PX_W;

/// Logical width of a canvas drawn into `area`.
pub fn surface_width(area: Rect) -> f64 {
    area.width as f64 * CELL_PX_W
}

/// Centre of the cell at (`col`, `row`) in surface coordinates, or `None`
/// when the cell is outside `area`.
pub fn pointer_to_surface(area: Rect, col: u16, row: u16) -> Option<Point> {
    if !area.contains(Position::new(col, row)) {
        return None;
    }
    Some(Point::new(
        ((col - area.x) as f64 + 0.5) * CELL_PX_W,
        ((row - area.y) as f64 + 0.5) * CELL_PX_H,
    ))
}

fn to_color(px: &image::Rgba<u8>) -> Color {
    Color::Rgb(px[0], px[1], px[2])
}

/// The canvas widget — created fresh each frame.
pub struct TreeCanvas<'a> {
    root: Option<&'a TreeNode>,
    view: &'a ViewState,
    palette: Palette,
    loading: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeCanvas<'a> {
    pub fn new(root: Option<&'a TreeNode>, view: &'a ViewState) -> Self {
        Self {
            root,
            view,
            palette: Palette::default(),
            loading: false,
            block: None,
        }
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for TreeCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(ref block) = self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let mut surface = RasterSurface::new(inner.width as u32, inner.height as u32 * 2, DEVICE_SCALE);
        draw(self.root, self.view, &self.palette, &mut surface);
        paint_halfblocks(surface.image(), inner, buf);
        // Zoomed out, a node's earnings can fall on its name's row; the name wins.
        let mut name_row = None;
        for label in surface.labels() {
            let row = label_row(label);
            match label.role {
                TextRole::Name => name_row = Some(row),
                TextRole::Earnings if name_row == Some(row) => continue,
                _ => {}
            }
            overlay_label(label, surface.image(), inner, buf);
        }

        if self.root.is_none() {
            let message = if self.loading {
                "Loading referral tree…"
            } else {
                "No referral data"
            };
            let y = inner.y + inner.height / 2;
            let width = message.chars().count() as u16;
            let x = inner.x + inner.width.saturating_sub(width) / 2;
            buf.set_stringn(x, y, message, inner.width as usize, Theme::placeholder_style());
        }
    }
}

fn paint_halfblocks(img: &image::RgbaImage, area: Rect, buf: &mut Buffer) {
    for row in 0..area.height {
        let (yt, yb) = (row as u32 * 2, row as u32 * 2 + 1);
        if yb >= img.height() {
            break;
        }
        for col in 0..(area.width as u32).min(img.width()) {
            let fg = to_color(img.get_pixel(col, yt));
            let bg = to_color(img.get_pixel(col, yb));
            if let Some(cell) = buf.cell_mut(Position::new(area.x + col as u16, area.y + row)) {
                cell.set_char('▀').set_fg(fg).set_bg(bg);
            }
        }
    }
}

fn label_row(label: &Label) -> f64 {
    (label.y / 2.0).floor()
}

/// Write a label centred on its anchor.  Each character takes the colour of
/// the pixel beneath it as background so the text sits inside its node.
fn overlay_label(label: &Label, img: &image::RgbaImage, area: Rect, buf: &mut Buffer) {
    let max_chars = label.max_width.floor().max(1.0) as usize;
    let text = truncate(&label.text, max_chars);
    let len = text.chars().count() as f64;

    let row = label_row(label);
    let first_col = (label.x - len / 2.0).round();
    if row < 0.0 || row >= area.height as f64 {
        return;
    }

    let mut style = Style::default().fg(to_color(&label.color));
    if label.role != TextRole::Earnings {
        style = style.add_modifier(Modifier::BOLD);
    }

    for (i, ch) in text.chars().enumerate() {
        let col = first_col + i as f64;
        if col < 0.0 || col >= area.width as f64 {
            continue;
        }
        let (col, row) = (col as u16, row as u16);
        let under = img.get_pixel(col as u32, (row as u32 * 2 + 1).min(img.height() - 1));
        if let Some(cell) = buf.cell_mut(Position::new(area.x + col, area.y + row)) {
            cell.set_char(ch).set_style(style.bg(to_color(under)));
        }
    }
}
