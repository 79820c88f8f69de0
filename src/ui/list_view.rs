//! Flat renderings of the filtered referrals: a one-row-per-person list and a
//! grid of cards.  Both share [`ListState`] for highlight and scroll.

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};

use crate::core::{
    format::{format_earnings, format_joined, truncate},
    tree::TreeNode,
};

use super::theme::Theme;

/// Card footprint in the grid, including its border.
pub const CARD_W: u16 = 28;
pub const CARD_H: u16 = 5;

// ───────────────────────────────────────── state ─────────────

/// Persistent state for the list and grid (highlighted index, scroll offset).
#[derive(Debug, Default)]
pub struct ListState {
    /// Index into the filtered rows that is currently highlighted.
    pub selected: usize,
    /// First visible row (list) or card row (grid).
    pub offset: usize,
}

impl ListState {
    pub fn select_next(&mut self, max: usize) {
        if max > 0 && self.selected < max - 1 {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    /// Keep the highlight on a real row after the rows changed.
    pub fn clamp_selected(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Ensure the line `line` is visible within `height` lines.
    fn clamp_scroll_to(&mut self, line: usize, height: usize) {
        if height == 0 {
            return;
        }
        if line < self.offset {
            self.offset = line;
        } else if line >= self.offset + height {
            self.offset = line - height + 1;
        }
    }
}

/// Cards per grid row for a body `width` columns wide.
pub fn grid_columns(width: u16) -> usize {
    (width / CARD_W).max(1) as usize
}

/// Row index under a click in the list body.
pub fn list_index_at(area: Rect, state: &ListState, col: u16, row: u16) -> Option<usize> {
    if !area.contains(Position::new(col, row)) {
        return None;
    }
    Some(state.offset + (row - area.y) as usize)
}

/// Card index under a click in the grid body.
pub fn grid_index_at(area: Rect, state: &ListState, col: u16, row: u16) -> Option<usize> {
    if !area.contains(Position::new(col, row)) {
        return None;
    }
    let cols = grid_columns(area.width);
    let card_col = ((col - area.x) / CARD_W) as usize;
    if card_col >= cols {
        return None;
    }
    let card_row = ((row - area.y) / CARD_H) as usize;
    Some((state.offset + card_row) * cols + card_col)
}

fn status_span(node: &TreeNode) -> Span<'static> {
    if node.is_active {
        Span::styled("● active  ", Theme::active_style())
    } else {
        Span::styled("○ inactive", Theme::inactive_style())
    }
}

// ───────────────────────────────────────── list ──────────────

/// One referral per line: name, level, earnings, status and join date.
pub struct ListView<'a> {
    rows: &'a [(&'a TreeNode, usize)],
    block: Option<Block<'a>>,
}

impl<'a> ListView<'a> {
    pub fn new(rows: &'a [(&'a TreeNode, usize)]) -> Self {
        Self { rows, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl StatefulWidget for ListView<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
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

        if self.rows.is_empty() {
            buf.set_stringn(inner.x + 1, inner.y, "No matching referrals", inner.width as usize, Theme::placeholder_style());
            return;
        }

        state.clamp_selected(self.rows.len());
        state.clamp_scroll_to(state.selected, inner.height as usize);

        let name_width = (inner.width as usize).saturating_sub(48).clamp(8, 32);
        let visible = self
            .rows
            .iter()
            .enumerate()
            .skip(state.offset)
            .take(inner.height as usize);

        for (i, (idx, (node, level))) in visible.enumerate() {
            let is_selected = idx == state.selected;
            let name_style = if is_selected {
                Theme::selected_style()
            } else {
                Theme::name_style()
            };
            let line = Line::from(vec![
                Span::styled(
                    format!(" {:<name_width$}", truncate(&node.name, name_width)),
                    name_style,
                ),
                Span::styled(format!("  L{level:<2}"), Theme::muted_style()),
                Span::styled(format!("{:>14}  ", format_earnings(node.earnings)), Theme::earnings_style()),
                status_span(node),
                Span::styled(format!("  {}", format_joined(node.joined_at.as_ref())), Theme::muted_style()),
            ]);
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}

// ───────────────────────────────────────── grid ──────────────

/// Cards laid out left-to-right, top-to-bottom.
pub struct GridView<'a> {
    rows: &'a [(&'a TreeNode, usize)],
    block: Option<Block<'a>>,
}

impl<'a> GridView<'a> {
    pub fn new(rows: &'a [(&'a TreeNode, usize)]) -> Self {
        Self { rows, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl StatefulWidget for GridView<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
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

        if self.rows.is_empty() {
            buf.set_stringn(inner.x + 1, inner.y, "No matching referrals", inner.width as usize, Theme::placeholder_style());
            return;
        }

        let cols = grid_columns(inner.width);
        let visible_rows = (inner.height / CARD_H) as usize;
        state.clamp_selected(self.rows.len());
        state.clamp_scroll_to(state.selected / cols, visible_rows.max(1));

        let first = state.offset * cols;
        for (i, (node, level)) in self.rows.iter().enumerate().skip(first).take(visible_rows * cols) {
            let slot = i - first;
            let x = inner.x + (slot % cols) as u16 * CARD_W;
            let y = inner.y + (slot / cols) as u16 * CARD_H;
            let card = Rect::new(x, y, CARD_W.min(inner.right() - x), CARD_H);
            render_card(node, *level, i == state.selected, card, buf);
        }
    }
}

fn render_card(node: &TreeNode, level: usize, selected: bool, area: Rect, buf: &mut Buffer) {
    let border = if selected {
        Theme::title_style()
    } else {
        Theme::border_style()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(format!(" {} ", node.initials()), Theme::muted_style()));
    let text_width = area.width.saturating_sub(2) as usize;
    let lines = vec![
        Line::styled(truncate(&node.name, text_width), Theme::name_style()),
        Line::styled(format_earnings(node.earnings), Theme::earnings_style()),
        Line::from(vec![Span::styled(format!("L{level}  "), Theme::muted_style()), status_span(node)]),
    ];
    Paragraph::new(lines).block(block).render(area, buf);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::core::tree::tests::node;

    fn people(n: usize) -> Vec<TreeNode> {
        (0..n).map(|i| node(&format!("u{i}"), &format!("Person {i}"), vec![])).collect()
    }

    fn screen(buf: &Buffer) -> String {
        (buf.area.y..buf.area.bottom())
            .map(|y| {
                (buf.area.x..buf.area.right())
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn select_next_stops_at_end() {
        let mut s = ListState::default();
        for _ in 0..5 {
            s.select_next(3);
        }
        assert_eq!(s.selected, 2);
        s.select_prev();
        assert_eq!(s.selected, 1);
    }

    #[test]
    fn list_scrolls_to_keep_highlight_visible() {
        let nodes = people(20);
        let rows: Vec<_> = nodes.iter().map(|n| (n, 1)).collect();
        let area = Rect::new(0, 0, 80, 5);
        let mut buf = Buffer::empty(area);
        let mut state = ListState {
            selected: 12,
            offset: 0,
        };
        ListView::new(&rows).render(area, &mut buf, &mut state);

        assert_eq!(state.offset, 8);
        let text = screen(&buf);
        assert!(text.contains("Person 12"));
        assert!(!text.contains("Person 7 "));
    }

    #[test]
    fn empty_rows_show_placeholder() {
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        ListView::new(&[]).render(area, &mut buf, &mut ListState::default());
        assert!(screen(&buf).contains("No matching referrals"));
    }

    #[test]
    fn grid_renders_cards_per_row() {
        let nodes = people(5);
        let rows: Vec<_> = nodes.iter().map(|n| (n, 2)).collect();
        let area = Rect::new(0, 0, CARD_W * 2 + 3, CARD_H * 2);
        let mut buf = Buffer::empty(area);
        GridView::new(&rows).render(area, &mut buf, &mut ListState::default());

        let text = screen(&buf);
        assert!(text.contains("Person 0"));
        assert!(text.contains("Person 3"));
        assert!(!text.contains("Person 4"));
    }

    #[rstest]
    #[case(0, 0, Some(0))]
    #[case(CARD_W, 0, Some(1))]
    #[case(1, CARD_H, Some(2))]
    #[case(CARD_W * 2, 0, None)]
    fn grid_click_maps_to_card(#[case] col: u16, #[case] row: u16, #[case] expected: Option<usize>) {
        let area = Rect::new(0, 0, CARD_W * 2 + 3, CARD_H * 3);
        assert_eq!(grid_index_at(area, &ListState::default(), col, row), expected);
    }

    #[test]
    fn list_click_accounts_for_scroll() {
        let area = Rect::new(2, 3, 40, 10);
        let state = ListState {
            selected: 0,
            offset: 7,
        };
        assert_eq!(list_index_at(area, &state, 5, 4), Some(8));
        assert_eq!(list_index_at(area, &state, 5, 2), None);
    }
}
