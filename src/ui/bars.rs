//! The one-line header (view tabs, zoom, filters) and status bar (toast,
//! search input or key hints).

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::state::{AppState, ToastKind, ViewMode};

use super::theme::Theme;

pub struct HeaderBar<'a> {
    state: &'a AppState,
}

impl<'a> HeaderBar<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }
}

impl Widget for HeaderBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let s = self.state;
        let mut spans = Vec::new();
        for mode in ViewMode::ALL {
            spans.push(Span::styled(format!(" {} ", mode.label()), Theme::tab_style(*mode == s.view_mode)));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!(" zoom {:.0}% ", s.view.zoom * 100.0),
            Theme::muted_style(),
        ));
        if s.view_mode == ViewMode::Tree {
            let placements = s.placements();
            if let Some(deepest) = placements.iter().map(|p| p.level).max() {
                spans.push(Span::styled(
                    format!(" {} shown, depth {deepest} ", placements.len()),
                    Theme::muted_style(),
                ));
            }
        }
        spans.push(Span::styled(
            format!(" level {} ", s.level_filter.label()),
            Theme::muted_style(),
        ));
        if !s.search_query.is_empty() {
            spans.push(Span::styled(
                format!(" name ~ \"{}\" ", s.search_query),
                Theme::command_input_style(),
            ));
        }
        if s.loading {
            spans.push(Span::styled(" loading… ", Theme::placeholder_style()));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

pub struct StatusBar<'a> {
    state: &'a AppState,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let s = self.state;
        let line = if s.search_active {
            Line::from(vec![
                Span::styled(" / ", Theme::command_input_style()),
                Span::raw(s.search_query.clone()),
                Span::styled("▏", Theme::command_input_style()),
                Span::styled("   Enter keep · Esc clear", Theme::muted_style()),
            ])
        } else if let Some(toast) = &s.toast {
            Line::styled(
                format!(" {} ", toast.message),
                Theme::toast_style(toast.kind == ToastKind::Error),
            )
        } else {
            Line::raw(s.config.status_bar_hint())
        };
        Paragraph::new(line)
            .style(Theme::status_bar_style())
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::app::fetch_runtime::TreeSource;
    use crate::config::AppConfig;

    fn state() -> AppState {
        AppState::new(TreeSource::File(PathBuf::from("t.json")), AppConfig::default(), 2)
    }

    fn render(widget: impl Widget, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    #[test]
    fn header_shows_zoom_and_filter() {
        let mut s = state();
        s.view = s.view.zoom_in().zoom_in();
        let out = render(HeaderBar::new(&s), 100);
        assert!(out.contains(" Tree "));
        assert!(out.contains("zoom 120%"));
        assert!(out.contains("level all"));
        assert!(!out.contains("shown"));
    }

    #[test]
    fn header_counts_visible_nodes() {
        use crate::core::tree::{tests::node, ReferralTree};
        use crate::core::view::ViewState;

        let mut s = state();
        let tree = ReferralTree::new(node(
            "u1",
            "Alice",
            vec![node("u2", "Bob", vec![node("u4", "Dan", vec![])]), node("u3", "Cara", vec![])],
        ))
        .unwrap();
        s.view = ViewState::initial(tree.root(), 0);
        s.tree = Some(tree);
        let out = render(HeaderBar::new(&s), 120);
        assert!(out.contains("3 shown, depth 1"));
    }

    #[test]
    fn toast_replaces_hint() {
        let mut s = state();
        s.notify_error("Failed to load referral tree");
        let out = render(StatusBar::new(&s), 80);
        assert!(out.contains("Failed to load referral tree"));
    }

    #[test]
    fn search_input_takes_priority() {
        let mut s = state();
        s.notify("Saved");
        s.search_active = true;
        s.search_query = "bo".into();
        let out = render(StatusBar::new(&s), 80);
        assert!(out.contains("/ bo"));
        assert!(!out.contains("Saved"));
    }
}
