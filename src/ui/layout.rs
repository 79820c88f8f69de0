//! Layout helpers — split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Width of the details side panel.
const DETAILS_WIDTH: u16 = 36;
/// Below this terminal width the details panel is hidden.
const DETAILS_MIN_TOTAL: u16 = 90;

/// Header bar, main view, optional details panel and a bottom status bar.
pub struct AppLayout {
    pub header_area: Rect,
    pub main_area: Rect,
    pub details_area: Option<Rect>,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // tabs / zoom / filter
                Constraint::Min(3),    // main view (takes all remaining space)
                Constraint::Length(1), // status / command bar
            ])
            .split(area);

        let (main_area, details_area) = if area.width >= DETAILS_MIN_TOTAL {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(20), Constraint::Length(DETAILS_WIDTH)])
                .split(rows[1]);
            (cols[0], Some(cols[1]))
        } else {
            (rows[1], None)
        };

        Self {
            header_area: rows[0],
            main_area,
            details_area,
            status_area: rows[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_terminal_gets_details_panel() {
        let layout = AppLayout::from_area(Rect::new(0, 0, 120, 40));
        let details = layout.details_area.unwrap();
        assert_eq!(details.width, DETAILS_WIDTH);
        assert_eq!(layout.main_area.width, 120 - DETAILS_WIDTH);
        assert_eq!(layout.main_area.height, 38);
        assert_eq!(layout.status_area.y, 39);
    }

    #[test]
    fn narrow_terminal_drops_details_panel() {
        let layout = AppLayout::from_area(Rect::new(0, 0, 60, 20));
        assert!(layout.details_area.is_none());
        assert_eq!(layout.main_area.width, 60);
    }
}
