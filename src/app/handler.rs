//! Input handling — maps key/mouse events to state mutations.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::config::Action;
use crate::core::layout::{hit_test, Hit};
use crate::core::view::Point;
use crate::ui::canvas_widget::{pointer_to_surface, POINTER_SLOP};
use crate::ui::list_view::{grid_columns, grid_index_at, list_index_at};

use super::state::{AppState, ViewMode};

/// Logical pixels moved per arrow-key press.
pub const PAN_STEP: f64 = 40.0;

/// Process a key event, dispatching on search input first.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+c always quits, regardless of mode.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    if state.search_active {
        handle_search_key(state, key);
        return;
    }

    if key.code == KeyCode::Esc {
        state.view = state.view.clear_selection();
        return;
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };

    match action {
        Action::Quit => state.should_quit = true,
        Action::ZoomIn => state.view = state.view.zoom_in(),
        Action::ZoomOut => state.view = state.view.zoom_out(),
        Action::ResetView => state.view = state.view.reset(),
        Action::PanLeft => pan_or_move(state, Point::new(PAN_STEP, 0.0), -1, false),
        Action::PanRight => pan_or_move(state, Point::new(-PAN_STEP, 0.0), 1, false),
        Action::PanUp => pan_or_move(state, Point::new(0.0, PAN_STEP), -1, true),
        Action::PanDown => pan_or_move(state, Point::new(0.0, -PAN_STEP), 1, true),
        Action::SelectNext => step_selection(state, 1),
        Action::SelectPrev => step_selection(state, -1),
        Action::ToggleExpand => toggle_selected(state),
        Action::CycleViewMode => {
            state.view_mode = state.view_mode.next();
            state.press_cell = None;
            state.view = state.view.end_drag();
        }
        Action::Search => {
            if state.view_mode == ViewMode::Tree {
                state.view_mode = ViewMode::List;
            }
            state.search_active = true;
        }
        Action::CycleLevelFilter => {
            state.level_filter = state.level_filter.next();
            state.list_state.reset();
        }
        Action::Refresh => state.needs_refresh = true,
        Action::Export => state.needs_export = true,
    }
}

/// Keystrokes while the search box has focus.  Enter keeps the query, Esc
/// clears it.
fn handle_search_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            state.search_query.clear();
            state.search_active = false;
        }
        KeyCode::Enter => state.search_active = false,
        KeyCode::Backspace => {
            state.search_query.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.search_query.push(c);
        }
        _ => return,
    }
    state.list_state.reset();
}

/// Arrow keys pan the canvas in tree mode and move the highlight elsewhere.
/// Left/right only move in the grid, where they step one card.
fn pan_or_move(state: &mut AppState, pan: Point, step: isize, vertical: bool) {
    match state.view_mode {
        ViewMode::Tree => state.view = state.view.pan_by(pan),
        ViewMode::List if vertical => move_list(state, step),
        ViewMode::List => {}
        ViewMode::Grid => {
            let stride = if vertical {
                grid_columns(state.list_area.width) as isize
            } else {
                1
            };
            move_list(state, step * stride);
        }
    }
}

fn step_selection(state: &mut AppState, step: isize) {
    match state.view_mode {
        ViewMode::Tree => cycle_canvas_selection(state, step),
        ViewMode::List | ViewMode::Grid => move_list(state, step),
    }
}

/// Walk the selection through the visible nodes in layout order, wrapping.
fn cycle_canvas_selection(state: &mut AppState, step: isize) {
    let placements = state.placements();
    if placements.is_empty() {
        return;
    }
    let len = placements.len() as isize;
    let current = state
        .view
        .selected
        .as_deref()
        .and_then(|id| placements.iter().position(|p| p.node_id() == id));
    let next = match current {
        Some(idx) => (idx as isize + step).rem_euclid(len),
        None if step < 0 => len - 1,
        None => 0,
    };
    let view = state.view.select(placements[next as usize].node);
    state.view = view;
}

/// Move the list/grid highlight and mirror it into the canvas selection.
fn move_list(state: &mut AppState, step: isize) {
    let len = state.filtered().len();
    if step >= 0 {
        for _ in 0..step {
            state.list_state.select_next(len);
        }
    } else {
        for _ in 0..step.unsigned_abs() {
            state.list_state.select_prev();
        }
    }
    sync_selection_from_list(state);
}

fn sync_selection_from_list(state: &mut AppState) {
    let rows = state.filtered();
    let view = rows.get(state.list_state.selected).map(|(node, _)| state.view.select(node));
    if let Some(view) = view {
        state.view = view;
    }
}

fn toggle_selected(state: &mut AppState) {
    match state.view_mode {
        ViewMode::Tree => {
            if let Some(id) = state.view.selected.clone() {
                state.view = state.view.toggle_expand(&id);
            }
        }
        // In list/grid, Enter jumps to the highlighted node on the canvas.
        ViewMode::List | ViewMode::Grid => {
            sync_selection_from_list(state);
            if state.view.selected.is_some() {
                state.view_mode = ViewMode::Tree;
            }
        }
    }
}

// ── mouse ──────────────────────────────────────────────────────

pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    match state.view_mode {
        ViewMode::Tree => handle_canvas_mouse(state, mouse),
        ViewMode::List | ViewMode::Grid => handle_list_mouse(state, mouse),
    }
}

/// Press + release on the same cell is a click; anything in between is a pan.
fn handle_canvas_mouse(state: &mut AppState, mouse: MouseEvent) {
    let cell = (mouse.column, mouse.row);
    let pointer = pointer_to_surface(state.canvas_area, mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(p) = pointer {
                state.press_cell = Some(cell);
                state.view = state.view.begin_drag(p);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => match pointer {
            Some(p) => state.view = state.view.drag_to(p),
            // Leaving the canvas ends the drag.
            None if state.view.is_dragging() => {
                state.view = state.view.end_drag();
                state.press_cell = None;
            }
            None => {}
        },
        MouseEventKind::Up(MouseButton::Left) => {
            state.view = state.view.end_drag();
            let clicked = state.press_cell.take() == Some(cell);
            if let (true, Some(p)) = (clicked, pointer) {
                click_canvas(state, p);
            }
        }
        MouseEventKind::ScrollUp if pointer.is_some() => state.view = state.view.zoom_in(),
        MouseEventKind::ScrollDown if pointer.is_some() => state.view = state.view.zoom_out(),
        _ => {}
    }
}

fn click_canvas(state: &mut AppState, pointer: Point) {
    let hit = hit_test(&state.placements(), &state.view, pointer, POINTER_SLOP);
    match hit {
        Some(Hit::Toggle(id)) => state.view = state.view.toggle_expand(&id),
        Some(Hit::Node(id)) => {
            let view = state
                .tree
                .as_ref()
                .and_then(|tree| tree.find(&id))
                .map(|node| state.view.select(node));
            if let Some(view) = view {
                state.view = view;
            }
        }
        None => {}
    }
}

fn handle_list_mouse(state: &mut AppState, mouse: MouseEvent) {
    let len = state.filtered().len();
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let index = match state.view_mode {
                ViewMode::Grid => grid_index_at(state.list_area, &state.list_state, mouse.column, mouse.row),
                _ => list_index_at(state.list_area, &state.list_state, mouse.column, mouse.row),
            };
            if let Some(index) = index.filter(|i| *i < len) {
                state.list_state.selected = index;
                sync_selection_from_list(state);
            }
        }
        MouseEventKind::ScrollDown => move_list(state, 1),
        MouseEventKind::ScrollUp => move_list(state, -1),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crossterm::event::KeyEventState;
    use ratatui::layout::Rect;
    use rstest::rstest;

    use super::*;
    use crate::app::fetch_runtime::TreeSource;
    use crate::config::AppConfig;
    use crate::core::layout::{root_anchor, TOGGLE_OFFSET};
    use crate::core::tree::{tests::node, ReferralTree};
    use crate::core::view::ViewState;
    use crate::ui::canvas_widget::{CELL_PX_H, CELL_PX_W};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Alice → (Bob → Dan, Cara) on a 100×40 canvas at the origin.
    fn loaded_state() -> AppState {
        let tree = ReferralTree::new(node(
            "u1",
            "Alice",
            vec![node("u2", "Bob", vec![node("u4", "Dan", vec![])]), node("u3", "Cara", vec![])],
        ))
        .unwrap();
        let mut state = AppState::new(TreeSource::File(PathBuf::from("t.json")), AppConfig::default(), 2);
        state.view = ViewState::initial(tree.root(), 0);
        state.tree = Some(tree);
        state.canvas_area = Rect::new(0, 0, 100, 40);
        state.list_area = Rect::new(0, 0, 100, 40);
        state
    }

    /// Terminal cell covering logical point `p` on an unpanned, unzoomed canvas.
    fn cell_at(p: Point) -> (u16, u16) {
        ((p.x / CELL_PX_W) as u16, (p.y / CELL_PX_H) as u16)
    }

    fn click(state: &mut AppState, (col, row): (u16, u16)) {
        handle_mouse(state, mouse(MouseEventKind::Down(MouseButton::Left), col, row));
        handle_mouse(state, mouse(MouseEventKind::Up(MouseButton::Left), col, row));
    }

    #[rstest]
    #[case(KeyCode::Char('+'), 1.1)]
    #[case(KeyCode::Char('-'), 0.9)]
    fn zoom_keys(#[case] code: KeyCode, #[case] expected: f64) {
        let mut s = loaded_state();
        handle_key(&mut s, key(code));
        assert!((s.view.zoom - expected).abs() < 1e-9);
    }

    #[test]
    fn arrow_keys_pan_the_canvas() {
        let mut s = loaded_state();
        handle_key(&mut s, key(KeyCode::Left));
        handle_key(&mut s, key(KeyCode::Down));
        assert_eq!(s.view.position, Point::new(PAN_STEP, -PAN_STEP));
        handle_key(&mut s, key(KeyCode::Char('0')));
        assert_eq!(s.view.position, Point::ORIGIN);
    }

    #[test]
    fn clicking_a_node_selects_it() {
        let mut s = loaded_state();
        let root = root_anchor(800.0);
        click(&mut s, cell_at(root));
        assert_eq!(s.view.selected.as_deref(), Some("u1"));
        assert!(!s.view.is_dragging());
    }

    #[test]
    fn clicking_the_toggle_flips_expansion() {
        let mut s = loaded_state();
        assert!(s.view.is_expanded("u1"));
        click(&mut s, cell_at(root_anchor(800.0) + TOGGLE_OFFSET));
        assert!(!s.view.is_expanded("u1"));
        assert_eq!(s.view.selected, None);
    }

    #[test]
    fn press_move_release_pans_without_selecting() {
        let mut s = loaded_state();
        let (col, row) = cell_at(root_anchor(800.0));
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), col, row));
        handle_mouse(&mut s, mouse(MouseEventKind::Drag(MouseButton::Left), col + 2, row + 1));
        handle_mouse(&mut s, mouse(MouseEventKind::Up(MouseButton::Left), col + 2, row + 1));

        assert_eq!(s.view.position, Point::new(2.0 * CELL_PX_W, CELL_PX_H));
        assert_eq!(s.view.selected, None);
        assert!(!s.view.is_dragging());
    }

    #[test]
    fn dragging_off_the_canvas_ends_the_drag() {
        let mut s = loaded_state();
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), 10, 10));
        handle_mouse(&mut s, mouse(MouseEventKind::Drag(MouseButton::Left), 120, 10));
        assert!(!s.view.is_dragging());
    }

    #[test]
    fn wheel_zooms() {
        let mut s = loaded_state();
        handle_mouse(&mut s, mouse(MouseEventKind::ScrollUp, 5, 5));
        handle_mouse(&mut s, mouse(MouseEventKind::ScrollUp, 5, 5));
        assert!((s.view.zoom - 1.2).abs() < 1e-9);
    }

    #[test]
    fn selection_cycles_through_visible_nodes() {
        let mut s = loaded_state();
        // u4 is hidden: only the root starts expanded.
        let mut seen = Vec::new();
        for _ in 0..4 {
            handle_key(&mut s, key(KeyCode::Char('j')));
            seen.push(s.view.selected.clone().unwrap());
        }
        assert_eq!(seen, ["u1", "u2", "u3", "u1"]);

        handle_key(&mut s, key(KeyCode::Char('k')));
        assert_eq!(s.view.selected.as_deref(), Some("u3"));
    }

    #[test]
    fn enter_toggles_the_selected_node() {
        let mut s = loaded_state();
        handle_key(&mut s, key(KeyCode::Char('j')));
        handle_key(&mut s, key(KeyCode::Char('j')));
        handle_key(&mut s, key(KeyCode::Enter));
        assert!(s.view.is_expanded("u2"));
    }

    #[test]
    fn search_typing_filters_the_list() {
        let mut s = loaded_state();
        handle_key(&mut s, key(KeyCode::Char('/')));
        assert_eq!(s.view_mode, ViewMode::List);
        for c in "ca".chars() {
            handle_key(&mut s, key(KeyCode::Char(c)));
        }
        // Plain letters went to the query, not to bindings.
        assert!(!s.should_quit);
        assert_eq!(s.search_query, "ca");
        let names: Vec<_> = s.filtered().iter().map(|(n, _)| n.name.clone()).collect();
        assert_eq!(names, ["Cara"]);

        handle_key(&mut s, key(KeyCode::Esc));
        assert!(!s.search_active);
        assert!(s.search_query.is_empty());
    }

    #[test]
    fn list_navigation_drives_the_detail_selection() {
        let mut s = loaded_state();
        s.view_mode = ViewMode::List;
        handle_key(&mut s, key(KeyCode::Down));
        // Rows: Bob, Dan, Cara (tree order, root excluded).
        assert_eq!(s.view.selected.as_deref(), Some("u4"));

        handle_key(&mut s, key(KeyCode::Enter));
        assert_eq!(s.view_mode, ViewMode::Tree);
    }

    #[test]
    fn level_filter_cycles_and_resets_highlight() {
        let mut s = loaded_state();
        s.view_mode = ViewMode::List;
        s.list_state.selected = 2;
        handle_key(&mut s, key(KeyCode::Char('f')));
        assert_eq!(s.list_state.selected, 0);
        assert_eq!(s.filtered().len(), 2);
    }

    #[test]
    fn refresh_and_export_raise_flags() {
        let mut s = loaded_state();
        s.needs_refresh = false;
        handle_key(&mut s, key(KeyCode::Char('r')));
        handle_key(&mut s, key(KeyCode::Char('e')));
        assert!(s.needs_refresh);
        assert!(s.needs_export);
    }

    #[test]
    fn ctrl_c_quits_even_while_searching() {
        let mut s = loaded_state();
        s.search_active = true;
        handle_key(
            &mut s,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(s.should_quit);
    }
}
