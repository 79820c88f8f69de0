//! UI / rendering layer — everything that touches Ratatui widgets.
//!
//! This layer takes the *core* data structures and turns them into cells on
//! the terminal.  No network I/O happens here.

pub mod bars;
pub mod canvas_widget;
pub mod details;
pub mod layout;
pub mod list_view;
pub mod theme;
