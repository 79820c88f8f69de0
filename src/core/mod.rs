//! Core algorithms – tree model, view-state transitions, layout and drawing.
//!
//! Nothing in this module depends on any TUI or network crate.
//! Every type is `Send + Sync` so it can be shared across async tasks.

pub mod draw;
pub mod filter;
pub mod format;
pub mod layout;
pub mod raster;
pub mod stats;
pub mod tree;
pub mod view;
