//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use super::fetch_runtime::TreeSource;
use crate::config::AppConfig;
use crate::core::{
    filter::{self, LevelFilter},
    layout::{compute_layout, Placement},
    stats::SummaryStats,
    tree::{ReferralTree, TreeNode},
    view::ViewState,
};
use crate::ui::canvas_widget::surface_width;
use crate::ui::list_view::ListState;

/// Alternate renderings of the same tree.  Only `Tree` uses the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Tree,
    List,
    Grid,
}

impl ViewMode {
    pub const ALL: &[ViewMode] = &[ViewMode::Tree, ViewMode::List, ViewMode::Grid];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Tree => "Tree",
            ViewMode::List => "List",
            ViewMode::Grid => "Grid",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ViewMode::Tree => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
            ViewMode::Grid => ViewMode::Tree,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

/// A transient status-bar notification.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

/// Top-level application state.
pub struct AppState {
    /// Where the tree comes from.
    pub source: TreeSource,
    /// The loaded tree (`None` until the first successful fetch).
    pub tree: Option<ReferralTree>,
    /// Stats from the backend; local totals are used when absent.
    pub stats: Option<SummaryStats>,
    pub view: ViewState,
    /// Depth expanded on the first successful load.
    pub initial_depth: usize,
    pub view_mode: ViewMode,
    /// Name filter for list/grid.
    pub search_query: String,
    /// `true` while keystrokes go into the search box.
    pub search_active: bool,
    pub level_filter: LevelFilter,
    /// Selection / scroll for list and grid.
    pub list_state: ListState,
    /// `true` while a tree fetch is in flight.
    pub loading: bool,
    /// Monotonic generation id used to ignore stale fetch results.
    pub fetch_generation: u64,
    pub exporting: bool,
    /// Flags set by event handlers, consumed by the main loop.
    pub needs_refresh: bool,
    pub needs_export: bool,
    pub toast: Option<Toast>,
    pub config: AppConfig,
    /// Inner area the canvas was last rendered into (pointer mapping).
    pub canvas_area: Rect,
    /// Inner area of the list/grid body.
    pub list_area: Rect,
    /// Cell where the current left press started, for click detection.
    pub press_cell: Option<(u16, u16)>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(source: TreeSource, config: AppConfig, initial_depth: usize) -> Self {
        Self {
            source,
            tree: None,
            stats: None,
            view: ViewState::default(),
            initial_depth,
            view_mode: ViewMode::default(),
            search_query: String::new(),
            search_active: false,
            level_filter: LevelFilter::default(),
            list_state: ListState::default(),
            loading: false,
            fetch_generation: 0,
            exporting: false,
            needs_refresh: true,
            needs_export: false,
            toast: None,
            config,
            canvas_area: Rect::default(),
            list_area: Rect::default(),
            press_cell: None,
            should_quit: false,
        }
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.tree.as_ref().map(ReferralTree::root)
    }

    pub fn selected_node(&self) -> Option<&TreeNode> {
        let id = self.view.selected.as_deref()?;
        self.tree.as_ref()?.find(id)
    }

    /// Backend stats, or totals derived from the tree.
    pub fn effective_stats(&self) -> Option<SummaryStats> {
        self.stats
            .clone()
            .or_else(|| self.tree.as_ref().map(SummaryStats::from_tree))
    }

    /// Current canvas layout, matching what was last drawn.
    pub fn placements(&self) -> Vec<Placement<'_>> {
        match self.root() {
            Some(root) => compute_layout(root, &self.view, surface_width(self.canvas_area)),
            None => Vec::new(),
        }
    }

    /// Rows shown by the list/grid views.
    pub fn filtered(&self) -> Vec<(&TreeNode, usize)> {
        match &self.tree {
            Some(tree) => filter::filter_referrals(tree, &self.search_query, self.level_filter),
            None => Vec::new(),
        }
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            kind: ToastKind::Info,
            shown_at: Instant::now(),
        });
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            kind: ToastKind::Error,
            shown_at: Instant::now(),
        });
    }

    /// Drop the toast once it has been visible for `toast_secs`.
    pub fn expire_toast(&mut self, now: Instant) {
        let ttl = Duration::from_secs(self.config.toast_secs);
        if self
            .toast
            .as_ref()
            .is_some_and(|t| now.duration_since(t.shown_at) >= ttl)
        {
            self.toast = None;
        }
    }
}
