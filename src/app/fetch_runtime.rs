//! Background fetch/export jobs to keep the UI thread responsive.
//!
//! Every job reports back through one channel.  Tree and stats results carry
//! the generation they were started for; anything older than
//! [`AppState::fetch_generation`] is dropped on arrival.

use std::path::PathBuf;

use chrono::Local;
use tokio::sync::mpsc;

use super::state::AppState;
use crate::api::{client::ApiClient, error::ApiError, export};
use crate::core::{stats::SummaryStats, tree::ReferralTree, view::ViewState};

/// Where the referral tree is read from.
#[derive(Debug, Clone)]
pub enum TreeSource {
    Remote(ApiClient),
    /// A JSON document on disk; stats and exports are produced locally.
    File(PathBuf),
}

impl TreeSource {
    pub fn describe(&self) -> String {
        match self {
            TreeSource::Remote(client) => client.base_url().to_string(),
            TreeSource::File(path) => path.display().to_string(),
        }
    }
}

/// Load the tree once, wherever it lives.
pub async fn load_tree(source: &TreeSource) -> Result<ReferralTree, ApiError> {
    match source {
        TreeSource::Remote(client) => client.fetch_tree().await,
        TreeSource::File(path) => {
            let bytes = tokio::fs::read(path).await?;
            let tree = ReferralTree::from_json(&bytes)?;
            tracing::info!(path = %path.display(), nodes = tree.len(), "referral tree loaded");
            Ok(tree)
        }
    }
}

/// How an export gets its PNG bytes.
pub enum ExportJob {
    Remote(ApiClient),
    /// Rasterise the current view without a backend.
    Local {
        tree: ReferralTree,
        view: ViewState,
        width: u32,
        height: u32,
    },
}

pub enum FetchUpdate {
    TreeLoaded {
        generation: u64,
        result: Result<ReferralTree, ApiError>,
    },
    StatsLoaded {
        generation: u64,
        result: Result<SummaryStats, ApiError>,
    },
    Exported {
        result: Result<PathBuf, ApiError>,
    },
}

pub fn spawn_tree_fetch(tx: mpsc::UnboundedSender<FetchUpdate>, generation: u64, source: TreeSource) {
    tokio::spawn(async move {
        let result = load_tree(&source).await;
        let _ = tx.send(FetchUpdate::TreeLoaded { generation, result });
    });
}

pub fn spawn_stats_fetch(tx: mpsc::UnboundedSender<FetchUpdate>, generation: u64, client: ApiClient) {
    tokio::spawn(async move {
        let result = client.fetch_stats().await;
        let _ = tx.send(FetchUpdate::StatsLoaded { generation, result });
    });
}

pub fn spawn_export(tx: mpsc::UnboundedSender<FetchUpdate>, job: ExportJob, dir: PathBuf) {
    tokio::spawn(async move {
        let bytes = match job {
            ExportJob::Remote(client) => client.export_png().await,
            ExportJob::Local {
                tree,
                view,
                width,
                height,
            } => tokio::task::spawn_blocking(move || export::render_png(Some(&tree), &view, width, height))
                .await
                .unwrap_or_else(|err| Err(ApiError::Io(std::io::Error::other(err)))),
        };
        let result = match bytes {
            Ok(bytes) => export::save_png(&dir, &bytes, Local::now()).await,
            Err(err) => Err(err),
        };
        let _ = tx.send(FetchUpdate::Exported { result });
    });
}

/// Bump the generation and (re)load tree and stats.  The current tree stays
/// on screen until the new one arrives.
pub fn start_refresh(state: &mut AppState, tx: &mpsc::UnboundedSender<FetchUpdate>) {
    state.fetch_generation = state.fetch_generation.wrapping_add(1);
    let generation = state.fetch_generation;
    state.loading = true;
    tracing::debug!(generation, source = %state.source.describe(), "refresh started");

    spawn_tree_fetch(tx.clone(), generation, state.source.clone());
    if let TreeSource::Remote(client) = &state.source {
        spawn_stats_fetch(tx.clone(), generation, client.clone());
    }
}

/// Size of the local PNG export, in logical pixels.
pub const LOCAL_EXPORT_SIZE: (u32, u32) = (1600, 900);

pub fn start_export(state: &mut AppState, tx: &mpsc::UnboundedSender<FetchUpdate>) {
    if state.exporting {
        return;
    }
    let job = match &state.source {
        TreeSource::Remote(client) => ExportJob::Remote(client.clone()),
        TreeSource::File(_) => {
            let Some(tree) = state.tree.clone() else {
                state.notify_error("Nothing to export yet");
                return;
            };
            let (width, height) = LOCAL_EXPORT_SIZE;
            ExportJob::Local {
                tree,
                view: state.view.clone(),
                width,
                height,
            }
        }
    };
    state.exporting = true;
    state.notify("Exporting…");
    spawn_export(tx.clone(), job, state.config.export_dir.clone());
}

/// Fold one job result into the state.
pub fn apply_update(state: &mut AppState, update: FetchUpdate) {
    match update {
        FetchUpdate::TreeLoaded { generation, result } => {
            if generation != state.fetch_generation {
                tracing::debug!(generation, current = state.fetch_generation, "stale tree dropped");
                return;
            }
            state.loading = false;
            match result {
                Ok(tree) => install_tree(state, tree),
                Err(err) => {
                    tracing::warn!("tree fetch failed: {err}");
                    state.notify_error(format!("Failed to load referral tree: {err}"));
                }
            }
        }
        FetchUpdate::StatsLoaded { generation, result } => {
            if generation != state.fetch_generation {
                return;
            }
            match result {
                Ok(stats) => state.stats = Some(stats),
                Err(err) => {
                    tracing::warn!("stats fetch failed: {err}");
                    state.stats = None;
                    state.notify_error("Stats unavailable, showing totals from the tree");
                }
            }
        }
        FetchUpdate::Exported { result } => {
            state.exporting = false;
            match result {
                Ok(path) => state.notify(format!("Saved {}", path.display())),
                Err(err) => {
                    tracing::warn!("export failed: {err}");
                    state.notify_error(format!("Export failed: {err}"));
                }
            }
        }
    }
}

/// First load gets the default expansion; later loads keep zoom, pan and
/// expansion, dropping a selection whose node has gone.
fn install_tree(state: &mut AppState, tree: ReferralTree) {
    if state.tree.is_none() {
        state.view = ViewState::initial(tree.root(), state.initial_depth);
    } else if let Some(id) = state.view.selected.as_deref() {
        if tree.find(id).is_none() {
            state.view = state.view.clear_selection();
        }
    }
    state.tree = Some(tree);
    let rows = state.filtered().len();
    state.list_state.clamp_selected(rows);
}
