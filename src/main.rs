//! Interactive referral-tree viewer for the terminal.
//!
//! Run the binary to browse the tree served by the referral API.
//! Run with `--file tree.json` to browse an exported tree offline, or with
//! `--render out.png` to rasterise it once without opening the TUI.

mod api;
mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    widgets::{Block, Borders},
    Frame, Terminal,
};

use crate::api::{client::ApiClient, export};
use crate::app::{
    event::{spawn_event_reader, AppEvent},
    fetch_runtime::{self, TreeSource},
    handler,
    state::{AppState, ViewMode},
};
use crate::core::{
    filter::filter_referrals,
    view::{ViewState, INITIAL_EXPAND_DEPTH},
};
use crate::ui::{
    bars::{HeaderBar, StatusBar},
    canvas_widget::TreeCanvas,
    details::DetailsPanel,
    layout::AppLayout,
    list_view::{GridView, ListView},
    theme::Theme,
};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Referral tree viewer")]
struct Cli {
    /// Base URL of the referral API (overrides the config file).
    #[arg(long)]
    api_url: Option<String>,

    /// Read the tree from a JSON file instead of the API.
    #[arg(long, conflicts_with = "api_url")]
    file: Option<PathBuf>,

    /// Levels expanded on first load.
    #[arg(long, default_value_t = INITIAL_EXPAND_DEPTH)]
    depth: usize,

    /// Render the tree to this PNG and exit.
    #[arg(long, value_name = "PNG")]
    render: Option<PathBuf>,

    /// Width of the `--render` image in pixels.
    #[arg(
        long,
        default_value_t = fetch_runtime::LOCAL_EXPORT_SIZE.0,
        value_parser = clap::value_parser!(u32).range(1..=export::MAX_RENDER_SIDE as i64),
    )]
    width: u32,

    /// Height of the `--render` image in pixels.
    #[arg(
        long,
        default_value_t = fetch_runtime::LOCAL_EXPORT_SIZE.1,
        value_parser = clap::value_parser!(u32).range(1..=export::MAX_RENDER_SIDE as i64),
    )]
    height: u32,
}

// ───────────────────────────────────────── drawing ───────────

fn render_frame(frame: &mut Frame, state: &mut AppState) {
    let layout = AppLayout::from_area(frame.area());
    frame.render_widget(HeaderBar::new(state), layout.header_area);

    let title = match state.view_mode {
        ViewMode::Tree => format!(" {} ", state.source.describe()),
        ViewMode::List | ViewMode::Grid => {
            let count = state.filtered().len();
            format!(" {count} referrals ")
        }
    };
    let main_block = Block::default()
        .title(title)
        .title_style(Theme::title_style())
        .borders(Borders::ALL)
        .border_style(Theme::border_style());
    let inner = main_block.inner(layout.main_area);

    match state.view_mode {
        ViewMode::Tree => {
            state.canvas_area = inner;
            let canvas = TreeCanvas::new(state.root(), &state.view)
                .loading(state.loading)
                .block(main_block);
            frame.render_widget(canvas, layout.main_area);
        }
        ViewMode::List | ViewMode::Grid => {
            state.list_area = inner;
            let rows = match &state.tree {
                Some(tree) => filter_referrals(tree, &state.search_query, state.level_filter),
                None => Vec::new(),
            };
            if state.view_mode == ViewMode::List {
                let list = ListView::new(&rows).block(main_block);
                frame.render_stateful_widget(list, layout.main_area, &mut state.list_state);
            } else {
                let grid = GridView::new(&rows).block(main_block);
                frame.render_stateful_widget(grid, layout.main_area, &mut state.list_state);
            }
        }
    }

    if let Some(area) = layout.details_area {
        let selected = state.selected_node().and_then(|node| {
            let level = state.tree.as_ref()?.level_of(&node.id)?;
            Some((node, level))
        });
        let stats = state.effective_stats();
        let block = Block::default()
            .title(" Details ")
            .title_style(Theme::title_style())
            .borders(Borders::ALL)
            .border_style(Theme::border_style());
        frame.render_widget(DetailsPanel::new(selected, stats.as_ref()).block(block), area);
    }

    frame.render_widget(StatusBar::new(state), layout.status_area);
}

// ───────────────────────────────────────── headless ──────────

async fn render_once(source: &TreeSource, depth: usize, out: PathBuf, width: u32, height: u32) -> Result<()> {
    let tree = fetch_runtime::load_tree(source).await?;
    let view = ViewState::initial(tree.root(), depth);
    let png = export::render_png(Some(&tree), &view, width, height)?;
    tokio::fs::write(&out, png)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(path = %out.display(), width, height, "rendered");
    Ok(())
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing (only when RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // never pollute stdout
        .init();

    let cli = Cli::parse();
    let user_config = config::AppConfig::load_or_create();

    let source = match cli.file {
        Some(path) => TreeSource::File(path),
        None => {
            let base = cli.api_url.as_deref().unwrap_or(&user_config.api_base_url);
            TreeSource::Remote(ApiClient::new(
                base,
                Duration::from_secs(user_config.request_timeout_secs),
            ))
        }
    };

    // ── headless render ───────────────────────────────────────
    if let Some(out) = cli.render {
        return render_once(&source, cli.depth, out, cli.width, cli.height).await;
    }

    let mut state = AppState::new(source, user_config, cli.depth);

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    // ── async channels ────────────────────────────────────────
    let mut events = spawn_event_reader(Duration::from_millis(250));
    let (fetch_tx, mut fetch_rx) = tokio::sync::mpsc::unbounded_channel();

    // ── event loop ────────────────────────────────────────────
    let outcome: Result<()> = loop {
        if let Err(err) = terminal.draw(|frame| render_frame(frame, &mut state)) {
            break Err(err.into());
        }

        // Jobs start after the draw so the flag that raised them is
        // already reflected on screen.
        if state.needs_refresh {
            state.needs_refresh = false;
            fetch_runtime::start_refresh(&mut state, &fetch_tx);
        }
        if state.needs_export {
            state.needs_export = false;
            fetch_runtime::start_export(&mut state, &fetch_tx);
        }

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => handler::handle_key(&mut state, k),
                    AppEvent::Mouse(m) => handler::handle_mouse(&mut state, m),
                    AppEvent::Resize => {}
                    AppEvent::Tick => state.expire_toast(Instant::now()),
                }
            }

            Some(update) = fetch_rx.recv() => {
                fetch_runtime::apply_update(&mut state, update);
                while let Ok(update) = fetch_rx.try_recv() {
                    fetch_runtime::apply_update(&mut state, update);
                }
            }
        }

        if state.should_quit {
            break Ok(());
        }
    };

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_size_defaults_to_local_export_size() {
        let cli = Cli::try_parse_from(["ref-tree", "--render", "out.png"]).unwrap();
        assert_eq!((cli.width, cli.height), fetch_runtime::LOCAL_EXPORT_SIZE);
    }

    #[test]
    fn oversized_render_is_rejected() {
        assert!(Cli::try_parse_from(["ref-tree", "--width", "100000", "--height", "100000"]).is_err());
        assert!(Cli::try_parse_from(["ref-tree", "--width", "0"]).is_err());
        let cli = Cli::try_parse_from(["ref-tree", "--width", "8192"]).unwrap();
        assert_eq!(cli.width, export::MAX_RENDER_SIDE);
    }
}
