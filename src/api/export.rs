//! Saving PNG exports to disk, and rendering them locally when there is no
//! backend to ask.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::ImageFormat;

use super::error::ApiError;
use crate::core::draw::{draw, Palette};
use crate::core::raster::RasterSurface;
use crate::core::tree::ReferralTree;
use crate::core::view::ViewState;

/// Largest side of a locally rendered PNG, in pixels.
pub const MAX_RENDER_SIDE: u32 = 8192;

/// `referral-tree-20240301-120000.png`
pub fn export_file_name(now: DateTime<Local>) -> String {
    format!("referral-tree-{}.png", now.format("%Y%m%d-%H%M%S"))
}

/// Write a PNG blob into `dir`.  Anything that isn't a PNG is refused before
/// a file is created.
pub async fn save_png(dir: &Path, bytes: &[u8], now: DateTime<Local>) -> Result<PathBuf, ApiError> {
    if !matches!(image::guess_format(bytes), Ok(ImageFormat::Png)) {
        return Err(ApiError::NotPng);
    }
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(export_file_name(now));
    tokio::fs::write(&path, bytes).await?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "export saved");
    Ok(path)
}

/// Rasterise the tree at 1:1 scale and encode it as PNG.  Shapes only: the
/// raster surface has no font, so names and amounts are not in the image.
/// Each side is clamped to `1..=MAX_RENDER_SIDE`.
pub fn render_png(
    tree: Option<&ReferralTree>,
    view: &ViewState,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, ApiError> {
    let mut surface = RasterSurface::new(
        width.clamp(1, MAX_RENDER_SIDE),
        height.clamp(1, MAX_RENDER_SIDE),
        1.0,
    );
    draw(tree.map(ReferralTree::root), view, &Palette::default(), &mut surface);

    let mut out = Vec::new();
    surface
        .into_image()
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}
