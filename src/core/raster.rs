//! Pixel implementation of [`Surface`] backed by an [`image::RgbaImage`].
//!
//! Shapes are rasterised by testing each pixel centre in the shape's bounding
//! box — no anti-aliasing, so output is exactly reproducible.  Text cannot be
//! rasterised without a font, so it is collected as [`Label`]s positioned in
//! device pixels; the terminal widget overlays them as real characters.
//!
//! `device_scale` maps logical pixels to device pixels.  The terminal view
//! renders each half-block as one device pixel standing for 8×8 logical px.

use image::{Rgba, RgbaImage};

use super::draw::{RectF, Surface, TextRole, Transform};
use super::view::Point;

/// A piece of text to overlay, in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub x: f64,
    pub y: f64,
    pub text: String,
    /// Maximum width in device pixels.
    pub max_width: f64,
    pub role: TextRole,
    pub color: Rgba<u8>,
}

pub struct RasterSurface {
    image: RgbaImage,
    labels: Vec<Label>,
    transform: Transform,
    device_scale: f64,
}

/// Thinnest stroke that still leaves a continuous line, in device pixels.
const MIN_HALF_STROKE: f64 = 0.5;

impl RasterSurface {
    /// A surface of `width × height` device pixels.
    pub fn new(width: u32, height: u32, device_scale: f64) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            labels: Vec::new(),
            transform: Transform::IDENTITY,
            device_scale,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Logical point → device pixel coordinates.
    fn to_device(&self, p: Point) -> Point {
        let t = self.transform.apply(p);
        Point::new(t.x * self.device_scale, t.y * self.device_scale)
    }

    /// Logical length → device length.
    fn scale_len(&self, len: f64) -> f64 {
        len * self.transform.scale * self.device_scale
    }

    /// Visit every pixel whose centre falls in `[min, max]`, clipped to the image.
    fn for_each_pixel(&mut self, min: Point, max: Point, mut paint: impl FnMut(f64, f64) -> Option<Rgba<u8>>) {
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);
        let x0 = (min.x.floor() as i64).clamp(0, w);
        let x1 = (max.x.ceil() as i64).clamp(0, w);
        let y0 = (min.y.floor() as i64).clamp(0, h);
        let y1 = (max.y.ceil() as i64).clamp(0, h);
        for py in y0..y1 {
            for px in x0..x1 {
                if let Some(color) = paint(px as f64 + 0.5, py as f64 + 0.5) {
                    self.image.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }

    fn device_rect(&self, rect: RectF) -> (Point, f64, f64) {
        (
            self.to_device(rect.center),
            self.scale_len(rect.width) / 2.0,
            self.scale_len(rect.height) / 2.0,
        )
    }
}

/// Is `(x, y)` inside the rounded rectangle centred at `c` with half extents
/// `hw × hh` and corner radius `r`?
fn in_rounded_rect(x: f64, y: f64, c: Point, hw: f64, hh: f64, r: f64) -> bool {
    let r = r.min(hw).min(hh).max(0.0);
    let dx = ((x - c.x).abs() - (hw - r)).max(0.0);
    let dy = ((y - c.y).abs() - (hh - r)).max(0.0);
    (x - c.x).abs() <= hw && (y - c.y).abs() <= hh && dx * dx + dy * dy <= r * r
}

fn distance_to_segment(x: f64, y: f64, a: Point, b: Point) -> f64 {
    let (vx, vy) = (b.x - a.x, b.y - a.y);
    let len_sq = vx * vx + vy * vy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((x - a.x) * vx + (y - a.y) * vy) / len_sq).clamp(0.0, 1.0)
    };
    let (px, py) = (a.x + t * vx, a.y + t * vy);
    ((x - px).powi(2) + (y - py).powi(2)).sqrt()
}

impl Surface for RasterSurface {
    fn width(&self) -> f64 {
        self.image.width() as f64 / self.device_scale
    }

    fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
        self.labels.clear();
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba<u8>) {
        let (a, b) = (self.to_device(from), self.to_device(to));
        let half = (self.scale_len(width) / 2.0).max(MIN_HALF_STROKE);
        let min = Point::new(a.x.min(b.x) - half, a.y.min(b.y) - half);
        let max = Point::new(a.x.max(b.x) + half, a.y.max(b.y) + half);
        self.for_each_pixel(min, max, |x, y| (distance_to_segment(x, y, a, b) <= half).then_some(color));
    }

    fn fill_rounded_rect(&mut self, rect: RectF, radius: f64, color: Rgba<u8>) {
        let (c, hw, hh) = self.device_rect(rect);
        let r = self.scale_len(radius);
        let min = Point::new(c.x - hw, c.y - hh);
        let max = Point::new(c.x + hw, c.y + hh);
        self.for_each_pixel(min, max, |x, y| in_rounded_rect(x, y, c, hw, hh, r).then_some(color));
    }

    fn stroke_rounded_rect(&mut self, rect: RectF, radius: f64, width: f64, color: Rgba<u8>) {
        let (c, hw, hh) = self.device_rect(rect);
        let r = self.scale_len(radius);
        let stroke = self.scale_len(width).max(MIN_HALF_STROKE * 2.0);
        let min = Point::new(c.x - hw, c.y - hh);
        let max = Point::new(c.x + hw, c.y + hh);
        self.for_each_pixel(min, max, |x, y| {
            let outer = in_rounded_rect(x, y, c, hw, hh, r);
            let inner = in_rounded_rect(x, y, c, hw - stroke, hh - stroke, (r - stroke).max(0.0));
            (outer && !inner).then_some(color)
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba<u8>) {
        let c = self.to_device(center);
        let r = self.scale_len(radius).max(MIN_HALF_STROKE);
        let min = Point::new(c.x - r, c.y - r);
        let max = Point::new(c.x + r, c.y + r);
        self.for_each_pixel(min, max, |x, y| {
            ((x - c.x).powi(2) + (y - c.y).powi(2) <= r * r).then_some(color)
        });
    }

    fn text(&mut self, center: Point, text: &str, max_width: f64, role: TextRole, color: Rgba<u8>) {
        let p = self.to_device(center);
        let max_width = self.scale_len(max_width);
        self.labels.push(Label {
            x: p.x,
            y: p.y,
            text: text.to_string(),
            max_width,
            role,
            color,
        });
    }
}
