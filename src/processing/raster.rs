//! Bitmap rendering of a captured path
//!
//! The image-based recognizer receives a snapshot of the drawing: black dots
//! on a white screen-sized canvas, encoded as PNG.

use crate::capture::types::SampledPoint;
use crate::dispatch::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};

/// Dot radius in canvas pixels (10 px diameter)
pub const DEFAULT_DOT_RADIUS: f64 = 5.0;

/// Largest canvas side accepted for rendering
pub const MAX_CANVAS_SIDE: u32 = 8192;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

/// Size of the drawing surface in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Both sides non-zero and at most `MAX_CANVAS_SIDE`.
    pub fn is_drawable(&self) -> bool {
        (1..=MAX_CANVAS_SIDE).contains(&self.width) && (1..=MAX_CANVAS_SIDE).contains(&self.height)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 390,
            height: 844,
        }
    }
}

/// 8-bit RGBA pixel buffer, row-major without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaCanvas {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbaCanvas {
    pub fn filled(size: CanvasSize, color: [u8; 4]) -> Self {
        let pixels = size.width as usize * size.height as usize;
        let mut data = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            data.extend_from_slice(&color);
        }
        Self {
            width: size.width,
            height: size.height,
            data,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[i..i + 4]);
        Some(px)
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&color);
    }

    /// Fill a disc, clipped to the canvas.
    fn fill_disc(&mut self, cx: f64, cy: f64, radius: f64, color: [u8; 4]) {
        if !(cx.is_finite() && cy.is_finite()) {
            return;
        }

        let min_x = (cx - radius).floor().max(0.0);
        let max_x = (cx + radius).ceil().min(self.width as f64 - 1.0);
        let min_y = (cy - radius).floor().max(0.0);
        let max_y = (cy + radius).ceil().min(self.height as f64 - 1.0);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let r2 = radius * radius;
        for y in min_y as u32..=max_y as u32 {
            for x in min_x as u32..=max_x as u32 {
                // Sample at the pixel center
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel(x, y, color);
                }
            }
        }
    }
}

/// Draw each point as a solid black dot on a white canvas.
pub fn render_dots(points: &[SampledPoint], size: CanvasSize, dot_radius: f64) -> Result<RgbaCanvas> {
    if !size.is_drawable() {
        return Err(DispatchError::Render(format!(
            "canvas must be between 1x1 and {max}x{max} ({}x{})",
            size.width,
            size.height,
            max = MAX_CANVAS_SIDE
        )));
    }

    let mut canvas = RgbaCanvas::filled(size, WHITE);
    for p in points {
        canvas.fill_disc(p.x, p.y, dot_radius, BLACK);
    }
    Ok(canvas)
}

pub fn encode_png(canvas: &RgbaCanvas) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, canvas.width, canvas.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_srgb(png::SrgbRenderingIntent::AbsoluteColorimetric);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&canvas.data)?;
        writer.finish()?;
    }
    Ok(out)
}

/// Render and encode in one step.
pub fn snapshot_png(points: &[SampledPoint], size: CanvasSize) -> Result<Vec<u8>> {
    let canvas = render_dots(points, size, DEFAULT_DOT_RADIUS)?;
    encode_png(&canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> CanvasSize {
        CanvasSize {
            width: 40,
            height: 30,
        }
    }

    #[test]
    fn test_dot_is_drawn_at_point() {
        let canvas = render_dots(&[SampledPoint::new(20.0, 15.0, 0.0)], small(), DEFAULT_DOT_RADIUS).unwrap();

        assert_eq!(canvas.pixel(20, 15), Some(BLACK));
        assert_eq!(canvas.pixel(22, 17), Some(BLACK));
        assert_eq!(canvas.pixel(0, 0), Some(WHITE));
        assert_eq!(canvas.pixel(39, 29), Some(WHITE));
    }

    #[test]
    fn test_points_outside_canvas_are_clipped() {
        let canvas = render_dots(
            &[
                SampledPoint::new(-100.0, -100.0, 0.0),
                SampledPoint::new(1.0, 1.0, 1.0),
                SampledPoint::new(f64::INFINITY, 3.0, 2.0),
            ],
            small(),
            DEFAULT_DOT_RADIUS,
        )
        .unwrap();

        assert_eq!(canvas.data.len(), 40 * 30 * 4);
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
        assert_eq!(canvas.pixel(30, 20), Some(WHITE));
    }

    #[test]
    fn test_empty_canvas_is_render_error() {
        let err = render_dots(&[], CanvasSize { width: 0, height: 10 }, 5.0).unwrap_err();
        assert!(matches!(err, DispatchError::Render(_)));
    }

    #[test]
    fn test_oversized_canvas_is_render_error() {
        let size = CanvasSize {
            width: MAX_CANVAS_SIDE + 1,
            height: 10,
        };
        assert!(!size.is_drawable());
        let err = render_dots(&[], size, 5.0).unwrap_err();
        assert!(matches!(err, DispatchError::Render(_)));
        assert!(CanvasSize {
            width: MAX_CANVAS_SIDE,
            height: MAX_CANVAS_SIDE
        }
        .is_drawable());
    }

    #[test]
    fn test_png_header_and_size() {
        let data = snapshot_png(&[SampledPoint::new(5.0, 5.0, 0.0)], small()).unwrap();
        assert_eq!(&data[..8], b"\x89PNG\r\n\x1a\n");

        let decoder = png::Decoder::new(std::io::Cursor::new(data));
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (40, 30));
        assert_eq!(info.color_type, png::ColorType::Rgba);
    }
}
