//! Pixel-level drawing used by the highlighting pipelines.
//!
//! All operations mutate an [`RgbImage`] in place and clip to its bounds,
//! so callers may pass rectangles that hang over the edge.

mod label;

pub use label::{
    BITMAP_DIGIT_HEIGHT, BITMAP_DIGIT_WIDTH, LabelFont, TextMetrics, default_font_candidates,
    draw_bitmap_digits_mut, heuristic_extent,
};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Opaque fill used to destroy covered text.
pub const ERASE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
/// Outline drawn around every located region.
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Color of sequential number labels.
pub const LABEL_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Quality used when the output extension asks for JPEG.
pub const JPEG_QUALITY: u8 = 95;

/// Rectangle given by inclusive corner pixels, like `[x0, y0, x1, y1]`
/// boxes in most drawing APIs. A single pixel has `left == right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelBounds {
    /// Build bounds from inclusive corners.
    ///
    /// # Parameters
    /// - `left`, `top`: first covered column and row.
    /// - `right`, `bottom`: last covered column and row.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build bounds from unsigned engine coordinates, saturating at
    /// `i32::MAX` so boxes far outside any image stay far outside.
    ///
    /// # Parameters
    /// - `left`, `top`, `right`, `bottom`: corners as reported by OCR.
    pub fn from_unsigned(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self::new(
            saturate_i32(left),
            saturate_i32(top),
            saturate_i32(right),
            saturate_i32(bottom),
        )
    }

    /// Horizontal extent `right - left`.
    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    /// Vertical extent `bottom - top`.
    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Center pixel, rounding toward the top-left corner.
    ///
    /// # Returns
    /// `(left + width / 2, top + height / 2)`.
    pub fn center(&self) -> (i32, i32) {
        (
            self.left.saturating_add(self.width() / 2),
            self.top.saturating_add(self.height() / 2),
        )
    }

    /// Grow (or shrink, for negative `margin`) on every side. Corners
    /// saturate instead of wrapping.
    pub fn expand(&self, margin: i32) -> Self {
        Self::new(
            self.left.saturating_sub(margin),
            self.top.saturating_sub(margin),
            self.right.saturating_add(margin),
            self.bottom.saturating_add(margin),
        )
    }

    /// Whether the corners are crossed, leaving no pixel.
    pub fn is_empty(&self) -> bool {
        self.right < self.left || self.bottom < self.top
    }

    /// Intersect with a `width x height` image.
    ///
    /// # Returns
    /// The part inside the image, or `None` when nothing is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let clamped = Self::new(
            self.left.max(0),
            self.top.max(0),
            self.right.min(saturate_i32(width - 1)),
            self.bottom.min(saturate_i32(height - 1)),
        );
        (!clamped.is_empty()).then_some(clamped)
    }

    /// Pull corners to at most one pixel outside a `width x height`
    /// image. Edges already visible stay put; edges outside land just off
    /// the canvas, so a hollow rectangle drawn from the result shows the
    /// same pixels as the unclipped one.
    fn clip_to_canvas(&self, width: u32, height: u32) -> Self {
        let max_x = saturate_i32(width);
        let max_y = saturate_i32(height);
        Self::new(
            self.left.clamp(-1, max_x),
            self.top.clamp(-1, max_y),
            self.right.clamp(-1, max_x),
            self.bottom.clamp(-1, max_y),
        )
    }

    /// Whether `(x, y)` lies strictly inside, edges excluded.
    pub fn contains_strictly(&self, x: i32, y: i32) -> bool {
        x > self.left && x < self.right && y > self.top && y < self.bottom
    }

    /// `imageproc` rectangle covering the same pixels.
    ///
    /// # Returns
    /// `None` for empty bounds or when the size does not fit a `Rect`.
    pub fn to_rect(&self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        let width = u32::try_from(self.right as i64 - self.left as i64 + 1).ok()?;
        let height = u32::try_from(self.bottom as i64 - self.top as i64 + 1).ok()?;
        // `Rect` stores its far edge as i32.
        if self.left as i64 + width as i64 > i32::MAX as i64
            || self.top as i64 + height as i64 > i32::MAX as i64
        {
            return None;
        }
        Some(Rect::at(self.left, self.top).of_size(width, height))
    }
}

/// `u32 -> i32`, saturating at `i32::MAX`.
pub fn saturate_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Stroke parameters for region outlines.
#[derive(Debug, Clone, Copy)]
pub struct OutlineStyle {
    /// Distance the outer edge sits outside the region.
    pub margin: i32,
    /// Stroke width, drawn inward from the outer edge.
    pub thickness: u32,
    pub color: Rgb<u8>,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            margin: 2,
            thickness: 3,
            color: OUTLINE_COLOR,
        }
    }
}

/// Convert any decoded image to RGB. Transparent pixels are composited
/// onto white instead of being dropped to black.
pub fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut output = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        output.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    output
}

/// Fill `bounds` with an opaque color after clamping to the image.
///
/// # Parameters
/// - `bounds`: inclusive region, possibly hanging over the edge.
/// - `color`: fill, normally [`ERASE_COLOR`].
///
/// # Returns
/// The clamped rectangle actually painted, or `None` when `bounds` lies
/// entirely outside the image.
pub fn cover_bounds_mut(
    image: &mut RgbImage,
    bounds: PixelBounds,
    color: Rgb<u8>,
) -> Option<PixelBounds> {
    let clamped = bounds.clamp_to(image.width(), image.height())?;
    let rect = clamped.to_rect()?;
    draw_filled_rect_mut(image, rect, color);
    Some(clamped)
}

/// Draw a hollow rectangle `style.margin` pixels outside `bounds`, with the
/// stroke growing inward from that outer edge. Strokes off the canvas are
/// skipped.
pub fn outline_bounds_mut(image: &mut RgbImage, bounds: PixelBounds, style: OutlineStyle) {
    let (width, height) = image.dimensions();
    let outer = bounds.expand(style.margin);
    for inset in 0..saturate_i32(style.thickness) {
        let ring = outer.expand(-inset).clip_to_canvas(width, height);
        if let Some(rect) = ring.to_rect() {
            draw_hollow_rect_mut(image, rect, style.color);
        }
    }
}

/// Save with the format implied by the extension; JPEG uses
/// [`JPEG_QUALITY`].
pub fn save_image(image: &RgbImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unsupported output format for {}", path.display()))?;

    if format == ImageFormat::Jpeg {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
        image
            .write_with_encoder(encoder)
            .with_context(|| format!("failed to encode {}", path.display()))?;
        return Ok(());
    }

    image
        .save_with_format(path, format)
        .with_context(|| format!("failed to save {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn bounds_measure_like_corner_boxes() {
        let b = PixelBounds::new(10, 40, 60, 60);
        assert_eq!(b.width(), 50);
        assert_eq!(b.height(), 20);
        assert_eq!(b.center(), (35, 50));
        let rect = b.to_rect().unwrap();
        assert_eq!((rect.width(), rect.height()), (51, 21));
    }

    #[test]
    fn huge_coordinates_saturate() {
        let b = PixelBounds::from_unsigned(u32::MAX - 5, 0, u32::MAX, 10);
        assert_eq!(b, PixelBounds::new(i32::MAX, 0, i32::MAX, 10));
        assert_eq!(b.expand(2), PixelBounds::new(i32::MAX - 2, -2, i32::MAX, 12));
        assert_eq!(b.center(), (i32::MAX, 5));
        assert_eq!(PixelBounds::new(i32::MIN, 0, i32::MAX, 0).width(), i32::MAX);
        assert!(PixelBounds::new(i32::MIN, 0, i32::MAX, 0).to_rect().is_none());
        assert_eq!(b.clamp_to(10, 10), None);
    }

    #[test]
    fn clamp_keeps_bounds_inside_image() {
        let b = PixelBounds::new(-5, 90, 30, 130);
        assert_eq!(b.clamp_to(20, 100), Some(PixelBounds::new(0, 90, 19, 99)));
        assert_eq!(PixelBounds::new(200, 0, 210, 5).clamp_to(20, 20), None);
    }

    #[test]
    fn cover_paints_inclusive_bounds() {
        let mut image = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        let painted = cover_bounds_mut(&mut image, PixelBounds::new(2, 3, 5, 6), ERASE_COLOR);
        assert_eq!(painted, Some(PixelBounds::new(2, 3, 5, 6)));
        assert_eq!(*image.get_pixel(2, 3), ERASE_COLOR);
        assert_eq!(*image.get_pixel(5, 6), ERASE_COLOR);
        assert_eq!(*image.get_pixel(6, 6), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(1, 3), Rgb([0, 0, 0]));
    }

    #[test]
    fn cover_clips_overhanging_regions() {
        let mut image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let painted = cover_bounds_mut(&mut image, PixelBounds::new(7, 7, 40, 40), ERASE_COLOR);
        assert_eq!(painted, Some(PixelBounds::new(7, 7, 9, 9)));
        assert_eq!(*image.get_pixel(9, 9), ERASE_COLOR);
    }

    #[test]
    fn outline_sits_outside_with_inward_stroke() {
        let mut image = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
        let bounds = PixelBounds::new(10, 10, 20, 20);
        outline_bounds_mut(&mut image, bounds, OutlineStyle::default());

        // Outer edge at 8, stroke covers 8, 9 and 10.
        for x in [8, 9, 10] {
            assert_eq!(*image.get_pixel(x, 15), OUTLINE_COLOR, "x = {x}");
        }
        assert_eq!(*image.get_pixel(7, 15), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(11, 15), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(22, 22), OUTLINE_COLOR);
        assert_eq!(*image.get_pixel(15, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn outline_near_edge_is_clipped() {
        let mut image = RgbImage::from_pixel(12, 12, Rgb([0, 0, 0]));
        outline_bounds_mut(&mut image, PixelBounds::new(0, 0, 11, 11), OutlineStyle::default());
        assert_eq!(*image.get_pixel(0, 5), OUTLINE_COLOR);
        assert_eq!(*image.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn outline_far_outside_leaves_image_untouched() {
        let ink = Rgb([0, 0, 0]);
        let mut image = RgbImage::from_pixel(10, 10, ink);
        let far = PixelBounds::from_unsigned(u32::MAX - 5, 0, u32::MAX, 10);
        outline_bounds_mut(&mut image, far, OutlineStyle::default());
        let behind = PixelBounds::new(i32::MIN, i32::MIN, -20, -20);
        outline_bounds_mut(&mut image, behind, OutlineStyle::default());
        assert!(image.pixels().all(|p| *p == ink));
    }

    #[test]
    fn outline_overhanging_keeps_visible_edges() {
        let mut image = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        outline_bounds_mut(&mut image, PixelBounds::new(-50, 5, 10, 10), OutlineStyle::default());
        // Right stroke at 12, 11, 10 and top stroke at rows 3..=5.
        assert_eq!(*image.get_pixel(12, 8), OUTLINE_COLOR);
        assert_eq!(*image.get_pixel(0, 3), OUTLINE_COLOR);
        assert_eq!(*image.get_pixel(13, 8), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(0, 8), Rgb([0, 0, 0]));
    }

    #[test]
    fn transparent_pixels_flatten_to_white() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let flat = flatten_to_rgb(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(*flat.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*flat.get_pixel(1, 0), Rgb([10, 20, 30]));
    }

    #[test]
    fn grayscale_converts_to_rgb() {
        let gray = image::GrayImage::from_pixel(1, 1, image::Luma([77]));
        let flat = flatten_to_rgb(&DynamicImage::ImageLuma8(gray));
        assert_eq!(*flat.get_pixel(0, 0), Rgb([77, 77, 77]));
    }

    #[test]
    fn save_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbImage::from_pixel(8, 8, Rgb([200, 10, 10]));

        let png = dir.path().join("out.png");
        save_image(&image, &png).unwrap();
        assert_eq!(image::open(&png).unwrap().to_rgb8(), image);

        let jpg = dir.path().join("out.JPG");
        save_image(&image, &jpg).unwrap();
        let decoded = image::open(&jpg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));

        assert!(save_image(&image, &dir.path().join("out.unknown")).is_err());
    }
}
