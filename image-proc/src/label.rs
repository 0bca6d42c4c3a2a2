use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use anyhow::{Context, Result, bail};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How label extents are measured. Chosen once when the font is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextMetrics {
    /// Laid-out glyph extent (advances plus outline bounds).
    Exact,
    /// Advance widths and ascent/descent from font-wide metrics; works for
    /// fonts whose digits carry no outlines.
    BoundingBox,
    /// `len * size * 0.6` by `size`; used when digits are not mapped.
    Heuristic,
}

impl TextMetrics {
    /// Pick the best strategy the font supports for digit labels.
    ///
    /// # Returns
    /// - `Heuristic` when any of `0`..`9` maps to the missing glyph.
    /// - `BoundingBox` when the digits exist but some lack outlines.
    /// - `Exact` otherwise.
    pub fn detect(font: &impl Font) -> Self {
        let mut outlined = true;
        for c in '0'..='9' {
            let id = font.glyph_id(c);
            if id.0 == 0 {
                return TextMetrics::Heuristic;
            }
            outlined &= font.outline(id).is_some();
        }
        if outlined {
            TextMetrics::Exact
        } else {
            TextMetrics::BoundingBox
        }
    }
}

impl FromStr for TextMetrics {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(TextMetrics::Exact),
            "bounding-box" | "bbox" => Ok(TextMetrics::BoundingBox),
            "heuristic" => Ok(TextMetrics::Heuristic),
            other => bail!("unknown label metrics {other:?} (exact, bounding-box, heuristic)"),
        }
    }
}

impl fmt::Display for TextMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextMetrics::Exact => "exact",
            TextMetrics::BoundingBox => "bounding-box",
            TextMetrics::Heuristic => "heuristic",
        };
        f.write_str(name)
    }
}

/// Fallback text extent: 0.6 em per character, one em tall.
pub fn heuristic_extent(text: &str, size: f32) -> (f32, f32) {
    (text.chars().count() as f32 * size * 0.6, size)
}

/// A TrueType/OpenType font used for number labels.
#[derive(Clone)]
pub struct LabelFont {
    font: FontArc,
    metrics: TextMetrics,
    source: PathBuf,
}

impl fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelFont")
            .field("source", &self.source)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl LabelFont {
    /// Parse font data and pick its measuring strategy.
    ///
    /// # Parameters
    /// - `bytes`: TrueType or OpenType data.
    /// - `source`: where the data came from, used in errors and logs.
    ///
    /// # Errors
    /// Fails when the data is not a font `ab_glyph` can read.
    pub fn from_bytes(bytes: Vec<u8>, source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let font = FontArc::try_from_vec(bytes)
            .with_context(|| format!("{} is not a usable font", source.display()))?;
        let metrics = TextMetrics::detect(&font);
        Ok(Self {
            font,
            metrics,
            source,
        })
    }

    /// Read and parse the font file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font {}", path.display()))?;
        Self::from_bytes(bytes, path)
    }

    /// First candidate that loads, in order.
    pub fn discover<I>(candidates: I) -> Option<Self>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        candidates
            .into_iter()
            .filter(|path| path.is_file())
            .find_map(|path| Self::load(&path).ok())
    }

    /// Replace the strategy picked at load time.
    pub fn with_metrics(mut self, metrics: TextMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Strategy used by [`LabelFont::measure`].
    pub fn metrics(&self) -> TextMetrics {
        self.metrics
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Width and height of `text` rendered at `size` pixels.
    ///
    /// `Exact` reports the tallest glyph's pixel height, so it is shorter
    /// than the one-em line height `BoundingBox` reports.
    pub fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        let scale = PxScale::from(size);
        match self.metrics {
            TextMetrics::Exact => {
                let (w, h) = text_size(scale, &self.font, text);
                (w as f32, h as f32)
            }
            TextMetrics::BoundingBox => {
                let scaled = self.font.as_scaled(scale);
                let width = text
                    .chars()
                    .map(|c| scaled.h_advance(scaled.glyph_id(c)))
                    .sum::<f32>();
                (width, scaled.ascent() - scaled.descent())
            }
            TextMetrics::Heuristic => heuristic_extent(text, size),
        }
    }

    /// Draw `text` with its line box's top-left corner at `(x, y)`.
    /// Pixels outside the image are skipped.
    pub fn draw_mut(&self, image: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: Rgb<u8>) {
        draw_text_mut(image, color, x, y, PxScale::from(size), &self.font, text);
    }
}

/// Common system font locations, tried in order.
pub fn default_font_candidates() -> Vec<PathBuf> {
    [
        "arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

/// Glyph cell of the built-in digits.
pub const BITMAP_DIGIT_WIDTH: u32 = 5;
pub const BITMAP_DIGIT_HEIGHT: u32 = 7;

// 5x7 glyphs, one row per byte, bit 4 is the leftmost column.
const DIGITS: [[u8; 7]; 10] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
];

/// Draw decimal digits with the built-in 5x7 bitmap, for when no font
/// could be loaded. Non-digit characters advance without drawing. Pixels
/// outside the image are skipped.
pub fn draw_bitmap_digits_mut(image: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
    let advance = BITMAP_DIGIT_WIDTH as i32 + 1;
    for (i, c) in text.chars().enumerate() {
        let Some(digit) = c.to_digit(10) else {
            continue;
        };
        let origin_x = x + i as i32 * advance;
        for (row, bits) in DIGITS[digit as usize].iter().enumerate() {
            for col in 0..BITMAP_DIGIT_WIDTH as i32 {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let px = origin_x + col;
                let py = y + row as i32;
                if px >= 0 && py >= 0 && (px as u32) < image.width() && (py as u32) < image.height() {
                    image.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

    fn dejavu() -> LabelFont {
        LabelFont::from_bytes(FONT_DATA.to_vec(), "DejaVuSans.ttf").unwrap()
    }

    #[test]
    fn outlined_digits_select_exact_metrics() {
        let font = dejavu();
        assert_eq!(font.metrics(), TextMetrics::Exact);
        assert_eq!(font.source(), Path::new("DejaVuSans.ttf"));
    }

    #[test]
    fn strategies_agree_on_width_and_differ_on_height() {
        let font = dejavu();
        let exact = font.measure("12", 20.0);
        let bbox = font.clone().with_metrics(TextMetrics::BoundingBox).measure("12", 20.0);
        let heuristic = font.with_metrics(TextMetrics::Heuristic).measure("12", 20.0);

        assert!(exact.0 > 0.0 && exact.1 > 0.0);
        // Exact truncates the same advances BoundingBox sums.
        assert!((bbox.0 - exact.0).abs() <= 1.0, "{exact:?} vs {bbox:?}");
        // Scaled ascent minus descent is the pixel size itself.
        assert!((bbox.1 - 20.0).abs() < 0.01, "{bbox:?}");
        assert!(exact.1 < bbox.1);
        assert_eq!(heuristic, (24.0, 20.0));
    }

    #[test]
    fn wider_text_measures_wider() {
        let font = dejavu();
        for metrics in [TextMetrics::Exact, TextMetrics::BoundingBox, TextMetrics::Heuristic] {
            let font = font.clone().with_metrics(metrics);
            assert!(font.measure("10", 16.0).0 > font.measure("1", 16.0).0, "{metrics}");
        }
    }

    #[test]
    fn drawn_text_stays_inside_its_line_box() {
        let white = Rgb([255, 255, 255]);
        let mut image = RgbImage::from_pixel(60, 40, white);
        let font = dejavu();
        let (w, h) = font.clone().with_metrics(TextMetrics::BoundingBox).measure("7", 20.0);
        font.draw_mut(&mut image, "7", 10, 5, 20.0, Rgb([0, 0, 255]));

        let ink: Vec<_> = image
            .enumerate_pixels()
            .filter(|(_, _, p)| **p != white)
            .map(|(x, y, _)| (x as f32, y as f32))
            .collect();
        assert!(!ink.is_empty());
        for (x, y) in ink {
            assert!(x >= 10.0 && x <= 10.0 + w.ceil(), "x {x}");
            assert!(y >= 5.0 && y <= 5.0 + h.ceil(), "y {y}");
        }
    }

    #[test]
    fn heuristic_scales_with_digit_count() {
        assert_eq!(heuristic_extent("7", 20.0), (12.0, 20.0));
        assert_eq!(heuristic_extent("12", 10.0), (12.0, 10.0));
    }

    #[test]
    fn metrics_parse_from_names() {
        assert_eq!("exact".parse::<TextMetrics>().unwrap(), TextMetrics::Exact);
        assert_eq!("BBox".parse::<TextMetrics>().unwrap(), TextMetrics::BoundingBox);
        assert_eq!(
            "heuristic".parse::<TextMetrics>().unwrap(),
            TextMetrics::Heuristic
        );
        assert!("huge".parse::<TextMetrics>().is_err());
        assert_eq!(TextMetrics::BoundingBox.to_string(), "bounding-box");
    }

    #[test]
    fn garbage_bytes_are_not_a_font() {
        assert!(LabelFont::from_bytes(vec![0, 1, 2, 3], "junk.ttf").is_err());
    }

    #[test]
    fn discovery_skips_missing_paths() {
        let found = LabelFont::discover(vec![PathBuf::from("/definitely/not/here.ttf")]);
        assert!(found.is_none());
    }

    #[test]
    fn bitmap_digits_draw_inside_their_cell() {
        let mut image = RgbImage::from_pixel(20, 10, Rgb([255, 255, 255]));
        let blue = Rgb([0, 0, 255]);
        draw_bitmap_digits_mut(&mut image, "1", 2, 1, blue);

        // Stem of the "1" sits in the middle column.
        assert_eq!(*image.get_pixel(4, 4), blue);
        let painted = image.pixels().filter(|p| **p == blue).count();
        assert!(painted > 0);
        for (x, y, p) in image.enumerate_pixels() {
            if *p == blue {
                assert!((2..7).contains(&x) && (1..8).contains(&y), "stray pixel at {x},{y}");
            }
        }
    }

    #[test]
    fn bitmap_digits_clip_at_edges() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        draw_bitmap_digits_mut(&mut image, "88", -3, -3, Rgb([0, 0, 255]));
        draw_bitmap_digits_mut(&mut image, "x", 0, 0, Rgb([0, 0, 255]));
    }
}
