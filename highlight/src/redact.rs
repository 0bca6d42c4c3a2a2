use crate::matcher::MatchRegion;
use image::{Rgb, RgbImage};
use image_proc::{ERASE_COLOR, OutlineStyle, PixelBounds, cover_bounds_mut, outline_bounds_mut};

/// A covered block, kept for the numbering overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoveredRegion {
    pub center: (i32, i32),
    pub width: i32,
    pub height: i32,
}

impl CoveredRegion {
    /// Center and extents of painted bounds, as used for label placement.
    pub fn from_bounds(bounds: PixelBounds) -> Self {
        Self {
            center: bounds.center(),
            width: bounds.width(),
            height: bounds.height(),
        }
    }
}

/// Paints match regions onto the host image: an optional opaque cover,
/// then an outline that is always drawn.
#[derive(Debug, Clone, Copy)]
pub struct RegionRedactor {
    cover: bool,
    erase_color: Rgb<u8>,
    outline: OutlineStyle,
}

impl RegionRedactor {
    /// Red outlines, plus a white cover underneath when `cover` is set.
    pub fn new(cover: bool) -> Self {
        Self {
            cover,
            erase_color: ERASE_COLOR,
            outline: OutlineStyle::default(),
        }
    }

    /// Apply every region in order and return the covered ones in the same
    /// order. Nothing is returned when covering is off.
    pub fn apply(&self, image: &mut RgbImage, regions: &[MatchRegion]) -> Vec<CoveredRegion> {
        let mut covered = Vec::new();
        for region in regions {
            if self.cover {
                // Cover first so the outline stays visible around the block.
                if let Some(painted) = cover_bounds_mut(image, region.bounds, self.erase_color) {
                    covered.push(CoveredRegion::from_bounds(painted));
                }
            }
            outline_bounds_mut(image, region.bounds, self.outline);
        }
        covered
    }
}
