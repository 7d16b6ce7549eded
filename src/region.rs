//! Axis-aligned watermark regions in original-image coordinates.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// An axis-aligned rectangle marking a watermark, in original-image
/// coordinates.
///
/// A region with zero width or height is valid but covers no pixels;
/// the mask builder drops it. Regions may extend past the image bounds
/// and are clipped when painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// X coordinate of the top-left corner.
    pub x: u32,
    /// Y coordinate of the top-left corner.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Create a region from its corner and extent.
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the region covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clip the region to an image of the given dimensions.
    ///
    /// Returns `None` when nothing of the region lies inside the image.
    #[must_use]
    pub fn clipped(&self, img_w: u32, img_h: u32) -> Option<Region> {
        if self.is_empty() || self.x >= img_w || self.y >= img_h {
            return None;
        }
        let x2 = self.x.saturating_add(self.width).min(img_w);
        let y2 = self.y.saturating_add(self.height).min(img_h);
        Some(Region {
            x: self.x,
            y: self.y,
            width: x2 - self.x,
            height: y2 - self.y,
        })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) ~ ({}, {})",
            self.x,
            self.y,
            self.x.saturating_add(self.width),
            self.y.saturating_add(self.height)
        )
    }
}

impl FromStr for Region {
    type Err = Error;

    /// Parse a `x,y,width,height` literal as used by the CLI.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(Error::InvalidRegion(format!(
                "expected x,y,width,height, got {s:?}"
            )));
        }
        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| Error::InvalidRegion(format!("not a non-negative integer: {part:?}")))?;
        }
        Ok(Region::new(values[0], values[1], values[2], values[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_literal() {
        let r: Region = "10,20,300,40".parse().unwrap();
        assert_eq!(r, Region::new(10, 20, 300, 40));

        let r: Region = " 1, 2, 3, 4 ".parse().unwrap();
        assert_eq!(r, Region::new(1, 2, 3, 4));
    }

    #[test]
    fn rejects_malformed_literals() {
        assert!("10,20,300".parse::<Region>().is_err());
        assert!("10,20,300,40,1".parse::<Region>().is_err());
        assert!("a,b,c,d".parse::<Region>().is_err());
        assert!("-1,0,5,5".parse::<Region>().is_err());
    }

    #[test]
    fn clips_to_image_bounds() {
        let r = Region::new(90, 90, 20, 20);
        assert_eq!(r.clipped(100, 100), Some(Region::new(90, 90, 10, 10)));

        // Fully outside
        assert_eq!(Region::new(200, 0, 10, 10).clipped(100, 100), None);
        // Zero area
        assert_eq!(Region::new(10, 10, 0, 5).clipped(100, 100), None);
        // Fully inside is untouched
        let r = Region::new(10, 10, 20, 20);
        assert_eq!(r.clipped(100, 100), Some(r));
    }

    #[test]
    fn clip_survives_coordinate_overflow() {
        let r = Region::new(u32::MAX - 1, 0, u32::MAX, 10);
        assert_eq!(r.clipped(100, 100), None);
    }
}
