//! Interactive region selection seam.
//!
//! Pointer-drag selection lives in an external collaborator; this
//! module only defines the contract plus a line-oriented implementation
//! the CLI uses. A selector works in original-image coordinates: any
//! display downscaling and coordinate rescaling is its own business.

use std::io::BufRead;

use image::RgbImage;

use crate::error::Result;
use crate::region::Region;

/// Outcome of an interactive selection.
///
/// An aborted selection is distinct from a selection of zero regions or
/// of zero-area regions; the latter two flow through the pipeline and
/// end as "nothing to do".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The user aborted the selection.
    Cancelled,
    /// The regions picked, possibly empty or zero-area.
    Regions(Vec<Region>),
}

/// Something that can pick watermark regions for an image.
pub trait RegionSelector {
    /// Select zero or more regions in original-image coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error when the selection channel itself fails (for
    /// the line selector, a read error on the input stream).
    fn select(&mut self, image: &RgbImage) -> Result<Selection>;
}

/// Line-oriented selector reading `x,y,w,h` tuples from a reader.
///
/// One region per line. A blank line or end of input finishes the
/// selection; `c` or `q` on its own line cancels it. In single mode the
/// first region finishes immediately.
pub struct LineSelector<R> {
    reader: R,
    multi: bool,
}

impl<R: BufRead> LineSelector<R> {
    /// Create a selector over a buffered reader.
    pub fn new(reader: R, multi: bool) -> Self {
        Self { reader, multi }
    }
}

impl<R: BufRead> RegionSelector for LineSelector<R> {
    fn select(&mut self, image: &RgbImage) -> Result<Selection> {
        eprintln!(
            "Enter watermark region(s) as x,y,w,h for a {}x{} image \
             (blank line finishes, c cancels):",
            image.width(),
            image.height()
        );

        let mut regions = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line)?;
            let trimmed = line.trim();
            if matches!(trimmed, "c" | "q") {
                return Ok(Selection::Cancelled);
            }
            if read == 0 || trimmed.is_empty() {
                // End of input before any region counts as an abort.
                if regions.is_empty() {
                    return Ok(Selection::Cancelled);
                }
                break;
            }
            match trimmed.parse::<Region>() {
                Ok(region) => {
                    eprintln!("Region #{}: {region}", regions.len() + 1);
                    regions.push(region);
                    if !self.multi {
                        break;
                    }
                }
                Err(e) => eprintln!("{e}, try again"),
            }
        }
        Ok(Selection::Regions(regions))
    }
}
