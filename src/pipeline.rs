//! The region pipeline: load, build mask, select backend, fill, emit.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};

use crate::error::{Error, Result};
use crate::inpaint::{self, InpaintParams, Method};
use crate::mask;
use crate::region::Region;

/// Options controlling one pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Inpainting backend to use.
    pub method: Method,
    /// Neighborhood radius for the classical fills.
    pub radius: u32,
    /// Mask edge feathering radius (0 = hard edges).
    pub feather: u32,
    /// Explicit deep-model weight file.
    pub model: Option<PathBuf>,
    /// Compose a before/after preview instead of writing a file.
    pub preview: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            method: Method::default(),
            radius: InpaintParams::DEFAULT_RADIUS,
            feather: 0,
            model: None,
            preview: false,
        }
    }
}

/// Terminal state of a pipeline invocation.
#[derive(Debug)]
pub enum Outcome {
    /// The result was written to this path.
    Written(PathBuf),
    /// Preview mode: the composed before/after image, nothing written.
    Preview(RgbImage),
    /// No region covered any pixel; nothing was done and nothing written.
    NothingToDo,
}

/// Load an image file as an 8-bit RGB raster.
///
/// # Errors
///
/// Returns [`Error::CannotOpenImage`] when the path is unreadable or
/// does not decode; this is the pipeline's only fatal input error.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|source| Error::CannotOpenImage {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

/// Fill the given regions of an already-loaded image.
///
/// This is the core transformation: build one unioned (optionally
/// feathered) mask, pick the backend for `method`, and run its fill.
///
/// # Errors
///
/// Propagates backend failures; deep-model unavailability is handled
/// inside the backend and never surfaces here.
pub fn process(image: &RgbImage, regions: &[Region], opts: &PipelineOptions) -> Result<RgbImage> {
    let mask = build_pipeline_mask(image, regions, opts.feather);
    log::debug!(
        "mask covers {} of {} pixels",
        mask::coverage(&mask),
        (image.width() as usize) * (image.height() as usize)
    );
    let backend = inpaint::select(opts.method);
    let params = InpaintParams {
        radius: opts.radius,
        model: opts.model.clone(),
    };
    backend.fill(image, &mask, &params)
}

/// Run the whole pipeline for one input file.
///
/// `output` of `None` derives `<stem>_no_watermark<ext>` beside the
/// input. Regions that cover no pixel of the image are dropped; when
/// nothing remains the invocation is a clean no-op.
///
/// # Errors
///
/// Fails on unreadable input or on failing to persist the result.
pub fn run(
    input: &Path,
    output: Option<&Path>,
    regions: &[Region],
    opts: &PipelineOptions,
) -> Result<Outcome> {
    let image = load_image(input)?;
    log::info!(
        "image {}x{}, {} region(s), method {:?}",
        image.width(),
        image.height(),
        regions.len(),
        opts.method
    );

    let mask = build_pipeline_mask(&image, regions, opts.feather);
    if mask::coverage(&mask) == 0 {
        log::info!("no region covers the image, nothing to do");
        return Ok(Outcome::NothingToDo);
    }

    let backend = inpaint::select(opts.method);
    let params = InpaintParams {
        radius: opts.radius,
        model: opts.model.clone(),
    };
    let result = backend.fill(&image, &mask, &params)?;

    if opts.preview {
        return Ok(Outcome::Preview(compose_preview(&image, &result, regions)));
    }

    let path = output.map_or_else(|| default_output_path(input), Path::to_path_buf);
    save_image(&result, &path)?;
    Ok(Outcome::Written(path))
}

fn build_pipeline_mask(image: &RgbImage, regions: &[Region], feather: u32) -> GrayImage {
    mask::build_mask(image.width(), image.height(), regions, feather)
}

/// Compose original (regions outlined) and result side by side.
#[must_use]
pub fn compose_preview(original: &RgbImage, result: &RgbImage, regions: &[Region]) -> RgbImage {
    let (w, h) = original.dimensions();
    let mut annotated = original.clone();
    for region in regions {
        outline_region(&mut annotated, region, Rgb([255, 0, 0]));
    }

    let mut combined = RgbImage::new(w * 2, h);
    for (x, y, px) in annotated.enumerate_pixels() {
        combined.put_pixel(x, y, *px);
    }
    for (x, y, px) in result.enumerate_pixels() {
        combined.put_pixel(w + x, y, *px);
    }
    combined
}

/// Draw a two-pixel rectangle outline, clipped to the image.
fn outline_region(image: &mut RgbImage, region: &Region, color: Rgb<u8>) {
    let Some(clipped) = region.clipped(image.width(), image.height()) else {
        return;
    };
    let (x1, y1) = (clipped.x, clipped.y);
    let (x2, y2) = (x1 + clipped.width - 1, y1 + clipped.height - 1);
    for y in y1..=y2 {
        for x in x1..=x2 {
            let on_border = x - x1 < 2 || x2 - x < 2 || y - y1 < 2 || y2 - y < 2;
            if on_border {
                image.put_pixel(x, y, color);
            }
        }
    }
}

/// Save an RGB image with format-specific quality settings.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format = image::ImageFormat::from_path(path)?;
    let dyn_img = DynamicImage::ImageRgb8(img.clone());

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&dyn_img)?;
        }
        _ => {
            dyn_img.save(path)?;
        }
    }
    Ok(())
}

/// Derive the default output path from an input path.
///
/// Example: `"photo.png"` becomes `"photo_no_watermark.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    match input.extension() {
        Some(ext) => parent.join(format!("{stem}_no_watermark.{}", ext.to_string_lossy())),
        None => parent.join(format!("{stem}_no_watermark")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_appends_no_watermark_suffix() {
        let p = default_output_path(Path::new("/tmp/photo.png"));
        assert_eq!(p, PathBuf::from("/tmp/photo_no_watermark.png"));

        let p = default_output_path(Path::new("image.jpg"));
        assert_eq!(
            p.file_name().unwrap().to_str().unwrap(),
            "image_no_watermark.jpg"
        );

        let p = default_output_path(Path::new("noext"));
        assert_eq!(p.file_name().unwrap().to_str().unwrap(), "noext_no_watermark");
    }

    #[test]
    fn load_image_reports_unreadable_path() {
        let err = load_image(Path::new("/definitely/missing.png")).unwrap_err();
        match err {
            Error::CannotOpenImage { path, .. } => {
                assert_eq!(path, PathBuf::from("/definitely/missing.png"));
            }
            other => panic!("expected CannotOpenImage, got {other:?}"),
        }
    }

    #[test]
    fn preview_composes_side_by_side_with_outline() {
        let original = RgbImage::from_pixel(40, 30, Rgb([50, 50, 50]));
        let result = RgbImage::from_pixel(40, 30, Rgb([90, 90, 90]));
        let regions = [Region::new(10, 10, 10, 10)];

        let preview = compose_preview(&original, &result, &regions);
        assert_eq!(preview.dimensions(), (80, 30));
        // Outline on the left half only.
        assert_eq!(*preview.get_pixel(10, 10), Rgb([255, 0, 0]));
        assert_eq!(*preview.get_pixel(0, 0), Rgb([50, 50, 50]));
        // Right half carries the result untouched.
        assert_eq!(*preview.get_pixel(50, 10), Rgb([90, 90, 90]));
    }

    #[test]
    fn outline_survives_out_of_bounds_region() {
        let mut img = RgbImage::new(20, 20);
        outline_region(&mut img, &Region::new(100, 100, 5, 5), Rgb([255, 0, 0]));
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn process_routes_through_classical_backend() {
        let image = RgbImage::from_pixel(50, 50, Rgb([100, 100, 100]));
        let opts = PipelineOptions {
            method: Method::Telea,
            ..PipelineOptions::default()
        };
        let out = process(&image, &[Region::new(10, 10, 10, 10)], &opts).unwrap();
        assert_eq!(out.dimensions(), image.dimensions());
    }
}
