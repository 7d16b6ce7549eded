//! Mask construction from watermark regions.
//!
//! A mask is a single-channel raster with the same dimensions as the
//! image it masks. Pixels above [`BINARY_THRESHOLD`] are "to be filled".
//! Multiple regions merge via pixelwise max, so the union is
//! commutative, associative and idempotent regardless of overlap.

use image::GrayImage;

use crate::region::Region;

/// A mask pixel above this value marks a pixel to be filled.
pub const BINARY_THRESHOLD: u8 = 127;

/// Build a mask of the given dimensions covering the supplied regions.
///
/// Each region is clipped to the image bounds and painted solid white;
/// out-of-bounds or zero-area regions contribute nothing. With
/// `feather > 0` the hard rectangle edges are softened by a Gaussian
/// blur with kernel size `2 * feather + 1`, producing intermediate
/// values along the former edges. `feather == 0` leaves the mask
/// strictly binary.
#[must_use]
pub fn build_mask(width: u32, height: u32, regions: &[Region], feather: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for region in regions {
        paint_region(&mut mask, region);
    }
    if feather > 0 {
        mask = gaussian_blur(&mask, feather);
    }
    mask
}

/// Paint one region into an existing mask (pixelwise max).
pub fn paint_region(mask: &mut GrayImage, region: &Region) {
    let Some(clipped) = region.clipped(mask.width(), mask.height()) else {
        return;
    };
    for y in clipped.y..clipped.y + clipped.height {
        for x in clipped.x..clipped.x + clipped.width {
            mask.put_pixel(x, y, image::Luma([255]));
        }
    }
}

/// Merge two same-sized masks via pixelwise max.
#[must_use]
pub fn union(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let mut out = a.clone();
    for (dst, src) in out.pixels_mut().zip(b.pixels()) {
        dst[0] = dst[0].max(src[0]);
    }
    out
}

/// Re-binarize a (possibly feathered) mask at [`BINARY_THRESHOLD`].
#[must_use]
pub fn binarize(mask: &GrayImage) -> GrayImage {
    let mut out = mask.clone();
    for px in out.pixels_mut() {
        px[0] = if px[0] > BINARY_THRESHOLD { 255 } else { 0 };
    }
    out
}

/// Count the pixels marked for filling.
#[must_use]
pub fn coverage(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] > BINARY_THRESHOLD).count()
}

/// Separable Gaussian blur with kernel size `2 * feather + 1`.
///
/// Sigma follows the OpenCV convention of deriving it from the kernel
/// size: `0.3 * ((ksize - 1) * 0.5 - 1) + 0.8`. Borders replicate the
/// edge pixel.
fn gaussian_blur(mask: &GrayImage, feather: u32) -> GrayImage {
    let kernel = gaussian_kernel(feather);
    let radius = feather as i64;
    let (w, h) = mask.dimensions();

    // Horizontal pass into f32, vertical pass back to u8.
    let mut horizontal = vec![0.0f32; (w as usize) * (h as usize)];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = (i64::from(x) + k as i64 - radius).clamp(0, i64::from(w) - 1);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let sample = f32::from(mask.get_pixel(sx as u32, y)[0]);
                acc += weight * sample;
            }
            horizontal[(y * w + x) as usize] = acc;
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = (i64::from(y) + k as i64 - radius).clamp(0, i64::from(h) - 1);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let sample = horizontal[(sy as u32 * w + x) as usize];
                acc += weight * sample;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            out.put_pixel(x, y, image::Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Normalized 1-D Gaussian kernel of size `2 * feather + 1`.
fn gaussian_kernel(feather: u32) -> Vec<f32> {
    let ksize = 2 * feather + 1;
    #[allow(clippy::cast_precision_loss)]
    let sigma = 0.3 * ((ksize - 1) as f32 * 0.5 - 1.0) + 0.8;
    let two_sigma_sq = 2.0 * sigma * sigma;

    #[allow(clippy::cast_precision_loss)]
    let mut kernel: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - feather as f32;
            (-d * d / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}
