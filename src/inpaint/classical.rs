//! Classical CPU inpainting fills.
//!
//! Both backends binarize the mask at the shared threshold, then
//! propagate surrounding pixel information into the hole:
//!
//! * [`NavierStokes`] solves a discrete Laplace equation over the hole
//!   (iterative diffusion with the known pixels as a fixed boundary),
//!   echoing OpenCV's `INPAINT_NS` flavor.
//! * [`Telea`] fills pixels in increasing distance-from-boundary order
//!   and averages the already-known neighborhood, echoing the
//!   fast-marching `INPAINT_TELEA` flavor.
//!
//! Neither touches any pixel outside the hole, so the untouched part of
//! the output is byte-identical to the input.

use std::collections::VecDeque;

use image::{GrayImage, RgbImage};

use crate::error::Result;
use crate::mask::BINARY_THRESHOLD;

use super::{InpaintBackend, InpaintParams};

/// Diffusion-style fill (method tag `ns` / `opencv`).
#[derive(Debug, Default)]
pub struct NavierStokes;

/// Fast-marching-style fill (method tag `telea`).
#[derive(Debug, Default)]
pub struct Telea;

impl InpaintBackend for NavierStokes {
    fn fill(&self, image: &RgbImage, mask: &GrayImage, params: &InpaintParams) -> Result<RgbImage> {
        let mut hole = Hole::from_mask(image, mask);
        hole.seed_by_marching();
        hole.diffuse(params.radius);
        Ok(hole.into_image())
    }
}

impl InpaintBackend for Telea {
    fn fill(&self, image: &RgbImage, mask: &GrayImage, params: &InpaintParams) -> Result<RgbImage> {
        let radius = params.radius.max(1) as i64;
        let mut hole = Hole::from_mask(image, mask);
        let (w, h) = (hole.width as i64, hole.height as i64);

        // Weighted average over the already-known window, weight falling
        // off with squared distance as in Telea's original estimator.
        let mut known = hole.known.clone();
        let order = hole.march_order.clone();
        for &idx in &order {
            let (px, py) = ((idx % hole.width) as i64, (idx / hole.width) as i64);
            let mut acc = [0.0f32; 3];
            let mut weight_sum = 0.0f32;
            for ny in (py - radius).max(0)..=(py + radius).min(h - 1) {
                for nx in (px - radius).max(0)..=(px + radius).min(w - 1) {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let nidx = (ny as usize) * hole.width + nx as usize;
                    if !known[nidx] {
                        continue;
                    }
                    let (dx, dy) = (nx - px, ny - py);
                    #[allow(clippy::cast_precision_loss)]
                    let weight = 1.0 / (1.0 + (dx * dx + dy * dy) as f32);
                    for (a, v) in acc.iter_mut().zip(hole.pixel(nidx)) {
                        *a += weight * v;
                    }
                    weight_sum += weight;
                }
            }
            if weight_sum > 0.0 {
                hole.set_pixel(idx, acc.map(|a| a / weight_sum));
            }
            known[idx] = true;
        }
        Ok(hole.into_image())
    }
}

/// Working state shared by both classical fills: f32 pixel plane,
/// known/unknown flags, and the hole traversal order from a multi-source
/// BFS that approximates the fast-marching distance field.
struct Hole {
    width: usize,
    height: usize,
    pixels: Vec<f32>,
    known: Vec<bool>,
    /// Hole indices in increasing distance-from-boundary order.
    march_order: Vec<usize>,
    /// BFS depth of the furthest hole pixel.
    max_depth: u32,
}

impl Hole {
    fn from_mask(image: &RgbImage, mask: &GrayImage) -> Self {
        debug_assert_eq!(image.dimensions(), mask.dimensions());
        let (w, h) = (image.width() as usize, image.height() as usize);

        let mut pixels = vec![0.0f32; w * h * 3];
        for (i, px) in image.pixels().enumerate() {
            for c in 0..3 {
                pixels[i * 3 + c] = f32::from(px[c]);
            }
        }
        let known: Vec<bool> = mask.pixels().map(|p| p[0] <= BINARY_THRESHOLD).collect();

        let (march_order, max_depth) = march(w, h, &known);
        Self {
            width: w,
            height: h,
            pixels,
            known,
            march_order,
            max_depth,
        }
    }

    fn pixel(&self, idx: usize) -> [f32; 3] {
        [
            self.pixels[idx * 3],
            self.pixels[idx * 3 + 1],
            self.pixels[idx * 3 + 2],
        ]
    }

    fn set_pixel(&mut self, idx: usize, value: [f32; 3]) {
        self.pixels[idx * 3..idx * 3 + 3].copy_from_slice(&value);
    }

    /// Initialize hole pixels in marching order with the average of
    /// their already-known 8-neighborhood. Marching order guarantees at
    /// least one known neighbor per visited pixel.
    fn seed_by_marching(&mut self) {
        let (w, h) = (self.width as i64, self.height as i64);
        let order = self.march_order.clone();
        for &idx in &order {
            let (px, py) = ((idx % self.width) as i64, (idx / self.width) as i64);
            let mut acc = [0.0f32; 3];
            let mut n = 0u32;
            for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (px + dx, py + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let nidx = (ny as usize) * self.width + nx as usize;
                    if self.known[nidx] {
                        for (a, v) in acc.iter_mut().zip(self.pixel(nidx)) {
                            *a += v;
                        }
                        n += 1;
                    }
                }
            }
            if n > 0 {
                #[allow(clippy::cast_precision_loss)]
                self.set_pixel(idx, acc.map(|a| a / n as f32));
            }
            self.known[idx] = true;
        }
    }

    /// Jacobi diffusion sweeps over the hole, with the original known
    /// pixels as a fixed Dirichlet boundary. Sweep count scales with the
    /// hole depth and the requested radius.
    fn diffuse(&mut self, radius: u32) {
        if self.march_order.is_empty() {
            return;
        }
        let sweeps = (2 * self.max_depth + 8 * radius).clamp(32, 512);
        let (w, h) = (self.width as i64, self.height as i64);

        let order = self.march_order.clone();
        for _ in 0..sweeps {
            let snapshot = self.pixels.clone();
            for &idx in &order {
                let (px, py) = ((idx % self.width) as i64, (idx / self.width) as i64);
                let mut acc = [0.0f32; 3];
                let mut n = 0u32;
                for (dx, dy) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
                    let (nx, ny) = (px + dx, py + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let nidx = (ny as usize) * self.width + nx as usize;
                    for (a, c) in acc.iter_mut().zip(0..3) {
                        *a += snapshot[nidx * 3 + c];
                    }
                    n += 1;
                }
                if n > 0 {
                    #[allow(clippy::cast_precision_loss)]
                    self.set_pixel(idx, acc.map(|a| a / n as f32));
                }
            }
        }
    }

    fn into_image(self) -> RgbImage {
        #[allow(clippy::cast_possible_truncation)]
        let mut out = RgbImage::new(self.width as u32, self.height as u32);
        for (i, px) in out.pixels_mut().enumerate() {
            for c in 0..3 {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    px[c] = self.pixels[i * 3 + c].round().clamp(0.0, 255.0) as u8;
                }
            }
        }
        out
    }
}

/// Multi-source BFS from the hole boundary inward.
///
/// Returns the hole pixel indices in increasing distance order plus the
/// maximum depth reached. A hole with no adjacent known pixel (the whole
/// image masked) yields an empty order and is left untouched.
fn march(w: usize, h: usize, known: &[bool]) -> (Vec<usize>, u32) {
    let mut depth = vec![u32::MAX; w * h];
    let mut queue = VecDeque::new();

    for idx in 0..w * h {
        if known[idx] {
            continue;
        }
        let (px, py) = ((idx % w) as i64, (idx / w) as i64);
        let boundary = neighbors4(px, py, w, h).any(|nidx| known[nidx]);
        if boundary {
            depth[idx] = 1;
            queue.push_back(idx);
        }
    }

    let mut order = Vec::new();
    let mut max_depth = 0;
    while let Some(idx) = queue.pop_front() {
        order.push(idx);
        max_depth = max_depth.max(depth[idx]);
        let (px, py) = ((idx % w) as i64, (idx / w) as i64);
        for nidx in neighbors4(px, py, w, h) {
            if !known[nidx] && depth[nidx] == u32::MAX {
                depth[nidx] = depth[idx] + 1;
                queue.push_back(nidx);
            }
        }
    }
    (order, max_depth)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn neighbors4(px: i64, py: i64, w: usize, h: usize) -> impl Iterator<Item = usize> {
    [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)]
        .into_iter()
        .filter_map(move |(dx, dy)| {
            let (nx, ny) = (px + dx, py + dy);
            if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                None
            } else {
                Some((ny as usize) * w + nx as usize)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::build_mask;
    use crate::region::Region;
    use image::Rgb;

    fn gradient_image(w: u32, h: u32) -> RgbImage {
        let mut img = RgbImage::new(w, h);
        for (x, y, px) in img.enumerate_pixels_mut() {
            #[allow(clippy::cast_possible_truncation)]
            {
                *px = Rgb([(x * 2) as u8, (y * 2) as u8, 128]);
            }
        }
        img
    }

    fn assert_untouched_outside(
        backend: &dyn InpaintBackend,
        image: &RgbImage,
        region: Region,
    ) -> RgbImage {
        let mask = build_mask(image.width(), image.height(), &[region], 0);
        let out = backend.fill(image, &mask, &InpaintParams::new()).unwrap();
        assert_eq!(out.dimensions(), image.dimensions());
        for (x, y, px) in image.enumerate_pixels() {
            let inside = x >= region.x
                && x < region.x + region.width
                && y >= region.y
                && y < region.y + region.height;
            if !inside {
                assert_eq!(out.get_pixel(x, y), px, "pixel ({x},{y}) modified");
            }
        }
        out
    }

    #[test]
    fn navier_stokes_preserves_pixels_outside_mask() {
        let img = gradient_image(60, 60);
        assert_untouched_outside(&NavierStokes, &img, Region::new(20, 20, 15, 15));
    }

    #[test]
    fn telea_preserves_pixels_outside_mask() {
        let img = gradient_image(60, 60);
        assert_untouched_outside(&Telea, &img, Region::new(20, 20, 15, 15));
    }

    #[test]
    fn fills_replace_a_distinct_block() {
        // 100x100 gray canvas with a magenta 20x20 block at (10,10); the
        // fill must synthesize something that is no longer magenta.
        let mut img = RgbImage::from_pixel(100, 100, Rgb([120, 120, 120]));
        for y in 10..30 {
            for x in 10..30 {
                img.put_pixel(x, y, Rgb([255, 0, 255]));
            }
        }
        let region = Region::new(10, 10, 20, 20);

        for backend in [&NavierStokes as &dyn InpaintBackend, &Telea] {
            let out = assert_untouched_outside(backend, &img, region);
            let center = out.get_pixel(20, 20);
            assert_ne!(*center, Rgb([255, 0, 255]), "block not filled");
            for c in 0..3 {
                let diff = (i32::from(center[c]) - 120).abs();
                assert!(diff < 30, "fill channel {c} far from surround: {center:?}");
            }
        }
    }

    #[test]
    fn solid_surround_fills_hole_with_the_same_color() {
        let img = RgbImage::from_pixel(40, 40, Rgb([10, 200, 60]));
        let mask = build_mask(40, 40, &[Region::new(15, 15, 8, 8)], 0);

        for backend in [&NavierStokes as &dyn InpaintBackend, &Telea] {
            let out = backend.fill(&img, &mask, &InpaintParams::new()).unwrap();
            for px in out.pixels() {
                for c in 0..3 {
                    let diff = (i32::from(px[c]) - i32::from(img.get_pixel(0, 0)[c])).abs();
                    assert!(diff <= 1);
                }
            }
        }
    }

    #[test]
    fn empty_mask_is_identity() {
        let img = gradient_image(30, 30);
        let mask = GrayImage::new(30, 30);
        for backend in [&NavierStokes as &dyn InpaintBackend, &Telea] {
            let out = backend.fill(&img, &mask, &InpaintParams::new()).unwrap();
            assert_eq!(out, img);
        }
    }

    #[test]
    fn fully_masked_image_does_not_crash() {
        let img = gradient_image(16, 16);
        let mask = GrayImage::from_pixel(16, 16, image::Luma([255]));
        for backend in [&NavierStokes as &dyn InpaintBackend, &Telea] {
            let out = backend.fill(&img, &mask, &InpaintParams::new()).unwrap();
            assert_eq!(out.dimensions(), img.dimensions());
        }
    }

    #[test]
    fn marching_orders_hole_by_distance() {
        // 5x5 with a 3x3 hole in the middle: ring first, center last.
        let known: Vec<bool> = (0..25)
            .map(|i| {
                let (x, y) = (i % 5, i / 5);
                !(1..=3).contains(&x) || !(1..=3).contains(&y)
            })
            .collect();
        let (order, max_depth) = march(5, 5, &known);
        assert_eq!(order.len(), 9);
        assert_eq!(max_depth, 2);
        assert_eq!(*order.last().unwrap(), 12); // center pixel
    }
}
