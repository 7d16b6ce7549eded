//! Inpainting backends and backend selection.
//!
//! All backends share one contract: [`InpaintBackend::fill`] takes the
//! image and a mask of identical dimensions and returns a new image of
//! the same dimensions with the masked pixels synthesized. Pixels
//! outside the mask are byte-identical to the input for the classical
//! backends; the deep backend resynthesizes through a model pass and
//! composites the untouched pixels back afterwards.

mod classical;
#[cfg(feature = "onnx")]
mod lama;

use std::path::PathBuf;

use image::{GrayImage, RgbImage};

use crate::error::Result;

pub use classical::{NavierStokes, Telea};
#[cfg(feature = "onnx")]
pub use lama::Lama;

/// Parameters shared by all backends.
#[derive(Debug, Clone)]
pub struct InpaintParams {
    /// Neighborhood radius for the classical fills.
    pub radius: u32,
    /// Explicit path to the deep model's ONNX weights.
    pub model: Option<PathBuf>,
}

impl InpaintParams {
    /// Default classical neighborhood radius.
    pub const DEFAULT_RADIUS: u32 = 5;

    /// Parameters with the default radius and no explicit model path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            radius: Self::DEFAULT_RADIUS,
            model: None,
        }
    }
}

impl Default for InpaintParams {
    fn default() -> Self {
        Self::new()
    }
}

/// One concrete inpainting algorithm.
pub trait InpaintBackend {
    /// Fill the mask-covered pixels of `image`.
    ///
    /// The returned image has the same dimensions as the input; the
    /// input itself is never mutated.
    ///
    /// # Errors
    ///
    /// Returns an error only for unrecoverable processing failures.
    /// Missing deep-model dependencies are not one: the deep backend
    /// logs the cause and falls back to the classical fill instead.
    fn fill(&self, image: &RgbImage, mask: &GrayImage, params: &InpaintParams) -> Result<RgbImage>;
}

/// Inpainting method selector tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// LaMa deep inpainting model (best quality).
    #[default]
    Lama,
    /// Navier-Stokes style diffusion fill (fast).
    NavierStokes,
    /// Telea style fast-marching fill (fastest).
    Telea,
}

impl Method {
    /// Parse a method tag.
    ///
    /// Unknown tags fall back to [`Method::Lama`] with a logged warning,
    /// mirroring the "some result outranks best result" policy used for
    /// backend availability.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "lama" => Method::Lama,
            "opencv" | "ns" => Method::NavierStokes,
            "telea" => Method::Telea,
            other => {
                log::warn!("unknown inpainting method {other:?}, using lama");
                Method::Lama
            }
        }
    }
}

/// Map a method tag to a concrete backend.
///
/// This is the single construction point for backends: adding one means
/// a new [`Method`] variant and a match arm here.
#[must_use]
pub fn select(method: Method) -> Box<dyn InpaintBackend> {
    match method {
        Method::NavierStokes => Box::new(NavierStokes),
        Method::Telea => Box::new(Telea),
        Method::Lama => Box::new(Lama::default()),
    }
}

/// Stand-in deep backend for builds without the `onnx` feature.
///
/// Keeps `lama` selectable so the fallback policy holds regardless of
/// how the crate was compiled.
#[cfg(not(feature = "onnx"))]
#[derive(Debug, Default)]
pub struct Lama;

#[cfg(not(feature = "onnx"))]
impl InpaintBackend for Lama {
    fn fill(&self, image: &RgbImage, mask: &GrayImage, params: &InpaintParams) -> Result<RgbImage> {
        log::warn!(
            "deep-model backend unavailable (built without the `onnx` feature), \
             falling back to Navier-Stokes fill"
        );
        NavierStokes.fill(image, mask, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_map_to_their_backends() {
        assert_eq!(Method::parse("lama"), Method::Lama);
        assert_eq!(Method::parse("opencv"), Method::NavierStokes);
        assert_eq!(Method::parse("ns"), Method::NavierStokes);
        assert_eq!(Method::parse("telea"), Method::Telea);
    }

    #[test]
    fn unknown_tags_fall_back_to_lama() {
        assert_eq!(Method::parse("patchmatch"), Method::Lama);
        assert_eq!(Method::parse(""), Method::Lama);
        assert_eq!(Method::parse("LAMA"), Method::Lama);
    }
}
