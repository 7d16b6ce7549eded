//! Remove rectangular watermark regions from images via inpainting.
//!
//! The watermark area — one rectangle or several — is converted into a
//! single binary (optionally feathered) mask, and the masked pixels are
//! resynthesized by a selectable backend: the LaMa deep inpainting
//! model, or one of two classical CPU fills. When the deep model's
//! runtime or weights are unavailable the fill degrades to the
//! classical backend instead of failing.
//!
//! # Quick Start
//!
//! ```no_run
//! use watermark_removal::{pipeline, PipelineOptions, Region};
//!
//! let image = pipeline::load_image("photo.png".as_ref()).unwrap();
//! let regions = [Region::new(10, 10, 200, 50)];
//! let opts = PipelineOptions::default();
//! let cleaned = pipeline::process(&image, &regions, &opts).unwrap();
//! cleaned.save("photo_no_watermark.png").unwrap();
//! ```
//!
//! # Backends
//!
//! | tag | backend | notes |
//! |-----|---------|-------|
//! | `lama` | LaMa ONNX model | best quality, needs the `onnx` feature |
//! | `ns`, `opencv` | diffusion fill | fast, CPU-only |
//! | `telea` | fast-marching fill | fastest, CPU-only |
//!
//! Unknown tags fall back to `lama` with a warning.

#![deny(missing_docs)]

pub mod error;
pub mod inpaint;
pub mod mask;
pub mod pipeline;
pub mod region;
pub mod selector;

pub use error::{Error, Result};
pub use inpaint::{InpaintBackend, InpaintParams, Method};
pub use pipeline::{default_output_path, Outcome, PipelineOptions};
pub use region::Region;
pub use selector::{RegionSelector, Selection};
