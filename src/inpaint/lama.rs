//! LaMa deep inpainting backend running on ONNX Runtime.
//!
//! The model expects a 1x3x512x512 RGB image tensor and a 1x1x512x512
//! binary mask tensor, both `f32` in `[0, 1]`, and produces an image
//! tensor in the same layout. Image and mask are resized to the model
//! side, run through one inference-only pass, resized back, and
//! composited so only mask-covered pixels come from the model.
//!
//! Availability is best-effort: any failure to resolve the weights or
//! to build/run the session degrades to the Navier-Stokes fill with a
//! logged warning instead of failing the operation.

use std::fmt::Display;
use std::path::PathBuf;

use image::{imageops::FilterType, DynamicImage, GrayImage, RgbImage};
use ndarray::{Array, Array4, ArrayViewD};
use ort::execution_providers::{CoreML, ExecutionProvider, ExecutionProviderDispatch, CUDA};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;

use crate::error::{Error, Result};
use crate::mask::{self, BINARY_THRESHOLD};

use super::classical::NavierStokes;
use super::{InpaintBackend, InpaintParams};

/// Side length of the model's fixed square input.
const MODEL_SIDE: u32 = 512;
/// Hugging Face repository hosting the exported weights.
const MODEL_REPO: &str = "Carve/LaMa-ONNX";
/// Weight file within the repository.
const MODEL_FILE: &str = "lama_fp32.onnx";
/// Environment variable overriding the weight file location.
const MODEL_ENV: &str = "LAMA_MODEL";

/// Deep inpainting backend (method tag `lama`).
#[derive(Debug, Default)]
pub struct Lama;

impl InpaintBackend for Lama {
    fn fill(&self, image: &RgbImage, mask: &GrayImage, params: &InpaintParams) -> Result<RgbImage> {
        match self.try_fill(image, mask, params) {
            Ok(out) => Ok(out),
            Err(Error::DependencyUnavailable(reason)) => {
                log::warn!("deep-model backend unavailable ({reason}), falling back to Navier-Stokes fill");
                NavierStokes.fill(image, mask, params)
            }
            Err(e) => Err(e),
        }
    }
}

fn unavailable(context: &str, e: impl Display) -> Error {
    Error::DependencyUnavailable(format!("{context}: {e}"))
}

impl Lama {
    fn try_fill(
        &self,
        image: &RgbImage,
        mask: &GrayImage,
        params: &InpaintParams,
    ) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        let binary = mask::binarize(mask);

        let resized = DynamicImage::ImageRgb8(image.clone())
            .resize_exact(MODEL_SIDE, MODEL_SIDE, FilterType::CatmullRom)
            .to_rgb8();
        // Resampling introduces intermediate mask values; re-binarize.
        let resized_mask = mask::binarize(
            &DynamicImage::ImageLuma8(binary.clone())
                .resize_exact(MODEL_SIDE, MODEL_SIDE, FilterType::CatmullRom)
                .to_luma8(),
        );

        let (image_tensor, mask_tensor) = to_model_tensors(&resized, &resized_mask);
        let image_value = Value::from_array(image_tensor)
            .map_err(|e| unavailable("binding image tensor", e))?;
        let mask_value =
            Value::from_array(mask_tensor).map_err(|e| unavailable("binding mask tensor", e))?;

        let mut session = build_session(resolve_model(params)?)?;
        let outputs = session
            .run(ort::inputs!["image" => image_value, "mask" => mask_value])
            .map_err(|e| unavailable("model inference", e))?;
        let output = outputs["output"]
            .try_extract_array::<f32>()
            .map_err(|e| unavailable("extracting model output", e))?;

        let restored = DynamicImage::ImageRgb8(tensor_to_image(&output))
            .resize_exact(width, height, FilterType::CatmullRom)
            .to_rgb8();
        Ok(composite(image, &restored, &binary))
    }
}

/// Resolve the weight file: explicit parameter, then the `LAMA_MODEL`
/// environment variable, then a Hugging Face Hub fetch.
fn resolve_model(params: &InpaintParams) -> Result<PathBuf> {
    if let Some(path) = &params.model {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(Error::DependencyUnavailable(format!(
            "model file {} does not exist",
            path.display()
        )));
    }
    if let Ok(path) = std::env::var(MODEL_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        return Err(Error::DependencyUnavailable(format!(
            "{MODEL_ENV} points at missing file {}",
            path.display()
        )));
    }

    let api = hf_hub::api::sync::Api::new().map_err(|e| unavailable("hub access", e))?;
    api.model(MODEL_REPO.to_string())
        .get(MODEL_FILE)
        .map_err(|e| unavailable("fetching model weights", e))
}

/// Build an inference session with the preferred available device.
///
/// Weight-file problems (missing, corrupted) surface as
/// [`Error::DependencyUnavailable`] so the caller's fallback applies.
fn build_session(model_path: PathBuf) -> Result<Session> {
    let session = Session::builder()
        .map_err(|e| unavailable("session builder", e))?
        .with_execution_providers(execution_providers())
        .map_err(|e| unavailable("execution providers", e))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| unavailable("optimization level", e))?
        .with_intra_threads(
            std::thread::available_parallelism()
                .map(std::num::NonZero::get)
                .unwrap_or(4),
        )
        .map_err(|e| unavailable("thread config", e))?
        .commit_from_file(&model_path)
        .map_err(|e| unavailable("loading model weights", e))?;
    log::debug!("model loaded from {}", model_path.display());
    Ok(session)
}

/// Probe execution providers once, in fixed preference order
/// CUDA > CoreML > CPU, and keep the first available.
fn execution_providers() -> Vec<ExecutionProviderDispatch> {
    let cuda = CUDA::default();
    if cuda.is_available().unwrap_or(false) {
        log::info!("using CUDA execution provider");
        return vec![cuda.build()];
    }
    let coreml = CoreML::default();
    if coreml.is_available().unwrap_or(false) {
        log::info!("using CoreML execution provider");
        return vec![coreml.build()];
    }
    log::info!("no GPU acceleration available, using CPU");
    Vec::new()
}

/// Convert an RGB image and a binary mask into the model's NCHW
/// `f32` tensors, values scaled to `[0, 1]`.
fn to_model_tensors(image: &RgbImage, mask: &GrayImage) -> (Array4<f32>, Array4<f32>) {
    let (w, h) = (image.width() as usize, image.height() as usize);

    let mut image_data = Array::zeros((1, 3, h, w));
    for (x, y, px) in image.enumerate_pixels() {
        for c in 0..3 {
            image_data[[0, c, y as usize, x as usize]] = f32::from(px[c]) / 255.0;
        }
    }

    let mut mask_data = Array::zeros((1, 1, h, w));
    for (x, y, px) in mask.enumerate_pixels() {
        mask_data[[0, 0, y as usize, x as usize]] = if px[0] > BINARY_THRESHOLD {
            1.0f32
        } else {
            0.0f32
        };
    }

    (image_data, mask_data)
}

/// Convert the model's 1x3xHxW output back to an 8-bit RGB image.
fn tensor_to_image(output: &ArrayViewD<'_, f32>) -> RgbImage {
    let h = output.shape()[2];
    let w = output.shape()[3];
    #[allow(clippy::cast_possible_truncation)]
    let mut img = RgbImage::new(w as u32, h as u32);
    for (x, y, px) in img.enumerate_pixels_mut() {
        for c in 0..3 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                px[c] = (output[[0, c, y as usize, x as usize]].clamp(0.0, 1.0) * 255.0) as u8;
            }
        }
    }
    img
}

/// Take mask-covered pixels from the model output and everything else
/// from the original image.
fn composite(original: &RgbImage, restored: &RgbImage, mask: &GrayImage) -> RgbImage {
    let mut out = original.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        if mask.get_pixel(x, y)[0] > BINARY_THRESHOLD {
            *px = *restored.get_pixel(x, y);
        }
    }
    out
}
