//! Panorama canvas transformer
//!
//! Scales every image to a fixed height, keeping its aspect ratio, and
//! centers it on a wider canvas of uniform color. Output is always JPEG.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, Rgba, RgbaImage};

use crate::error::TransformError;
use crate::traits::{TransformInput, Transformer};

pub const DEFAULT_TARGET_HEIGHT: u32 = 2262;
pub const DEFAULT_CANVAS_WIDTH: u32 = 4524;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 2262;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Resize-and-extent transform producing panorama-shaped JPEGs
#[derive(Debug, Clone)]
pub struct PanoramaTransformer {
    target_height: u32,
    canvas_width: u32,
    canvas_height: u32,
    background: [u8; 3],
    quality: u8,
    filter: FilterType,
}

/// Unit-local engine: the blank canvas every output starts from
#[derive(Debug, Clone)]
pub struct PanoramaEngine {
    canvas: RgbaImage,
}

impl Default for PanoramaTransformer {
    fn default() -> Self {
        Self {
            target_height: DEFAULT_TARGET_HEIGHT,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            background: WHITE,
            quality: DEFAULT_JPEG_QUALITY,
            filter: FilterType::Lanczos3,
        }
    }
}

impl PanoramaTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_height(mut self, height: u32) -> Self {
        self.target_height = height;
        self
    }

    pub fn with_canvas(mut self, width: u32, height: u32) -> Self {
        self.canvas_width = width;
        self.canvas_height = height;
        self
    }

    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// Width after scaling `(width, height)` to the target height
    pub fn scaled_width(&self, width: u32, height: u32) -> u32 {
        let scaled = (width as f64 * self.target_height as f64 / height.max(1) as f64).round();
        (scaled as u32).max(1)
    }

    /// Decode, scale and center `input` on a copy of the engine's canvas
    fn compose(&self, engine: &PanoramaEngine, input: &TransformInput<'_>) -> Result<RgbImage> {
        let source = image::load_from_memory(input.content)
            .with_context(|| format!("failed to decode {}", input.name))?;

        let width = self.scaled_width(source.width(), source.height());
        let resized = source.resize_exact(width, self.target_height, self.filter).to_rgba8();

        // Negative offsets crop the overflow evenly on both sides
        let x = (self.canvas_width as i64 - width as i64) / 2;
        let y = (self.canvas_height as i64 - self.target_height as i64) / 2;
        let mut canvas = engine.canvas.clone();
        imageops::overlay(&mut canvas, &resized, x, y);

        Ok(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }

    fn encode(&self, image: &RgbImage) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        image
            .write_with_encoder(JpegEncoder::new_with_quality(&mut output, self.quality))
            .context("failed to encode JPEG")?;
        Ok(output)
    }
}

impl Transformer for PanoramaTransformer {
    type Engine = PanoramaEngine;

    fn initialize(&self) -> Result<PanoramaEngine, TransformError> {
        if self.canvas_width == 0 || self.canvas_height == 0 || self.target_height == 0 {
            return Err(TransformError::EngineInit {
                reason: format!(
                    "canvas {}x{} with target height {} has an empty dimension",
                    self.canvas_width, self.canvas_height, self.target_height
                ),
            });
        }
        if !(1..=100).contains(&self.quality) {
            return Err(TransformError::EngineInit {
                reason: format!("JPEG quality {} is outside 1..=100", self.quality),
            });
        }

        let [r, g, b] = self.background;
        Ok(PanoramaEngine {
            canvas: RgbaImage::from_pixel(self.canvas_width, self.canvas_height, Rgba([r, g, b, 255])),
        })
    }

    fn transform(&self, engine: &PanoramaEngine, input: &TransformInput<'_>) -> Result<Vec<u8>, TransformError> {
        let composed = self.compose(engine, input).map_err(|e| TransformError::Decode {
            name: input.name.to_string(),
            reason: format!("{e:#}"),
        })?;

        self.encode(&composed).map_err(|e| TransformError::Encode {
            name: input.name.to_string(),
            reason: format!("{e:#}"),
        })
    }
}
