use std::path::PathBuf;
use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Structured error types for the sticker segmentation pipeline.
///
/// Only [`StickerSegError::MalformedInput`] ever escapes
/// [`SegmentationPipeline::run`](crate::SegmentationPipeline::run). The strategy
/// variants are produced inside a tier, logged, and turned into a fall-through
/// to the next tier.
#[derive(Error, Debug)]
pub enum StickerSegError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: BoxedError,
    },

    #[error("Model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: BoxedError,
    },

    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },

    #[error("Strategy unavailable: {strategy} ({reason})")]
    StrategyUnavailable { strategy: String, reason: String },

    #[error("No eligible candidate: no proposal cleared confidence threshold {threshold} with a non-empty mask")]
    NoEligibleCandidate { threshold: f32 },

    #[error(
        "Malformed input: mask is {mask_width}x{mask_height} but image is {image_width}x{image_height}"
    )]
    MalformedInput {
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    #[error("Post-processing degraded: {step} failed ({reason})")]
    PostProcessing { step: &'static str, reason: String },
}

impl StickerSegError {
    pub(crate) fn unavailable(strategy: &str, reason: impl ToString) -> Self {
        Self::StrategyUnavailable {
            strategy: strategy.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Builds a [`StickerSegError::MalformedInput`] when the two sizes differ.
    pub fn check_dimensions(image: (u32, u32), mask: (u32, u32)) -> Result<()> {
        if image == mask {
            return Ok(());
        }
        Err(Self::MalformedInput {
            image_width: image.0,
            image_height: image.1,
            mask_width: mask.0,
            mask_height: mask.1,
        })
    }
}

pub type Result<T> = std::result::Result<T, StickerSegError>;

/// Convert I/O errors to filesystem errors.
///
/// Code that knows the path and operation should construct
/// `StickerSegError::FileSystem` directly instead.
impl From<std::io::Error> for StickerSegError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

impl From<image::ImageError> for StickerSegError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

impl From<ort::Error> for StickerSegError {
    fn from(err: ort::Error) -> Self {
        Self::Model {
            operation: "ort operation".to_string(),
            source: Box::new(err),
        }
    }
}

/// Shape errors only show up while moving tensors in and out of the model,
/// so they are reported as model errors.
impl From<ndarray::ShapeError> for StickerSegError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Model {
            operation: "tensor shape conversion".to_string(),
            source: Box::new(err),
        }
    }
}
