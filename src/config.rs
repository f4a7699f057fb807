use clap::{ArgAction, Parser};
use image::ImageFormat;
use std::path::PathBuf;

use crate::errors::{Result, StickerSegError};
use crate::postprocess::PostProcessConfig;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_PADDING: u32 = 10;

/// Per-invocation pipeline settings. Nothing here is persisted between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Proposals need a stability score strictly above this value.
    pub confidence_threshold: f32,
    /// Run the post-processor on the chosen mask.
    pub edge_smoothing: bool,
    /// Border added around the mask while feathering.
    pub padding: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            edge_smoothing: true,
            padding: DEFAULT_PADDING,
        }
    }
}

impl PipelineConfig {
    pub fn new(confidence_threshold: f32, edge_smoothing: bool, padding: u32) -> Result<Self> {
        let config = Self {
            confidence_threshold,
            edge_smoothing,
            padding,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(StickerSegError::Validation {
                field: "confidence_threshold".to_string(),
                reason: format!("must be within [0, 1], got {}", self.confidence_threshold),
            });
        }
        Ok(())
    }

    pub fn post_process_config(&self) -> PostProcessConfig {
        PostProcessConfig::default().with_padding(self.padding)
    }
}

#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    pub input_dir: PathBuf,

    #[arg(default_value = "output")]
    pub output_dir: PathBuf,

    /// ONNX whole-image matting model used as the secondary strategy
    #[arg(short, long)]
    pub model_path: Option<PathBuf>,

    #[arg(short, long, default_value = "png", value_parser = check_format)]
    pub format: String,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,

    #[arg(short, long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD, value_parser = check_threshold)]
    pub confidence_threshold: f32,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub edge_smoothing: bool,

    #[arg(short, long, default_value_t = DEFAULT_PADDING)]
    pub padding: u32,

    /// Boost contrast and saturation of the finished cutout
    #[arg(long)]
    pub enhance: bool,

    /// Downscale inputs so the longest side fits; 0 keeps the original size
    #[arg(long, default_value_t = 1024)]
    pub max_size: u32,

    #[arg(short, long)]
    pub num_threads: Option<usize>,

    #[arg(long)]
    pub debug: bool,
}

impl Config {
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        PipelineConfig::new(self.confidence_threshold, self.edge_smoothing, self.padding)
    }
}

fn check_threshold(s: &str) -> std::result::Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{s} is not a number: {e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside [0, 1]"))
    }
}

fn check_format(s: &str) -> std::result::Result<String, String> {
    let supported: Vec<_> = ImageFormat::all()
        .filter(|f| f.writing_enabled() && *f != ImageFormat::Jpeg)
        .flat_map(|f| f.extensions_str())
        .map(|s| format!("`{}`", s))
        .collect();
    let supported_message = format!("Supported formats: {}", supported.join(", "));

    let format = ImageFormat::from_extension(s)
        .ok_or(format!("{} is not supported. {}", s, supported_message))?;
    if !format.writing_enabled() {
        return Err(format!("{} is not supported. {}", s, supported_message));
    }
    if format == ImageFormat::Jpeg {
        return Err(format!("{} cannot store an alpha channel. {}", s, supported_message));
    }

    Ok(s.to_string())
}
