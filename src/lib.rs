pub mod compositor;
pub mod config;
pub mod engine;
pub mod errors;
pub mod imageops_ai;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod selector;
pub mod traits;
pub mod types;

pub mod mocks;

use image::{DynamicImage, ImageFormat};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use compositor::AlphaCompositor;
pub use config::{Config, PipelineConfig};
pub use engine::StrategyHandle;
pub use errors::{Result, StickerSegError};
pub use model::Model;
pub use pipeline::{geometric_mask, SegmentationPipeline};
pub use postprocess::{MaskPostProcessor, PostProcessConfig};
pub use selector::{CandidateScore, MaskCandidateSelector, Selection};
pub use traits::*;
pub use types::{Mask, RegionProposal, SegmentationResult, StrategyUsed};

use imageops_ai::enhance::{enhance_sticker_for_ar, resize_for_ar};

/// Runs a [`SegmentationPipeline`] over every image below `config.input_dir`
/// and writes RGBA cutouts under `config.output_dir`, mirroring the layout.
pub struct ImageProcessor {
    pipeline: SegmentationPipeline,
    pipeline_config: PipelineConfig,
    config: Config,
}

impl ImageProcessor {
    pub fn new(pipeline: SegmentationPipeline, config: Config) -> Result<Self> {
        let pipeline_config = config.pipeline_config()?;
        Ok(Self {
            pipeline,
            pipeline_config,
            config,
        })
    }

    /// Builds the pipeline from the CLI configuration: the ONNX matting model,
    /// when given, is the lazily-loaded secondary strategy.
    pub fn from_config(config: Config) -> Result<Self> {
        let mut pipeline = SegmentationPipeline::new();
        if let Some(model_path) = &config.model_path {
            pipeline = pipeline.with_secondary(Model::lazy_handle(model_path, config.device_id));
        }
        Self::new(pipeline, config)
    }

    pub const fn pipeline(&self) -> &SegmentationPipeline {
        &self.pipeline
    }

    pub fn process_directory(&self) -> Result<Vec<(PathBuf, StrategyUsed)>> {
        let input_path = &self.config.input_dir;
        let output_path = &self.config.output_dir;

        if !input_path.exists() {
            return Err(StickerSegError::FileSystem {
                path: input_path.clone(),
                operation: "check input directory".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "input directory does not exist",
                ),
            });
        }

        fs::create_dir_all(output_path).map_err(|e| StickerSegError::FileSystem {
            path: output_path.clone(),
            operation: "create output directory".to_string(),
            source: e,
        })?;

        let image_files = self.collect_image_files(input_path);
        if image_files.is_empty() {
            tracing::warn!(path = %input_path.display(), "no images to process");
            return Ok(Vec::new());
        }

        let pb = ProgressBar::new(image_files.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .map_err(|e| StickerSegError::Configuration {
                message: e.to_string(),
            })?
            .progress_chars("#>-"),
        );

        let outcomes = image_files
            .par_iter()
            .progress_with(pb.clone())
            .map(|input_file| {
                self.process_single_image(input_file, output_path)
                    .map(|strategy| (input_file.clone(), strategy))
            })
            .collect::<Result<Vec<_>>>()?;

        pb.finish_with_message("done");
        tracing::info!(count = outcomes.len(), "all images processed");
        Ok(outcomes)
    }

    fn collect_image_files(&self, input_path: &Path) -> Vec<PathBuf> {
        WalkDir::new(input_path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_supported_image_format(e.path()))
            .map(|e| e.into_path())
            .collect()
    }

    pub fn is_supported_image_format(&self, path: &Path) -> bool {
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            matches!(
                extension.to_lowercase().as_str(),
                "jpg" | "jpeg" | "png" | "webp" | "bmp" | "gif" | "tiff" | "avif"
            )
        } else {
            false
        }
    }

    pub fn process_single_image(&self, input_file: &Path, output_dir: &Path) -> Result<StrategyUsed> {
        let img = image::open(input_file).map_err(|e| StickerSegError::ImageProcessing {
            path: input_file.display().to_string(),
            operation: "read image".to_string(),
            source: Box::new(e),
        })?;
        let img = resize_for_ar(&img, self.config.max_size);

        let result = self
            .pipeline
            .run(&img, &self.pipeline_config)
            .map_err(|e| StickerSegError::ImageProcessing {
                path: input_file.display().to_string(),
                operation: "segment image".to_string(),
                source: Box::new(e),
            })?;
        let strategy = result.strategy_used();
        tracing::debug!(path = %input_file.display(), %strategy, "image segmented");

        let mut cutout = result.alpha_image().to_rgba8();
        if self.config.enhance {
            cutout = enhance_sticker_for_ar(&cutout, true, true);
        }

        let relative_path = self.get_relative_path(input_file)?;
        let output_file = output_dir
            .join(relative_path)
            .with_extension(&self.config.format);

        if let Some(parent) = output_file.parent() {
            fs::create_dir_all(parent).map_err(|e| StickerSegError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create output directory".to_string(),
                source: e,
            })?;
        }

        let output_format =
            ImageFormat::from_extension(&self.config.format).unwrap_or(ImageFormat::Png);
        DynamicImage::ImageRgba8(cutout)
            .save_with_format(&output_file, output_format)
            .map_err(|e| StickerSegError::ImageProcessing {
                path: output_file.display().to_string(),
                operation: "save image".to_string(),
                source: Box::new(e),
            })?;

        Ok(strategy)
    }

    pub fn get_relative_path(&self, input_file: &Path) -> Result<PathBuf> {
        let input_dir = &self.config.input_dir;
        input_file
            .strip_prefix(input_dir)
            .map(|p| p.to_path_buf())
            .map_err(|_| StickerSegError::FileSystem {
                path: input_file.to_path_buf(),
                operation: "resolve relative path".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "input file is outside the input directory",
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::ffi::OsStr;

    fn config_for(input_dir: &Path, output_dir: &Path) -> Config {
        Config::parse_from([
            OsStr::new("sticker-seg"),
            input_dir.as_os_str(),
            output_dir.as_os_str(),
            OsStr::new("--max-size"),
            OsStr::new("0"),
        ])
    }

    #[test]
    fn test_supported_formats() -> Result<()> {
        let processor = ImageProcessor::new(
            SegmentationPipeline::new(),
            config_for(Path::new("in"), Path::new("out")),
        )?;

        let test_cases = vec![
            ("test.jpg", true),
            ("test.jpeg", true),
            ("test.PNG", true),
            ("test.webp", true),
            ("test.txt", false),
            ("test", false),
        ];
        for (filename, expected) in test_cases {
            assert_eq!(processor.is_supported_image_format(Path::new(filename)), expected);
        }
        Ok(())
    }

    #[test]
    fn test_relative_path_calculation() -> Result<()> {
        use tempfile::TempDir;

        let temp_dir = TempDir::new()?;
        let input_dir = temp_dir.path().join("input");
        let subdir = input_dir.join("subdir");
        fs::create_dir_all(&subdir)?;

        let processor = ImageProcessor::new(
            SegmentationPipeline::new(),
            config_for(&input_dir, Path::new("output")),
        )?;

        let relative = processor.get_relative_path(&subdir.join("test.jpg"))?;
        assert_eq!(relative, Path::new("subdir/test.jpg"));
        assert!(processor.get_relative_path(Path::new("/elsewhere/a.png")).is_err());
        Ok(())
    }
}
