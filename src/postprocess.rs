use image::Luma;

use crate::errors::{Result, StickerSegError};
use crate::imageops_ai::{
    blur::gaussian_blur,
    mask::{all_finite, clamp_unit},
    morphology,
    padding::{crop_uniform, pad_uniform},
};
use crate::types::Mask;

pub const DEFAULT_BLUR_RADIUS: u32 = 2;

/// Steps applied by [`MaskPostProcessor`]. Each one can be switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcessConfig {
    /// Close then open with a 3x3 element.
    pub morphology: bool,
    /// Zero border added before blurring and cropped off afterwards.
    pub padding: u32,
    /// Gaussian kernel is `2 * blur_radius + 1` wide; `0` skips the blur.
    pub blur_radius: u32,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            morphology: true,
            padding: 0,
            blur_radius: DEFAULT_BLUR_RADIUS,
        }
    }
}

impl PostProcessConfig {
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }
}

/// Turns a coarse or binary mask into a feathered alpha channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskPostProcessor {
    config: PostProcessConfig,
}

impl MaskPostProcessor {
    pub const fn new(config: PostProcessConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &PostProcessConfig {
        &self.config
    }

    /// Best-effort variant of [`Self::try_process`]: on any failure the input
    /// mask is returned unchanged.
    pub fn process(&self, mask: &Mask) -> Mask {
        match self.try_process(mask) {
            Ok(processed) => processed,
            Err(err) => {
                tracing::warn!(error = %err, "mask post-processing skipped");
                mask.clone()
            }
        }
    }

    pub fn try_process(&self, mask: &Mask) -> Result<Mask> {
        let (width, height) = mask.dimensions();
        if width == 0 || height == 0 {
            return Err(StickerSegError::PostProcessing {
                step: "validate",
                reason: format!("mask has no pixels ({width}x{height})"),
            });
        }
        if !all_finite(mask) {
            return Err(StickerSegError::PostProcessing {
                step: "validate",
                reason: "mask contains non-finite values".to_string(),
            });
        }

        let mut current = clamp_unit(mask);

        if self.config.morphology {
            current = morphology::open(&morphology::close(&current));
        }

        // Zero border beyond the blur's reach never touches the cropped interior.
        let padding = self.config.padding.min(self.config.blur_radius);
        if padding > 0 {
            current = pad_uniform(&current, padding, Luma([0.0])).ok_or(
                StickerSegError::PostProcessing {
                    step: "pad",
                    reason: format!("padding {padding} overflows {width}x{height}"),
                },
            )?;
        }

        current = gaussian_blur(&current, self.config.blur_radius);

        if padding > 0 {
            current = crop_uniform(&current, padding).ok_or(StickerSegError::PostProcessing {
                step: "crop",
                reason: format!("padding {padding} does not fit {width}x{height}"),
            })?;
        }

        let output = clamp_unit(&current);
        debug_assert_eq!(output.dimensions(), (width, height));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{disk_mask, rect_mask};
    use image::ImageBuffer;

    fn max_abs_diff(a: &Mask, b: &Mask) -> f32 {
        a.pixels()
            .zip(b.pixels())
            .map(|(p, q)| (p[0] - q[0]).abs())
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_padding_round_trip_keeps_dimensions() {
        let processor = MaskPostProcessor::new(PostProcessConfig::default().with_padding(10));
        let mask = rect_mask(37, 23, 5, 5, 20, 10);

        let output = processor.process(&mask);
        assert_eq!(output.dimensions(), (37, 23));
    }

    #[test]
    fn test_output_is_within_unit_range_and_feathered() {
        let processor = MaskPostProcessor::new(PostProcessConfig::default().with_padding(10));
        let mask = disk_mask(64, 64, 32, 32, 20);

        let output = processor.process(&mask);
        assert!(output.pixels().all(|p| (0.0..=1.0).contains(&p[0])));
        assert!((output.get_pixel(32, 32)[0] - 1.0).abs() < 1e-5);
        assert!(output.get_pixel(0, 0)[0] < 1e-6);
        assert!(output.pixels().any(|p| p[0] > 0.05 && p[0] < 0.95));
    }

    #[test]
    fn test_hole_and_speck_are_cleaned_before_blur() {
        let config = PostProcessConfig {
            morphology: true,
            padding: 0,
            blur_radius: 0,
        };
        let mut mask = rect_mask(32, 32, 8, 8, 16, 16);
        mask.put_pixel(15, 15, Luma([0.0]));
        mask.put_pixel(2, 2, Luma([1.0]));

        let output = MaskPostProcessor::new(config).process(&mask);
        assert_eq!(output, rect_mask(32, 32, 8, 8, 16, 16));
    }

    #[test]
    fn test_padding_keeps_edges_from_clipping() {
        let mask = rect_mask(20, 20, 0, 0, 10, 20);
        let padded = MaskPostProcessor::new(PostProcessConfig::default().with_padding(10));
        let unpadded = MaskPostProcessor::new(PostProcessConfig::default());

        let with_border = padded.process(&mask);
        let without_border = unpadded.process(&mask);

        // Zero fill outside the frame pulls the edge of the subject down.
        assert!(with_border.get_pixel(0, 10)[0] < without_border.get_pixel(0, 10)[0]);
        assert!((without_border.get_pixel(0, 10)[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_huge_padding_matches_border_of_blur_radius() -> Result<()> {
        let mask = rect_mask(8, 8, 2, 2, 4, 4);
        let reference =
            MaskPostProcessor::new(PostProcessConfig::default().with_padding(DEFAULT_BLUR_RADIUS))
                .try_process(&mask)?;

        for padding in [10, 3_000_000_000, u32::MAX] {
            let processor = MaskPostProcessor::new(PostProcessConfig::default().with_padding(padding));
            assert_eq!(processor.try_process(&mask)?, reference, "padding {padding}");
        }
        Ok(())
    }

    #[test]
    fn test_reprocessing_smooth_mask_is_nearly_idempotent() {
        // Cone with a shallow slope that reaches zero well inside the frame.
        let mask: Mask = ImageBuffer::from_fn(128, 128, |x, y| {
            let d = (x as f32 - 64.0).hypot(y as f32 - 64.0);
            Luma([(1.0 - d / 48.0).clamp(0.0, 1.0)])
        });
        let processor = MaskPostProcessor::new(PostProcessConfig::default().with_padding(10));

        let once = processor.process(&mask);
        let twice = processor.process(&once);

        assert_eq!(twice.dimensions(), once.dimensions());
        assert!(max_abs_diff(&once, &twice) < 0.05);
    }

    #[test]
    fn test_failure_returns_input_unchanged() {
        let mut mask = rect_mask(8, 8, 2, 2, 4, 4);
        mask.put_pixel(0, 0, Luma([f32::NAN]));
        let processor = MaskPostProcessor::default();

        assert!(processor.try_process(&mask).is_err());
        let output = processor.process(&mask);
        assert!(output.get_pixel(0, 0)[0].is_nan());
        assert_eq!(output.get_pixel(3, 3)[0], 1.0);
    }

    #[test]
    fn test_empty_mask_degrades() {
        let mask: Mask = ImageBuffer::new(0, 0);
        let processor = MaskPostProcessor::default();
        assert!(matches!(
            processor.try_process(&mask),
            Err(StickerSegError::PostProcessing { step: "validate", .. })
        ));
        assert_eq!(processor.process(&mask).dimensions(), (0, 0));
    }
}
