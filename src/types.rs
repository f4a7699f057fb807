use std::fmt;

use image::{DynamicImage, GenericImageView, Luma};
use imageproc::definitions::Image;

use crate::imageops_ai::mask::foreground_area;

/// Single-channel float mask, `1.0` = subject and `0.0` = background.
///
/// Width and height always match the image the mask was produced for.
pub type Mask = Image<Luma<f32>>;

/// One candidate region returned by the primary strategy.
#[derive(Debug, Clone)]
pub struct RegionProposal {
    pub mask: Mask,
    pub stability_score: f32,
    pub area_px: u64,
}

impl RegionProposal {
    pub const fn new(mask: Mask, stability_score: f32, area_px: u64) -> Self {
        Self {
            mask,
            stability_score,
            area_px,
        }
    }

    /// Builds a proposal whose `area_px` is counted from the mask itself.
    pub fn from_mask(mask: Mask, stability_score: f32) -> Self {
        let area_px = foreground_area(&mask);
        Self::new(mask, stability_score, area_px)
    }
}

/// Which tier of the fallback sequence produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyUsed {
    PrimaryRegionProposal,
    SecondaryWholeMask,
    GeometricFallback,
}

impl fmt::Display for StrategyUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PrimaryRegionProposal => "primary-region-proposal",
            Self::SecondaryWholeMask => "secondary-whole-mask",
            Self::GeometricFallback => "geometric-fallback",
        };
        f.write_str(name)
    }
}

/// Output of one pipeline invocation. Read-only once built.
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    alpha_image: DynamicImage,
    mask: Mask,
    strategy_used: StrategyUsed,
}

impl SegmentationResult {
    pub(crate) const fn new(alpha_image: DynamicImage, mask: Mask, strategy_used: StrategyUsed) -> Self {
        Self {
            alpha_image,
            mask,
            strategy_used,
        }
    }

    /// The 4-channel cutout.
    pub const fn alpha_image(&self) -> &DynamicImage {
        &self.alpha_image
    }

    pub const fn mask(&self) -> &Mask {
        &self.mask
    }

    pub const fn strategy_used(&self) -> StrategyUsed {
        self.strategy_used
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.alpha_image.dimensions()
    }

    pub fn into_parts(self) -> (DynamicImage, Mask, StrategyUsed) {
        (self.alpha_image, self.mask, self.strategy_used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    #[test]
    fn test_from_mask_counts_foreground() {
        let mask: Mask = ImageBuffer::from_fn(10, 10, |x, _| Luma([if x < 3 { 1.0 } else { 0.0 }]));
        let proposal = RegionProposal::from_mask(mask, 0.9);
        assert_eq!(proposal.area_px, 30);
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(
            StrategyUsed::GeometricFallback.to_string(),
            "geometric-fallback"
        );
    }
}
