//! Tiered background removal.
//!
//! Each call walks a fixed sequence of tiers and stops at the first one that
//! yields a mask:
//!
//! 1. region proposals from the primary engine, filtered by confidence and
//!    ranked by [`MaskCandidateSelector`];
//! 2. a whole-image mask from the secondary engine;
//! 3. a deterministic centered disk, which cannot fail.
//!
//! Errors inside a tier are logged and turn into a fall-through. The only
//! error a caller can see is a mask/image size mismatch from compositing.

use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageBuffer, Luma};

use crate::compositor::AlphaCompositor;
use crate::config::PipelineConfig;
use crate::engine::StrategyHandle;
use crate::errors::{Result, StickerSegError};
use crate::imageops_ai::mask::{all_finite, binarize, clamp_unit};
use crate::postprocess::MaskPostProcessor;
use crate::selector::MaskCandidateSelector;
use crate::traits::{RegionProposalStrategy, WholeMaskStrategy};
use crate::types::{Mask, SegmentationResult, StrategyUsed};

/// Secondary masks are binarized strictly above this level (128 of 255).
pub const SECONDARY_ALPHA_THRESHOLD: f32 = 128.0 / 255.0;

/// Centered disk of radius `min(width, height) / 3`, using integer division
/// for the center and radius.
pub fn geometric_mask(width: u32, height: u32) -> Mask {
    let center_x = i64::from(width / 2);
    let center_y = i64::from(height / 2);
    let radius = i64::from(width.min(height) / 3);
    let radius_sq = radius * radius;

    ImageBuffer::from_fn(width, height, |x, y| {
        let dx = i64::from(x) - center_x;
        let dy = i64::from(y) - center_y;
        Luma([if dx * dx + dy * dy <= radius_sq { 1.0 } else { 0.0 }])
    })
}

#[derive(Default)]
pub struct SegmentationPipeline {
    primary: Option<StrategyHandle<dyn RegionProposalStrategy>>,
    secondary: Option<StrategyHandle<dyn WholeMaskStrategy>>,
    compositor: AlphaCompositor,
}

impl SegmentationPipeline {
    /// Pipeline with no engines; every call ends in the geometric fallback.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary(mut self, handle: StrategyHandle<dyn RegionProposalStrategy>) -> Self {
        self.primary = Some(handle);
        self
    }

    pub fn with_secondary(mut self, handle: StrategyHandle<dyn WholeMaskStrategy>) -> Self {
        self.secondary = Some(handle);
        self
    }

    pub fn with_primary_engine(self, engine: Arc<dyn RegionProposalStrategy>) -> Self {
        self.with_primary(StrategyHandle::ready("primary region proposal", engine))
    }

    pub fn with_secondary_engine(self, engine: Arc<dyn WholeMaskStrategy>) -> Self {
        self.with_secondary(StrategyHandle::ready("secondary whole mask", engine))
    }

    pub fn primary(&self) -> Option<&StrategyHandle<dyn RegionProposalStrategy>> {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> Option<&StrategyHandle<dyn WholeMaskStrategy>> {
        self.secondary.as_ref()
    }

    pub fn run(&self, image: &DynamicImage, config: &PipelineConfig) -> Result<SegmentationResult> {
        let (width, height) = image.dimensions();

        let (raw_mask, strategy_used) = match self.try_primary(image, config) {
            Ok(mask) => (mask, StrategyUsed::PrimaryRegionProposal),
            Err(err) => {
                tracing::warn!(error = %err, "primary tier failed, trying secondary");
                match self.try_secondary(image) {
                    Ok(mask) => (mask, StrategyUsed::SecondaryWholeMask),
                    Err(err) => {
                        tracing::warn!(error = %err, "secondary tier failed, using geometric fallback");
                        (geometric_mask(width, height), StrategyUsed::GeometricFallback)
                    }
                }
            }
        };

        let mask = if config.edge_smoothing {
            MaskPostProcessor::new(config.post_process_config()).process(&raw_mask)
        } else {
            raw_mask
        };

        let alpha_image = self.compositor.composite(image, &mask)?;
        tracing::info!(strategy = %strategy_used, width, height, "segmentation complete");
        Ok(SegmentationResult::new(alpha_image, mask, strategy_used))
    }

    fn try_primary(&self, image: &DynamicImage, config: &PipelineConfig) -> Result<Mask> {
        let handle = self
            .primary
            .as_ref()
            .ok_or_else(|| StickerSegError::unavailable("primary region proposal", "no engine configured"))?;
        let engine = handle.acquire()?;

        let mut proposals = engine.propose(image).map_err(|err| {
            handle.invalidate(&engine);
            StickerSegError::unavailable(handle.name(), err)
        })?;

        let dimensions = image.dimensions();
        for proposal in &proposals {
            StickerSegError::check_dimensions(dimensions, proposal.mask.dimensions())?;
        }

        let total = proposals.len();
        let selector = MaskCandidateSelector::new(config.confidence_threshold);
        proposals.retain(|p| selector.is_eligible(p) && all_finite(&p.mask));
        tracing::debug!(total, eligible = proposals.len(), "filtered region proposals");

        let no_candidate = || StickerSegError::NoEligibleCandidate {
            threshold: config.confidence_threshold,
        };
        let selection = selector
            .select(&proposals, dimensions.0, dimensions.1)
            .ok_or_else(no_candidate)?;
        tracing::info!(
            index = selection.index,
            score = selection.score.combined,
            "selected region proposal"
        );

        Ok(clamp_unit(&proposals.swap_remove(selection.index).mask))
    }

    fn try_secondary(&self, image: &DynamicImage) -> Result<Mask> {
        let handle = self
            .secondary
            .as_ref()
            .ok_or_else(|| StickerSegError::unavailable("secondary whole mask", "no engine configured"))?;
        let engine = handle.acquire()?;

        let mask = engine.segment(image).map_err(|err| {
            handle.invalidate(&engine);
            StickerSegError::unavailable(handle.name(), err)
        })?;

        StickerSegError::check_dimensions(image.dimensions(), mask.dimensions())?;
        if !all_finite(&mask) {
            return Err(StickerSegError::unavailable(
                handle.name(),
                "mask contains non-finite values",
            ));
        }

        Ok(binarize(&mask, SECONDARY_ALPHA_THRESHOLD))
    }
}
