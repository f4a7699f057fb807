use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{Result, StickerSegError};
use crate::traits::{RegionProposalStrategy, WholeMaskStrategy};
use crate::types::{Mask, RegionProposal};
use image::{DynamicImage, ImageBuffer, Luma};

/// Binary mask with a `rect_width` x `rect_height` block of foreground at `(x, y)`.
pub fn rect_mask(width: u32, height: u32, x: u32, y: u32, rect_width: u32, rect_height: u32) -> Mask {
    ImageBuffer::from_fn(width, height, |px, py| {
        let inside = (x..x + rect_width).contains(&px) && (y..y + rect_height).contains(&py);
        Luma([if inside { 1.0 } else { 0.0 }])
    })
}

/// Binary disk of `radius` centered at `(cx, cy)`.
pub fn disk_mask(width: u32, height: u32, cx: u32, cy: u32, radius: u32) -> Mask {
    let r2 = i64::from(radius).pow(2);
    ImageBuffer::from_fn(width, height, |x, y| {
        let dx = i64::from(x) - i64::from(cx);
        let dy = i64::from(y) - i64::from(cy);
        Luma([if dx * dx + dy * dy <= r2 { 1.0 } else { 0.0 }])
    })
}

/// Region-proposal engine that always returns the same proposals.
#[derive(Debug, Clone, Default)]
pub struct StaticProposals {
    pub proposals: Vec<RegionProposal>,
    calls: std::sync::Arc<AtomicUsize>,
}

impl StaticProposals {
    pub fn new(proposals: Vec<RegionProposal>) -> Self {
        Self {
            proposals,
            calls: Default::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RegionProposalStrategy for StaticProposals {
    fn propose(&self, _image: &DynamicImage) -> Result<Vec<RegionProposal>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.proposals.clone())
    }
}

/// Whole-mask engine that always returns the same mask.
#[derive(Debug, Clone)]
pub struct StaticMask {
    pub mask: Mask,
}

impl StaticMask {
    pub const fn new(mask: Mask) -> Self {
        Self { mask }
    }
}

impl WholeMaskStrategy for StaticMask {
    fn segment(&self, _image: &DynamicImage) -> Result<Mask> {
        Ok(self.mask.clone())
    }
}

/// Engine whose every run fails, standing in for a model that cannot execute.
#[derive(Debug, Clone)]
pub struct FailingStrategy {
    pub reason: &'static str,
}

impl FailingStrategy {
    pub const fn new(reason: &'static str) -> Self {
        Self { reason }
    }

    fn error(&self) -> StickerSegError {
        StickerSegError::Model {
            operation: "mock inference".to_string(),
            source: self.reason.into(),
        }
    }
}

impl RegionProposalStrategy for FailingStrategy {
    fn propose(&self, _image: &DynamicImage) -> Result<Vec<RegionProposal>> {
        Err(self.error())
    }
}

impl WholeMaskStrategy for FailingStrategy {
    fn segment(&self, _image: &DynamicImage) -> Result<Mask> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_rect_mask_bounds() {
        let mask = rect_mask(6, 4, 1, 1, 2, 3);
        let on: Vec<(u32, u32)> = mask
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == 1.0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(on, vec![(1, 1), (2, 1), (1, 2), (2, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_static_proposals_counts_calls() -> Result<()> {
        let mock = StaticProposals::new(vec![RegionProposal::from_mask(rect_mask(4, 4, 0, 0, 2, 2), 0.9)]);
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));

        assert_eq!(mock.propose(&image)?.len(), 1);
        assert_eq!(mock.calls(), 1);
        Ok(())
    }

    #[test]
    fn test_failing_strategy_fails_both_capabilities() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let mock = FailingStrategy::new("offline");
        assert!(mock.propose(&image).is_err());
        assert!(mock.segment(&image).is_err());
    }
}
