use crate::errors::Result;
use crate::types::{Mask, RegionProposal};
use image::DynamicImage;

/// Primary segmentation capability: proposes candidate subject regions.
///
/// Implementations may return an empty list; an `Err` means the engine
/// could not run at all and causes the pipeline to drop its cached handle.
pub trait RegionProposalStrategy: Send + Sync {
    fn propose(&self, image: &DynamicImage) -> Result<Vec<RegionProposal>>;
}

/// Secondary segmentation capability: predicts one whole-image alpha mask.
///
/// The returned mask must have the same width and height as `image`.
pub trait WholeMaskStrategy: Send + Sync {
    fn segment(&self, image: &DynamicImage) -> Result<Mask>;
}
