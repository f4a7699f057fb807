use image::{DynamicImage, GenericImageView};

use crate::errors::{Result, StickerSegError};
use crate::imageops_ai::AlphaMaskApplicable;
use crate::types::Mask;

/// Merges a float mask into an image as its alpha channel.
///
/// RGB images gain a fourth channel; RGBA images keep their color and only
/// have alpha replaced. Sample depth is preserved: 8 and 16-bit images get
/// `round(mask * max)`, float images get the mask value itself. Grayscale
/// inputs are promoted to 8-bit RGBA.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaCompositor;

impl AlphaCompositor {
    pub const fn new() -> Self {
        Self
    }

    pub fn composite(&self, image: &DynamicImage, mask: &Mask) -> Result<DynamicImage> {
        StickerSegError::check_dimensions(image.dimensions(), mask.dimensions())?;

        let composited = match image {
            DynamicImage::ImageRgb8(rgb) => DynamicImage::ImageRgba8(rgb.apply_alpha_mask(mask)?),
            DynamicImage::ImageRgba8(rgba) => DynamicImage::ImageRgba8(rgba.apply_alpha_mask(mask)?),
            DynamicImage::ImageRgb16(rgb) => DynamicImage::ImageRgba16(rgb.apply_alpha_mask(mask)?),
            DynamicImage::ImageRgba16(rgba) => {
                DynamicImage::ImageRgba16(rgba.apply_alpha_mask(mask)?)
            }
            DynamicImage::ImageRgb32F(rgb) => {
                DynamicImage::ImageRgba32F(rgb.apply_alpha_mask(mask)?)
            }
            DynamicImage::ImageRgba32F(rgba) => {
                DynamicImage::ImageRgba32F(rgba.apply_alpha_mask(mask)?)
            }
            other => DynamicImage::ImageRgba8(other.to_rgba8().apply_alpha_mask(mask)?),
        };
        Ok(composited)
    }
}
