use image::{ImageBuffer, Pixel, Primitive, Rgb, Rgba};
use imageproc::definitions::Image;
use num_traits::AsPrimitive;

use crate::errors::{Result, StickerSegError};
use crate::imageops_ai::mask_to_channel;
use crate::types::Mask;

/// Writes a float mask into the alpha channel of an image.
///
/// RGB samples are copied unchanged (no premultiplication). The mask must
/// have exactly the image's width and height.
pub trait AlphaMaskApplicable<S>
where
    Rgba<S>: Pixel<Subpixel = S>,
    S: Primitive + AsPrimitive<f32> + 'static,
    f32: AsPrimitive<S>,
{
    fn apply_alpha_mask(&self, mask: &Mask) -> Result<Image<Rgba<S>>>;
}

impl<S> AlphaMaskApplicable<S> for ImageBuffer<Rgb<S>, Vec<S>>
where
    Rgb<S>: Pixel<Subpixel = S>,
    Rgba<S>: Pixel<Subpixel = S>,
    S: Primitive + AsPrimitive<f32> + 'static,
    f32: AsPrimitive<S>,
{
    fn apply_alpha_mask(&self, mask: &Mask) -> Result<Image<Rgba<S>>> {
        StickerSegError::check_dimensions(self.dimensions(), mask.dimensions())?;

        Ok(ImageBuffer::from_fn(self.width(), self.height(), |x, y| {
            let Rgb([red, green, blue]) = *self.get_pixel(x, y);
            let alpha = mask_to_channel(mask.get_pixel(x, y)[0]);
            Rgba([red, green, blue, alpha])
        }))
    }
}

impl<S> AlphaMaskApplicable<S> for ImageBuffer<Rgba<S>, Vec<S>>
where
    Rgba<S>: Pixel<Subpixel = S>,
    S: Primitive + AsPrimitive<f32> + 'static,
    f32: AsPrimitive<S>,
{
    fn apply_alpha_mask(&self, mask: &Mask) -> Result<Image<Rgba<S>>> {
        StickerSegError::check_dimensions(self.dimensions(), mask.dimensions())?;

        let mut output = self.clone();
        for (pixel, alpha) in output.pixels_mut().zip(mask.pixels()) {
            pixel[3] = mask_to_channel(alpha[0]);
        }
        Ok(output)
    }
}
