//! Cosmetic adjustments applied to finished sticker cutouts.

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgba, RgbaImage};

pub const CONTRAST_FACTOR: f32 = 1.2;
pub const SATURATION_FACTOR: f32 = 1.1;

fn luma(Rgba([r, g, b, _]): Rgba<u8>) -> f32 {
    (f32::from(r) * 299.0 + f32::from(g) * 587.0 + f32::from(b) * 114.0) / 1000.0
}

fn blend(base: f32, value: u8, factor: f32) -> u8 {
    (base + factor * (f32::from(value) - base)).round().clamp(0.0, 255.0) as u8
}

/// Pushes every channel away from the image's mean gray level.
pub fn adjust_contrast(image: &RgbaImage, factor: f32) -> RgbaImage {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return image.clone();
    }
    let mean = (image.pixels().map(|p| f64::from(luma(*p))).sum::<f64>() / count as f64).round() as f32;

    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([blend(mean, r, factor), blend(mean, g, factor), blend(mean, b, factor), a]);
    }
    output
}

/// Pushes every pixel away from its own gray value.
pub fn adjust_saturation(image: &RgbaImage, factor: f32) -> RgbaImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let gray = luma(*pixel).round();
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([blend(gray, r, factor), blend(gray, g, factor), blend(gray, b, factor), a]);
    }
    output
}

/// Boosts contrast by 20% and saturation by 10%. Alpha is left untouched.
pub fn enhance_sticker_for_ar(image: &RgbaImage, contrast: bool, saturation: bool) -> RgbaImage {
    let mut output = image.clone();
    if contrast {
        output = adjust_contrast(&output, CONTRAST_FACTOR);
    }
    if saturation {
        output = adjust_saturation(&output, SATURATION_FACTOR);
    }
    output
}

/// Downscales so neither side exceeds `max_size`. Never upscales; `0` disables.
pub fn resize_for_ar(image: &DynamicImage, max_size: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if max_size == 0 || width == 0 || height == 0 {
        return image.clone();
    }

    let scale = (max_size as f32 / width as f32).min(max_size as f32 / height as f32);
    if scale >= 1.0 {
        return image.clone();
    }

    let new_width = ((width as f32 * scale) as u32).max(1);
    let new_height = ((height as f32 * scale) as u32).max(1);
    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_gray_image_is_unchanged() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([90, 90, 90, 200]));
        assert_eq!(enhance_sticker_for_ar(&image, true, true), image);
    }

    #[test]
    fn test_contrast_spreads_values_and_keeps_alpha() {
        let image = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([50, 50, 50, 10])
            } else {
                Rgba([150, 150, 150, 0])
            }
        });
        let output = adjust_contrast(&image, 1.2);

        assert_eq!(*output.get_pixel(0, 0), Rgba([40, 40, 40, 10]));
        assert_eq!(*output.get_pixel(1, 0), Rgba([160, 160, 160, 0]));
    }

    #[test]
    fn test_saturation_moves_away_from_gray() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 100, 255]));
        let output = adjust_saturation(&image, 1.1);
        let Rgba([r, g, b, a]) = *output.get_pixel(0, 0);

        assert!(r > 200);
        assert!(g < 100 && b < 100);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_resize_for_ar_limits_longest_side() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(2048, 1024));
        assert_eq!(resize_for_ar(&image, 1024).dimensions(), (1024, 512));

        let small = DynamicImage::ImageRgb8(RgbImage::new(300, 200));
        assert_eq!(resize_for_ar(&small, 1024).dimensions(), (300, 200));
        assert_eq!(resize_for_ar(&image, 0).dimensions(), (2048, 1024));
    }
}
