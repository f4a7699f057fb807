//! Fixed-size separable Gaussian blur for masks.

use image::{ImageBuffer, Luma};

use crate::types::Mask;

/// Sigma used for a `ksize`-tap kernel when no sigma is given explicitly.
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian of `2 * radius + 1` taps.
pub fn gaussian_kernel(radius: u32) -> Vec<f32> {
    let ksize = 2 * radius + 1;
    let sigma = sigma_for_kernel(ksize);
    let scale = -0.5 / (sigma * sigma);
    let center = radius as f32;

    let weights: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - center;
            (scale * d * d).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Mirror index without repeating the edge sample (`dcb|abcd|cba`).
fn reflect_101(index: i64, len: i64) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let mut i = index.rem_euclid(period);
    if i >= len {
        i = period - i;
    }
    i as usize
}

fn convolve_rows(mask: &Mask, kernel: &[f32]) -> Mask {
    let (width, height) = mask.dimensions();
    let radius = (kernel.len() / 2) as i64;
    ImageBuffer::from_fn(width, height, |x, y| {
        let sum: f32 = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let sx = reflect_101(i64::from(x) + k as i64 - radius, i64::from(width));
                w * mask.get_pixel(sx as u32, y)[0]
            })
            .sum();
        Luma([sum])
    })
}

fn convolve_columns(mask: &Mask, kernel: &[f32]) -> Mask {
    let (width, height) = mask.dimensions();
    let radius = (kernel.len() / 2) as i64;
    ImageBuffer::from_fn(width, height, |x, y| {
        let sum: f32 = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let sy = reflect_101(i64::from(y) + k as i64 - radius, i64::from(height));
                w * mask.get_pixel(x, sy as u32)[0]
            })
            .sum();
        Luma([sum])
    })
}

/// Blurs with a `(2 * radius + 1)` square Gaussian kernel. A zero radius is a copy.
pub fn gaussian_blur(mask: &Mask, radius: u32) -> Mask {
    if radius == 0 {
        return mask.clone();
    }
    let kernel = gaussian_kernel(radius);
    convolve_columns(&convolve_rows(mask, &kernel), &kernel)
}
