use image::Luma;
use imageproc::map::map_pixels;

use crate::types::Mask;

/// Mask values at or above this count as foreground when a binary view is needed.
pub const FOREGROUND_LEVEL: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForegroundStats {
    pub area: u64,
    /// Mean `(x, y)` of the foreground pixels.
    pub centroid: (f64, f64),
}

#[inline]
pub fn is_foreground(value: f32) -> bool {
    value >= FOREGROUND_LEVEL
}

pub fn foreground_area(mask: &Mask) -> u64 {
    mask.pixels().filter(|p| is_foreground(p[0])).count() as u64
}

/// Area and centroid of the foreground, or `None` for an empty mask.
pub fn foreground_stats(mask: &Mask) -> Option<ForegroundStats> {
    let mut area = 0u64;
    let (mut sum_x, mut sum_y) = (0f64, 0f64);

    for (x, y, pixel) in mask.enumerate_pixels() {
        if is_foreground(pixel[0]) {
            area += 1;
            sum_x += f64::from(x);
            sum_y += f64::from(y);
        }
    }

    (area > 0).then(|| ForegroundStats {
        area,
        centroid: (sum_x / area as f64, sum_y / area as f64),
    })
}

/// `1.0` where the value is strictly above `threshold`, `0.0` elsewhere.
pub fn binarize(mask: &Mask, threshold: f32) -> Mask {
    map_pixels(mask, |_x, _y, Luma([value])| {
        Luma([if value > threshold { 1.0 } else { 0.0 }])
    })
}

pub fn clamp_unit(mask: &Mask) -> Mask {
    map_pixels(mask, |_x, _y, Luma([value])| Luma([value.clamp(0.0, 1.0)]))
}

pub fn all_finite(mask: &Mask) -> bool {
    mask.pixels().all(|p| p[0].is_finite())
}
