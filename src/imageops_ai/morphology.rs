//! Grayscale morphology with a 3x3 square structuring element.
//!
//! Pixels outside the image are ignored, so the border never erodes or
//! dilates on its own.

use image::{ImageBuffer, Luma};

use crate::types::Mask;

fn filter3x3(mask: &Mask, pick: fn(f32, f32) -> f32) -> Mask {
    let (width, height) = mask.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        let mut value = mask.get_pixel(x, y)[0];
        for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                value = pick(value, mask.get_pixel(nx, ny)[0]);
            }
        }
        Luma([value])
    })
}

pub fn dilate(mask: &Mask) -> Mask {
    filter3x3(mask, f32::max)
}

pub fn erode(mask: &Mask) -> Mask {
    filter3x3(mask, f32::min)
}

/// Dilate then erode: fills holes narrower than the element.
pub fn close(mask: &Mask) -> Mask {
    erode(&dilate(mask))
}

/// Erode then dilate: removes specks narrower than the element.
pub fn open(mask: &Mask) -> Mask {
    dilate(&erode(mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: u32, lo: u32, hi: u32) -> Mask {
        ImageBuffer::from_fn(size, size, |x, y| {
            Luma([if (lo..hi).contains(&x) && (lo..hi).contains(&y) { 1.0 } else { 0.0 }])
        })
    }

    #[test]
    fn test_close_fills_single_pixel_hole() {
        let mut mask = square(12, 2, 10);
        mask.put_pixel(5, 5, Luma([0.0]));

        let closed = close(&mask);
        assert_eq!(closed.get_pixel(5, 5)[0], 1.0);
        assert_eq!(closed, square(12, 2, 10));
    }

    #[test]
    fn test_open_removes_isolated_speck() {
        let mut mask = square(12, 4, 10);
        mask.put_pixel(1, 1, Luma([1.0]));

        let opened = open(&mask);
        assert_eq!(opened.get_pixel(1, 1)[0], 0.0);
        assert_eq!(opened, square(12, 4, 10));
    }

    #[test]
    fn test_dilate_and_erode_grow_and_shrink() {
        let mask = square(8, 3, 5);
        assert_eq!(dilate(&mask), square(8, 2, 6));
        assert_eq!(erode(&square(8, 2, 6)), mask);
    }

    #[test]
    fn test_full_mask_is_stable_at_border() {
        let mask: Mask = ImageBuffer::from_pixel(4, 4, Luma([1.0]));
        assert_eq!(open(&close(&mask)), mask);
    }
}
