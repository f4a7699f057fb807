use image::{imageops, GenericImageView, ImageBuffer, Pixel, Primitive};
use imageproc::definitions::Image;

/// Grows the canvas by `padding` pixels on every side, filling with `color`.
///
/// Returns `None` when the padded size does not fit in `u32`.
pub fn pad_uniform<P, S>(image: &Image<P>, padding: u32, color: P) -> Option<Image<P>>
where
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    let (width, height) = image.dimensions();
    let border = padding.checked_mul(2)?;
    let mut canvas = ImageBuffer::from_pixel(
        width.checked_add(border)?,
        height.checked_add(border)?,
        color,
    );
    imageops::replace(&mut canvas, image, i64::from(padding), i64::from(padding));
    Some(canvas)
}

/// Inverse of [`pad_uniform`]. Returns `None` if the image is not larger than
/// twice the padding in both directions.
pub fn crop_uniform<P, S>(image: &Image<P>, padding: u32) -> Option<Image<P>>
where
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + 'static,
{
    let (width, height) = image.dimensions();
    let border = padding.checked_mul(2)?;
    let inner_width = width.checked_sub(border)?;
    let inner_height = height.checked_sub(border)?;
    if inner_width == 0 || inner_height == 0 {
        return None;
    }
    Some(
        image
            .view(padding, padding, inner_width, inner_height)
            .to_image(),
    )
}

/// Centers `image` on a square canvas whose side is its longest edge.
///
/// Returns the canvas and the `(x, y)` offset at which the image was placed.
pub fn letterbox_square<P, S>(image: &Image<P>, color: P) -> (Image<P>, (u32, u32))
where
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    let (width, height) = image.dimensions();
    let side = width.max(height);
    let (x, y) = ((side - width) / 2, (side - height) / 2);

    let mut canvas = ImageBuffer::from_pixel(side, side, color);
    imageops::replace(&mut canvas, image, i64::from(x), i64::from(y));
    (canvas, (x, y))
}
