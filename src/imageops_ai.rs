pub mod alpha_mask_applicable;
pub mod blur;
pub mod enhance;
pub mod mask;
pub mod morphology;
pub mod padding;

pub use alpha_mask_applicable::AlphaMaskApplicable;

use image::Primitive;
use num_traits::AsPrimitive;
use std::any::TypeId;

pub fn is_floating_point<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<f32>() || TypeId::of::<T>() == TypeId::of::<f64>()
}

/// Channel value that represents full intensity (`255` for `u8`, `1.0` for `f32`).
pub fn get_max_value<S: Primitive + AsPrimitive<f32>>() -> f32 {
    S::DEFAULT_MAX_VALUE.as_()
}

/// Converts a `[0, 1]` mask value into a channel sample.
///
/// Integer channels are rounded to the nearest step; float channels keep the
/// value as-is.
pub fn mask_to_channel<S>(value: f32) -> S
where
    S: Primitive + AsPrimitive<f32> + 'static,
    f32: AsPrimitive<S>,
{
    let scaled = value.clamp(0.0, 1.0) * get_max_value::<S>();
    if is_floating_point::<S>() {
        scaled.as_()
    } else {
        scaled.round().as_()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_to_channel_u8_rounds() {
        assert_eq!(mask_to_channel::<u8>(0.0), 0);
        assert_eq!(mask_to_channel::<u8>(1.0), 255);
        assert_eq!(mask_to_channel::<u8>(0.5), 128);
        assert_eq!(mask_to_channel::<u8>(0.25), 64);
    }

    #[test]
    fn test_mask_to_channel_u16_and_float() {
        assert_eq!(mask_to_channel::<u16>(1.0), u16::MAX);
        assert_eq!(mask_to_channel::<f32>(0.37), 0.37);
    }

    #[test]
    fn test_mask_to_channel_clamps() {
        assert_eq!(mask_to_channel::<u8>(1.7), 255);
        assert_eq!(mask_to_channel::<u8>(-0.2), 0);
    }
}
