use std::{ops::Div, path::Path, sync::Arc};

use crate::{
    engine::StrategyHandle,
    errors::{Result, StickerSegError},
    imageops_ai::padding::letterbox_square,
    traits::WholeMaskStrategy,
    types::Mask,
};
use image::{
    imageops, imageops::FilterType, DynamicImage, GenericImageView, ImageBuffer, Luma, Pixel,
    Primitive, Rgb,
};
use imageproc::definitions::Image;
use ndarray::prelude::*;
use nshare::AsNdarray3;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;

/// Whole-image matting model (U2-Net style) served through ONNX Runtime.
///
/// Takes one `1x3xSxS` image tensor and returns a `1x1xSxS` foreground
/// probability map.
pub struct Model {
    pub image_size: u32,
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

impl Model {
    pub fn new(model_path: &Path, device_id: i32) -> Result<Self> {
        let mut session = SessionBuilder::new()
            .map_err(|e| StickerSegError::Model {
                operation: "session builder init".to_string(),
                source: Box::new(e),
            })?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| StickerSegError::Model {
                operation: "execution provider setup".to_string(),
                source: Box::new(e),
            })?
            .with_memory_pattern(true)
            .map_err(|e| StickerSegError::Model {
                operation: "memory pattern setup".to_string(),
                source: Box::new(e),
            })?
            .commit_from_file(model_path)
            .map_err(|e| StickerSegError::Model {
                operation: format!("load model file: {}", model_path.display()),
                source: Box::new(e),
            })?;

        let missing = |what: &str| StickerSegError::Model {
            operation: format!("read model {what}"),
            source: format!("model declares no {what}").into(),
        };
        let input = session.inputs.first().ok_or_else(|| missing("inputs"))?;
        let input_name = input.name.clone();
        let image_size = input
            .input_type
            .tensor_shape()
            .and_then(|shape| shape.get(2).copied())
            .filter(|&side| side > 0)
            .ok_or_else(|| missing("static input shape"))? as u32;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| missing("outputs"))?;

        // warm up
        let data = Array4::<f32>::zeros((1, 3, image_size as usize, image_size as usize));
        session
            .run(ort::inputs![input_name.as_str() => TensorRef::from_array_view(&data)?])
            .map_err(|e| StickerSegError::Model {
                operation: "warm-up inference".to_string(),
                source: Box::new(e),
            })?;

        tracing::info!(
            path = %model_path.display(),
            image_size,
            input = %input_name,
            output = %output_name,
            "matting model loaded"
        );

        Ok(Self {
            image_size,
            input_name,
            output_name,
            session: Mutex::new(session),
        })
    }

    /// Handle that loads the model on first use.
    pub fn lazy_handle(model_path: &Path, device_id: i32) -> StrategyHandle<dyn WholeMaskStrategy> {
        let model_path = model_path.to_path_buf();
        StrategyHandle::new("onnx matting model", move || {
            let model = Self::new(&model_path, device_id)?;
            Ok(Arc::new(model) as Arc<dyn WholeMaskStrategy>)
        })
    }

    pub fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>> {
        let mut binding = self.session.lock();
        let outputs = binding.run(
            ort::inputs![self.input_name.as_str() => TensorRef::from_array_view(&tensor.as_standard_layout())?],
        )?;
        Ok(outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?
            .to_owned())
    }
}

impl WholeMaskStrategy for Model {
    fn segment(&self, image: &DynamicImage) -> Result<Mask> {
        let rgb_img = image.to_rgb8();
        let (tensor, crop) = preprocess(&rgb_img, self.image_size)?;
        let prediction = self.predict(tensor.view())?;
        let (width, height) = image.dimensions();
        postprocess_mask(prediction, self.image_size, crop, width, height)
    }
}

/// Resizes so the longest side equals `image_size`, letterboxes onto a black
/// square and converts to a normalized `1x3xSxS` BGR tensor.
///
/// Also returns `[x, y, w, h]` of the image inside the square.
pub fn preprocess<S>(image: &Image<Rgb<S>>, image_size: u32) -> Result<(Array4<f32>, [u32; 4])>
where
    Rgb<S>: Pixel<Subpixel = S>,
    S: Into<f32> + Primitive + 'static,
{
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(StickerSegError::Validation {
            field: "image".to_string(),
            reason: "has no pixels".to_string(),
        });
    }
    let scale = image_size as f32 / src_w.max(src_h) as f32;
    let w = ((src_w as f32 * scale).round() as u32).clamp(1, image_size);
    let h = ((src_h as f32 * scale).round() as u32).clamp(1, image_size);

    let resized = imageops::resize(image, w, h, FilterType::Lanczos3);
    let zero = S::zero();
    let (square, (x, y)) = letterbox_square(&resized, Rgb([zero, zero, zero]));
    let square = if square.width() == image_size {
        square
    } else {
        let (side, _) = square.dimensions();
        let fitted = imageops::resize(&square, image_size, image_size, FilterType::Lanczos3);
        tracing::debug!(side, image_size, "letterbox resized to model input");
        fitted
    };

    let tensor = square.as_ndarray3().slice_move(s![NewAxis, ..;-1, .., ..]);
    let max = S::DEFAULT_MAX_VALUE.into();
    let tensor = if max == (<f32 as Primitive>::DEFAULT_MAX_VALUE) {
        tensor.map(|v| (*v).into())
    } else {
        tensor.map(|v| <S as Into<f32>>::into(*v).div(max))
    };

    Ok((tensor, [x, y, w, h]))
}

/// Crops the letterboxed prediction back to the image, resizes it to
/// `width` x `height` and stretches its range to `[0, 1]`.
pub fn postprocess_mask(
    prediction: Array4<f32>,
    image_size: u32,
    crop: [u32; 4],
    width: u32,
    height: u32,
) -> Result<Mask> {
    let [x, y, w, h] = crop;
    let raw: Vec<f32> = prediction.as_standard_layout().iter().copied().collect();
    let square: Mask = ImageBuffer::from_raw(image_size, image_size, raw).ok_or_else(|| {
        StickerSegError::Model {
            operation: "read prediction".to_string(),
            source: format!(
                "expected a {image_size}x{image_size} mask, got shape {:?}",
                prediction.shape()
            )
            .into(),
        }
    })?;

    let cropped = square.view(x, y, w, h).to_image();
    let resized = imageops::resize(&cropped, width, height, FilterType::Lanczos3);

    let (lo, hi) = resized
        .pixels()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[0]), hi.max(p[0]))
        });
    let range = hi - lo;
    Ok(ImageBuffer::from_fn(width, height, |px, py| {
        let value = resized.get_pixel(px, py)[0];
        let value = if range > f32::EPSILON {
            (value - lo) / range
        } else {
            value
        };
        Luma([value.clamp(0.0, 1.0)])
    }))
}
