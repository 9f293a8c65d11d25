use crate::error::{ClassifierError, Result};
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use image::RgbImage;
use ndarray::{Array4, ArrayView4};

/// Spatial resolution the classification model was trained on.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (224, 224);
pub const CHANNELS: usize = 3;

/// `[1, H, W, 3]` tensor of raw 0..=255 RGB intensities, channel-last.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor(Array4<f32>);

impl InputTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn dims(&self) -> [usize; 4] {
        let (n, h, w, c) = self.0.dim();
        [n, h, w, c]
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    /// Contiguous row-major data, `None` only for non-standard layouts.
    pub fn as_slice(&self) -> Option<&[f32]> {
        self.0.as_slice()
    }
}

impl From<Array4<f32>> for InputTensor {
    fn from(array: Array4<f32>) -> Self {
        Self(array)
    }
}

/// Turns encoded JPEG/PNG bytes into the model's input tensor.
///
/// The image is stretched to the input size by 2x2 bilinear interpolation
/// (no letterboxing, no cropping, no area averaging on downscale) and the pixels are packed unnormalized: the
/// bundled model expects raw intensities, not ImageNet mean/std values.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    pub input_size: (u32, u32),
}

impl ImagePreprocessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self { input_size }
    }

    pub fn preprocess(&self, image_bytes: &[u8]) -> Result<InputTensor> {
        let _s = span!("preprocess_image");

        let rgb = Self::decode(image_bytes)?;

        tracing::trace!(
            width = rgb.width(),
            height = rgb.height(),
            encoded_bytes = image_bytes.len(),
            "Decoded image"
        );

        let resized = self.resize(&rgb)?;

        Self::pack(&resized)
    }

    /// Decodes and flattens to 8-bit RGB: alpha is dropped and grayscale is
    /// replicated into all three channels.
    fn decode(image_bytes: &[u8]) -> Result<RgbImage> {
        let _s = span!("decode");

        let decoded = image::load_from_memory(image_bytes)?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ClassifierError::Decode(format!(
                "image has empty dimensions {}x{}",
                decoded.width(),
                decoded.height()
            )));
        }

        Ok(decoded.to_rgb8())
    }

    fn resize(&self, rgb: &RgbImage) -> Result<Image<'static>> {
        let _s = span!("resize");

        let src = ImageRef::new(rgb.width(), rgb.height(), rgb.as_raw(), PixelType::U8x3)
            .map_err(|e| ClassifierError::Inference(format!("invalid source buffer: {}", e)))?;

        let mut resized = Image::new(self.input_size.0, self.input_size.1, PixelType::U8x3);

        Resizer::new()
            .resize(
                &src,
                &mut resized,
                &ResizeOptions::new()
                    .resize_alg(ResizeAlg::Interpolation(FilterType::Bilinear)),
            )
            .map_err(|e| ClassifierError::Inference(format!("resize failed: {}", e)))?;

        Ok(resized)
    }

    /// Copies `R, G, B` of pixel `(x, y)` into `tensor[0][y][x][0..3]`.
    fn pack(image: &Image) -> Result<InputTensor> {
        let _s = span!("pack");

        let width = image.width() as usize;
        let height = image.height() as usize;

        let data: Vec<f32> = image.buffer().iter().copied().map(f32::from).collect();

        let array = Array4::from_shape_vec((1, height, width, CHANNELS), data)
            .map_err(|e| ClassifierError::Inference(format!("tensor packing failed: {}", e)))?;

        Ok(InputTensor(array))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}
