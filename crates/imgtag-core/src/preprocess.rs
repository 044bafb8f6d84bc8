//! Image preprocessing for the multi-label classifier.
//!
//! The WD tagger family expects:
//! - Input size: `target_size × target_size` (448 for the v1.4 models)
//! - Letterbox padding on a white canvas, no cropping
//! - Samples as raw f32 in [0, 255], no mean/std scaling
//! - Channel order: BGR
//! - Tensor layout: NHWC [batch, height, width, channels]

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array4;

/// Number of color channels.
const CHANNELS: usize = 3;

/// Letterbox an image to a square and convert it to a classifier input tensor.
///
/// The image is centered on a white canvas of side `max(width, height)` using
/// floor-division offsets, so an odd-dimension residual lands on the
/// bottom/right edge rather than being split. The canvas is then resized to
/// `target_size` with Catmull-Rom (bicubic) resampling when needed.
pub fn preprocess(image: &DynamicImage, target_size: u32) -> Array4<f32> {
    // Alpha and palette channels are dropped; the only background the image
    // ever meets is the white padding canvas.
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let max_dim = width.max(height);

    let pad_left = (max_dim - width) / 2;
    let pad_top = (max_dim - height) / 2;

    let mut canvas = RgbImage::from_pixel(max_dim, max_dim, Rgb([255, 255, 255]));
    image::imageops::replace(&mut canvas, &rgb, pad_left as i64, pad_top as i64);

    let square = if max_dim != target_size {
        image::imageops::resize(&canvas, target_size, target_size, FilterType::CatmullRom)
    } else {
        canvas
    };

    let size = target_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, size, size, CHANNELS));

    // NHWC is row-major, so pixel i maps to flat offset i * 3. Write through
    // the flat slice to avoid per-pixel 4D indexing overhead.
    let raw = square.as_raw();
    let tensor_data = tensor.as_slice_mut().unwrap();
    for (i, pixel) in raw.chunks_exact(CHANNELS).enumerate() {
        let offset = i * CHANNELS;
        // RGB → BGR: the classifier was exported with reversed channels.
        tensor_data[offset] = pixel[2] as f32;
        tensor_data[offset + 1] = pixel[1] as f32;
        tensor_data[offset + 2] = pixel[0] as f32;
    }

    tensor
}
