use crate::config::OutputFormat;
use crate::ResizeKitError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType};
use image::ImageEncoder;

/// Decodes raw image bytes into a memory-resident pixel buffer.
///
/// Performs format detection from magic bytes before decoding, so corrupt or
/// non-image content fails here rather than deeper in the pipeline.
///
/// # Errors
/// Returns `ResizeKitError::TransformError` if the format cannot be detected
/// or the data is malformed.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ResizeKitError> {
    let guessed = image::guess_format(bytes)
        .map_err(|e| ResizeKitError::TransformError(e.to_string()))?;

    image::load_from_memory_with_format(bytes, guessed)
        .map_err(|e| ResizeKitError::TransformError(e.to_string()))
}

/// Resolves the target dimensions for a resize, filling a zero width or
/// height from the original's aspect ratio.
///
/// - Height 0: height scales with the requested width.
/// - Width 0: width scales with the requested height.
/// - Both nonzero: used as given; disproportionate stretch is the caller's
///   choice.
/// - Both zero: stays (0, 0), which the resize step rejects.
pub fn resolve_dimensions(original: (u32, u32), width: u32, height: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;

    if height == 0 {
        let ratio = width as f32 / orig_w as f32;
        (width, (orig_h as f32 * ratio).round() as u32)
    } else if width == 0 {
        let ratio = height as f32 / orig_h as f32;
        ((orig_w as f32 * ratio).round() as u32, height)
    } else {
        (width, height)
    }
}

/// Resizes to the exact target dimensions with Lanczos3 resampling.
///
/// A zero-sized target is degenerate input (both dimensions were omitted or
/// unparseable) and is reported as a transform error.
pub fn resize_image(
    img: DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, ResizeKitError> {
    if width == 0 || height == 0 {
        return Err(ResizeKitError::TransformError(format!(
            "degenerate resize target {}x{}",
            width, height
        )));
    }

    Ok(img.resize_exact(width, height, image::imageops::FilterType::Lanczos3))
}

/// Encodes a pixel buffer as PNG or JPEG.
///
/// PNG keeps the alpha channel; JPEG flattens to RGB and compresses at the
/// given quality (clamped to [1, 100]).
///
/// # Errors
/// Returns `ResizeKitError::TransformError` on encoder failures.
pub fn encode_image(
    img: &DynamicImage,
    fmt: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, ResizeKitError> {
    let mut out = Vec::new();

    match fmt {
        OutputFormat::Png => {
            let rgba = img.to_rgba8();
            let (w, h) = rgba.dimensions();
            let enc = PngEncoder::new(&mut out);
            enc.write_image(rgba.as_raw(), w, h, ExtendedColorType::Rgba8)
                .map_err(|e| ResizeKitError::TransformError(e.to_string()))?;
        }
        OutputFormat::Jpeg => {
            let q = quality.clamp(1, 100);
            let rgb = img.to_rgb8();
            let (w, h) = rgb.dimensions();
            let enc = JpegEncoder::new_with_quality(&mut out, q);
            enc.write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
                .map_err(|e| ResizeKitError::TransformError(e.to_string()))?;
        }
    }

    Ok(out)
}
