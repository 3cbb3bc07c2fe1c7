//! Still-image adapter: decode, guard, enhance once, re-encode to JPEG.

use std::io::Cursor;

use crate::{
    enhance::{DenoisePolicy, PipelineTuning, enhance_frame_with},
    error::{RelumeError, RelumeResult},
    frame::FrameBgr,
    params::EnhanceParams,
};

/// Default image-bomb ceiling: 16 megapixels.
pub const DEFAULT_MAX_PIXELS: u64 = 1 << 24;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Boundary options for [`process_image`]. The pixel ceiling is caller
/// policy, checked before the pipeline is invoked.
#[derive(Clone, Copy, Debug)]
pub struct ImageOpts {
    pub max_pixels: u64,
    pub jpeg_quality: u8,
}

impl Default for ImageOpts {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Enhance one encoded image and return JPEG bytes.
///
/// Fails with [`RelumeError::Decode`] when the bytes are not a supported
/// raster image and with [`RelumeError::UnsupportedFrame`] when the pixel
/// count exceeds `opts.max_pixels`; the ceiling is checked from the header
/// before the full decode.
#[tracing::instrument(skip(bytes, params, opts), fields(len = bytes.len()))]
pub fn process_image(
    bytes: &[u8],
    params: &EnhanceParams,
    opts: &ImageOpts,
) -> RelumeResult<Vec<u8>> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RelumeError::decode(format!("unrecognized image data: {e}")))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| RelumeError::decode(format!("failed to read image header: {e}")))?;

    let pixels = u64::from(width) * u64::from(height);
    if pixels > opts.max_pixels {
        return Err(RelumeError::unsupported_frame(format!(
            "image has {pixels} pixels, exceeding the ceiling of {}",
            opts.max_pixels
        )));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| RelumeError::decode(format!("image decode failed: {e}")))?;
    let frame = frame_from_rgb(decoded.to_rgb8())?;

    let enhanced = enhance_frame_with(
        &PipelineTuning::default(),
        frame,
        params,
        DenoisePolicy::Always,
    )?;

    encode_jpeg(&enhanced, opts.jpeg_quality)
}

fn frame_from_rgb(rgb: image::RgbImage) -> RelumeResult<FrameBgr> {
    let (width, height) = rgb.dimensions();
    let mut data = rgb.into_raw();
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
    FrameBgr::from_raw(width, height, data)
}

fn encode_jpeg(frame: &FrameBgr, quality: u8) -> RelumeResult<Vec<u8>> {
    let mut rgb = frame.data().to_vec();
    for px in rgb.chunks_exact_mut(3) {
        px.swap(0, 2);
    }

    use image::ImageEncoder as _;
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    encoder
        .write_image(
            &rgb,
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| RelumeError::encode(format!("jpeg encode failed: {e}")))?;
    Ok(out)
}
