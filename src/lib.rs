//! Relume enhances low-light photographs and short video clips.
//!
//! The core is a fixed five-stage pixel transform pipeline, applied
//! identically to one still image and to every frame of a video in
//! playback order:
//!
//! 1. **Local contrast**: clip-limited adaptive histogram equalization on
//!    the luma plane (fixed clip limit and tile grid).
//! 2. **Noise reduction**: non-local-means filtering, luma at full strength
//!    and chroma at half strength.
//! 3. **Saturation boost**: HSV saturation scaling.
//! 4. **Sharpening**: 3x3 convolution with a kernel interpolated between
//!    identity and a fixed Laplacian-style kernel.
//! 5. **Global tone map**: per-sample affine `clamp(alpha*x + beta, 0, 255)`.
//!
//! The pipeline is a pure function of frame and parameters: the same input
//! always produces byte-identical output. Frames travel in blue-green-red
//! channel order end to end.
//!
//! Two boundary operations wrap the pipeline: [`process_image`] (encoded
//! bytes in, JPEG bytes out, via the `image` crate) and [`process_video`]
//! (container in, H.264 MP4 out, streamed through the system `ffmpeg`
//! binary). Caller-side policies (the image pixel ceiling and the video
//! resolution ceiling) live at those boundaries, not inside the pipeline.
#![forbid(unsafe_code)]

pub mod clahe;
pub mod color;
pub mod denoise;
pub mod enhance;
pub mod error;
pub mod frame;
pub mod image_io;
pub mod params;
pub mod sharpen;
pub mod video_ffmpeg;

pub use enhance::{DenoisePolicy, PipelineTuning, enhance_frame, enhance_frame_with, tone_map};
pub use error::{RelumeError, RelumeResult};
pub use frame::FrameBgr;
pub use image_io::{DEFAULT_JPEG_QUALITY, DEFAULT_MAX_PIXELS, ImageOpts, process_image};
pub use params::{EnhanceParams, RawEnhanceParams};
pub use video_ffmpeg::{
    EncoderConfig, VideoStreamInfo, ensure_parent_dir, is_ffmpeg_available, probe_video,
    process_video,
};
