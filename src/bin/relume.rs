use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use relume::{EnhanceParams, ImageOpts, RawEnhanceParams};

/// Widest input stream the video command accepts. Wider/taller streams are
/// rejected before the adapter is invoked; the ceiling is caller policy,
/// not part of the transform core.
const MAX_VIDEO_WIDTH: u32 = 1280;
const MAX_VIDEO_HEIGHT: u32 = 720;

#[derive(Parser, Debug)]
#[command(name = "relume", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enhance a single image and write a JPEG.
    Image(ImageArgs),
    /// Enhance a video clip and write an MP4 (requires `ffmpeg` on PATH).
    Video(VideoArgs),
}

#[derive(Args, Debug)]
struct ParamArgs {
    /// Use the fixed auto preset instead of the tunable knobs.
    #[arg(
        long,
        conflicts_with_all = ["denoise", "saturation", "sharpness", "contrast", "brightness"]
    )]
    auto: bool,

    /// Denoise strength (0..=20, default 15).
    #[arg(long)]
    denoise: Option<f32>,

    /// Saturation multiplier (0.5..=2, default 1.3).
    #[arg(long)]
    saturation: Option<f32>,

    /// Sharpness factor (0..=3, default 1).
    #[arg(long)]
    sharpness: Option<f32>,

    /// Contrast multiplier (1..=3, default 1.15).
    #[arg(long)]
    contrast: Option<f32>,

    /// Brightness offset (-100..=100, default 15).
    #[arg(long)]
    brightness: Option<f32>,
}

impl ParamArgs {
    fn resolve(&self) -> EnhanceParams {
        if self.auto {
            EnhanceParams::auto()
        } else {
            EnhanceParams::manual(RawEnhanceParams {
                denoise_strength: self.denoise,
                saturation_factor: self.saturation,
                sharpness_factor: self.sharpness,
                contrast_alpha: self.contrast,
                brightness_beta: self.brightness,
            })
        }
    }
}

#[derive(Args, Debug)]
struct ImageArgs {
    /// Input image path.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    /// Pixel-count ceiling for decoded input.
    #[arg(long, default_value_t = relume::DEFAULT_MAX_PIXELS)]
    max_pixels: u64,

    /// JPEG quality (1..=100).
    #[arg(long, default_value_t = relume::DEFAULT_JPEG_QUALITY)]
    quality: u8,

    #[command(flatten)]
    params: ParamArgs,
}

#[derive(Args, Debug)]
struct VideoArgs {
    /// Input video path.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    params: ParamArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Image(args) => cmd_image(args),
        Command::Video(args) => cmd_video(args),
    }
}

fn cmd_image(args: ImageArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read input '{}'", args.in_path.display()))?;

    let opts = ImageOpts {
        max_pixels: args.max_pixels,
        jpeg_quality: args.quality,
    };
    let jpeg = relume::process_image(&bytes, &args.params.resolve(), &opts)?;

    relume::ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &jpeg)
        .with_context(|| format!("write output '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_video(args: VideoArgs) -> anyhow::Result<()> {
    let info = relume::probe_video(&args.in_path)?;
    if info.width > MAX_VIDEO_WIDTH || info.height > MAX_VIDEO_HEIGHT {
        anyhow::bail!(
            "video is {}x{}, exceeding the {}x{} processing ceiling",
            info.width,
            info.height,
            MAX_VIDEO_WIDTH,
            MAX_VIDEO_HEIGHT
        );
    }

    relume::process_video(&args.in_path, &args.out, &args.params.resolve())?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
