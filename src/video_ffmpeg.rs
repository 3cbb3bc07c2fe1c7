//! Video adapter: stream frames through the system `ffmpeg` binary.
//!
//! The input container is probed with `ffprobe`, decoded frames arrive as
//! `bgr24` rawvideo on a child process pipe, each frame runs through the
//! enhancement pipeline in presentation order, and transformed frames are
//! piped into a second `ffmpeg` process encoding H.264/yuv420p MP4. Using
//! the system binaries avoids native FFmpeg dev header/lib requirements.
//!
//! Both child processes are owned by the single invocation that spawned
//! them and are killed and reaped on every exit path, including mid-stream
//! failures; a failed run never leaves a partial result contract.

use std::{
    io::Read,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};

use crate::{
    enhance::{DenoisePolicy, PipelineTuning, enhance_frame_with},
    error::{RelumeError, RelumeResult},
    frame::FrameBgr,
    params::EnhanceParams,
};

/// True when both `ffmpeg` and `ffprobe` respond on PATH.
pub fn is_ffmpeg_available() -> bool {
    let probe = |bin: &str| {
        Command::new(bin)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    };
    probe("ffmpeg") && probe("ffprobe")
}

/// Create the parent directory of `path` when it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> RelumeResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RelumeError::io(format!(
                    "failed to create output directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
    }
    Ok(())
}

/// Stream descriptor, read once at probe time and immutable for the run.
#[derive(Clone, Debug)]
pub struct VideoStreamInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub duration_sec: f64,
    pub nb_frames: Option<u64>,
}

impl VideoStreamInfo {
    /// Nominal frame rate as a float.
    pub fn fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }

    /// Byte length of one decoded `bgr24` frame.
    pub fn frame_byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Read the stream descriptor for a video container via `ffprobe`.
pub fn probe_video(source_path: &Path) -> RelumeResult<VideoStreamInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        nb_frames: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| {
            RelumeError::io(format!(
                "failed to run ffprobe (is it installed and on PATH?): {e}"
            ))
        })?;
    if !out.status.success() {
        return Err(RelumeError::decode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| RelumeError::decode(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| RelumeError::decode("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| RelumeError::decode("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| RelumeError::decode("missing video height from ffprobe"))?;
    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| RelumeError::decode("invalid video r_frame_rate"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    let nb_frames = video_stream
        .nb_frames
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok());

    Ok(VideoStreamInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
        nb_frames,
    })
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if a == 0 || b == 0 {
        return None;
    }
    Some((a, b))
}

/// Encoder-side output configuration.
#[derive(Clone, Debug)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncoderConfig {
    pub fn validate(&self) -> RelumeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RelumeError::unsupported_frame(
                "encode width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // yuv420p output subsamples chroma 2x2.
            return Err(RelumeError::unsupported_frame(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps_num == 0 || self.fps_den == 0 {
            return Err(RelumeError::unsupported_frame(
                "encode frame rate must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Decoding side of the stream: one `ffmpeg` child emitting `bgr24` frames
/// on stdout.
struct FrameReader {
    child: Option<Child>,
    stdout: ChildStdout,
    source: PathBuf,
}

impl FrameReader {
    fn open(info: &VideoStreamInfo) -> RelumeResult<Self> {
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(&info.source_path)
            .args(["-f", "rawvideo", "-pix_fmt", "bgr24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                RelumeError::io(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RelumeError::io("failed to open ffmpeg stdout (unexpected)"))?;

        Ok(Self {
            child: Some(child),
            stdout,
            source: info.source_path.clone(),
        })
    }

    /// Fill `buf` with the next frame. Returns `false` on a clean end of
    /// stream; a partially delivered frame is a decode failure.
    fn read_frame(&mut self, buf: &mut [u8]) -> RelumeResult<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(RelumeError::decode(format!(
                        "failed to read decoded frame: {e}"
                    )));
                }
            }
        }
        if filled == 0 {
            return Ok(false);
        }
        if filled < buf.len() {
            return Err(RelumeError::decode(format!(
                "truncated frame from '{}': got {filled} of {} bytes",
                self.source.display(),
                buf.len()
            )));
        }
        Ok(true)
    }

    /// Reap the child after end of stream and surface a failed exit.
    fn finish(mut self) -> RelumeResult<()> {
        let child = self
            .child
            .take()
            .ok_or_else(|| RelumeError::decode("ffmpeg decoder is already finalized"))?;
        let output = child.wait_with_output().map_err(|e| {
            RelumeError::io(format!("failed to wait for ffmpeg decoder: {e}"))
        })?;
        if !output.status.success() {
            return Err(RelumeError::decode(format!(
                "ffmpeg decode failed for '{}': {}",
                self.source.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FrameReader {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Encoding side of the stream: one `ffmpeg` child consuming `bgr24`
/// frames on stdin and writing H.264/yuv420p MP4.
struct FrameWriter {
    cfg: EncoderConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FrameWriter {
    fn new(cfg: EncoderConfig) -> RelumeResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(RelumeError::io(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "bgr24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps_num, cfg.fps_den),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            RelumeError::io(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RelumeError::io("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            cfg,
            child: Some(child),
            stdin: Some(stdin),
        })
    }

    fn write_frame(&mut self, frame: &FrameBgr) -> RelumeResult<()> {
        if frame.width() != self.cfg.width || frame.height() != self.cfg.height {
            return Err(RelumeError::unsupported_frame(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.cfg.width,
                self.cfg.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(RelumeError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(frame.data()).map_err(|e| {
            RelumeError::io(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn finish(mut self) -> RelumeResult<()> {
        drop(self.stdin.take());

        let child = self
            .child
            .take()
            .ok_or_else(|| RelumeError::encode("ffmpeg encoder is already finalized"))?;
        let output = child.wait_with_output().map_err(|e| {
            RelumeError::io(format!("failed to wait for ffmpeg encoder: {e}"))
        })?;
        if !output.status.success() {
            return Err(RelumeError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FrameWriter {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Enhance a whole video: every decoded frame runs the pipeline in
/// presentation order, and the output container matches the input's
/// dimensions, frame rate, and frame count.
///
/// The denoise stage is skipped when its strength is zero; other stages
/// always run. A mid-stream failure aborts the run; no partial output
/// contract exists.
#[tracing::instrument(skip(params))]
pub fn process_video(
    input: &Path,
    output: &Path,
    params: &EnhanceParams,
) -> RelumeResult<()> {
    let info = probe_video(input)?;
    if !info.width.is_multiple_of(2) || !info.height.is_multiple_of(2) {
        return Err(RelumeError::unsupported_frame(format!(
            "video dimensions {}x{} must be even for yuv420p output",
            info.width, info.height
        )));
    }

    let cfg = EncoderConfig {
        width: info.width,
        height: info.height,
        fps_num: info.fps_num,
        fps_den: info.fps_den,
        out_path: output.to_path_buf(),
        overwrite: true,
    };

    let result = stream_frames(&info, cfg, params);
    if result.is_err() {
        // No partial-result contract: a mid-stream failure discards the
        // half-written container.
        let _ = std::fs::remove_file(output);
    }
    result
}

fn stream_frames(
    info: &VideoStreamInfo,
    cfg: EncoderConfig,
    params: &EnhanceParams,
) -> RelumeResult<()> {
    let mut reader = FrameReader::open(info)?;
    let mut writer = FrameWriter::new(cfg)?;

    let tuning = PipelineTuning::default();
    let mut buf = vec![0u8; info.frame_byte_len()];
    let mut frames: u64 = 0;
    while reader.read_frame(&mut buf)? {
        let frame = FrameBgr::from_raw(info.width, info.height, std::mem::take(&mut buf))?;
        let enhanced = enhance_frame_with(&tuning, frame, params, DenoisePolicy::SkipWhenZero)?;
        writer.write_frame(&enhanced)?;
        buf = enhanced.into_raw();
        frames += 1;
    }

    reader.finish()?;
    writer.finish()?;
    tracing::debug!(frames, "video stream transformed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_parsing_accepts_fractions_and_rejects_zero() {
        assert_eq!(parse_ff_ratio("30/1"), Some((30, 1)));
        assert_eq!(parse_ff_ratio("30000/1001"), Some((30000, 1001)));
        assert_eq!(parse_ff_ratio("0/1"), None);
        assert_eq!(parse_ff_ratio("30/0"), None);
        assert_eq!(parse_ff_ratio("abc"), None);
    }

    #[test]
    fn encoder_config_validation_catches_bad_values() {
        let base = EncoderConfig {
            width: 640,
            height: 480,
            fps_num: 30,
            fps_den: 1,
            out_path: PathBuf::from("out.mp4"),
            overwrite: true,
        };
        assert!(base.validate().is_ok());

        let mut cfg = base.clone();
        cfg.width = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.width = 641;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.fps_num = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn probing_a_missing_file_fails() {
        assert!(probe_video(Path::new("/nonexistent/clip.mp4")).is_err());
    }

    #[test]
    fn stream_info_helpers() {
        let info = VideoStreamInfo {
            source_path: PathBuf::from("a.mp4"),
            width: 640,
            height: 480,
            fps_num: 30000,
            fps_den: 1001,
            duration_sec: 1.0,
            nb_frames: Some(30),
        };
        assert!((info.fps() - 29.97).abs() < 0.01);
        assert_eq!(info.frame_byte_len(), 640 * 480 * 3);
    }
}
