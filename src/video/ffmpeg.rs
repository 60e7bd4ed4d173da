//! Frame I/O through external `ffmpeg`/`ffprobe` processes.
//!
//! Decoding pipes `rgb24` rawvideo out of ffmpeg's stdout; encoding pipes it
//! into ffmpeg's stdin. Child processes are killed and reaped on drop, so
//! every exit path releases them.

use crate::core::error::{VideoError, VideoResult};
use crate::core::types::{CodecId, Frame, VideoInfo};
use crate::video::codec::CodecProbe;
use crate::video::{FrameSink, FrameSource};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

/// Bytes of encoder diagnostics kept for error reports.
const STDERR_TAIL: usize = 64 * 1024;

/// Locations of the ffmpeg executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegTools {
    /// Path to `ffmpeg`
    pub ffmpeg: PathBuf,
    /// Path to `ffprobe`
    pub ffprobe: PathBuf,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegTools {
    /// Query stream properties of the first video stream in `input`.
    pub fn probe(&self, input: &Path) -> VideoResult<VideoInfo> {
        if !input.exists() {
            return Err(VideoError::SourceUnavailable {
                path: input.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }

        let output = Command::new(&self.ffprobe)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(input)
            .output()
            .map_err(|source| VideoError::Spawn {
                program: self.ffprobe.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(VideoError::SourceUnavailable {
                path: input.to_path_buf(),
                reason: format!("ffprobe exited with {}", output.status),
            });
        }

        let json = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&json).map_err(|reason| VideoError::Probe {
            path: input.to_path_buf(),
            reason,
        })
    }
}

/// Parse ffprobe JSON output into [`VideoInfo`].
///
/// The frame count comes from `nb_frames` when the container records it and
/// is otherwise estimated from the duration, so it is only a hint.
pub fn parse_probe_output(json: &str) -> Result<VideoInfo, String> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| format!("Failed to parse ffprobe output: {}", e))?;

    let stream = value
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("video"))
        })
        .ok_or_else(|| "no video stream".to_string())?;

    let width = stream.get("width").and_then(|w| w.as_u64()).unwrap_or(0) as u32;
    let height = stream.get("height").and_then(|h| h.as_u64()).unwrap_or(0) as u32;
    if width == 0 || height == 0 {
        return Err("video stream has no dimensions".to_string());
    }

    let fps = stream
        .get("r_frame_rate")
        .and_then(|f| f.as_str())
        .and_then(parse_rate)
        .unwrap_or(30.0);

    let duration = stream
        .get("duration")
        .or_else(|| value.get("format").and_then(|f| f.get("duration")))
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse::<f64>().ok());

    let total_frames = stream
        .get("nb_frames")
        .and_then(|n| n.as_str())
        .and_then(|n| n.parse::<u64>().ok())
        .or_else(|| duration.map(|d| (d * fps).round() as u64))
        .unwrap_or(0);

    let codec = stream
        .get("codec_tag")
        .and_then(|t| t.as_str())
        .and_then(|t| u32::from_str_radix(t.trim_start_matches("0x"), 16).ok())
        .and_then(CodecId::from_packed);

    Ok(VideoInfo {
        width,
        height,
        fps,
        total_frames,
        codec,
    })
}

/// Parse a frame rate like `30/1` or `30000/1001`.
fn parse_rate(text: &str) -> Option<f64> {
    match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den > 0.0 && num > 0.0).then(|| num / den)
        }
        None => text.parse().ok().filter(|rate: &f64| *rate > 0.0),
    }
}

/// The ffmpeg encoder and codec tag that produce a fourcc.
pub fn encoder_for(codec: &CodecId) -> Option<(&'static str, Option<&'static str>)> {
    let encoder = match codec.as_str() {
        "mp4v" => ("mpeg4", Some("mp4v")),
        "FMP4" => ("mpeg4", Some("FMP4")),
        "DIVX" => ("mpeg4", Some("DIVX")),
        "XVID" => ("mpeg4", Some("XVID")),
        "MJPG" => ("mjpeg", None),
        "H264" | "X264" => ("libx264", None),
        "avc1" => ("libx264", Some("avc1")),
        "WMV1" => ("wmv1", None),
        "WMV2" => ("wmv2", None),
        "I420" | "IYUV" => ("rawvideo", None),
        "mpg1" => ("mpeg1video", None),
        _ => return None,
    };
    Some(encoder)
}

/// Decodes a video file into RGB frames.
pub struct FfmpegSource {
    info: VideoInfo,
    child: Child,
    stdout: BufReader<ChildStdout>,
    frame_len: usize,
    exhausted: bool,
}

impl FfmpegSource {
    /// Probe and open `input` for decoding.
    pub fn open(tools: &FfmpegTools, input: &Path) -> VideoResult<Self> {
        let info = tools.probe(input)?;

        let mut child = Command::new(&tools.ffmpeg)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(input)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| VideoError::Spawn {
                program: tools.ffmpeg.display().to_string(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| VideoError::SourceUnavailable {
            path: input.to_path_buf(),
            reason: "decoder has no output pipe".to_string(),
        })?;

        log::debug!(
            "Opened {} ({}x{} @ {:.3} fps, ~{} frames, codec {})",
            input.display(),
            info.width,
            info.height,
            info.fps,
            info.total_frames,
            info.codec.as_ref().map(CodecId::as_str).unwrap_or("unknown")
        );

        Ok(Self {
            frame_len: info.width as usize * info.height as usize * 3,
            info,
            child,
            stdout: BufReader::new(stdout),
            exhausted: false,
        })
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self) -> VideoResult<Option<Frame>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut buffer = vec![0u8; self.frame_len];
        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => Ok(Frame::from_raw(self.info.width, self.info.height, buffer)),
            // A truncated trailing frame ends the stream.
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.exhausted = true;
                Ok(None)
            }
            Err(e) => Err(VideoError::Read(e)),
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Encodes RGB frames into a video file.
pub struct FfmpegSink {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    resolution: (u32, u32),
}

impl FfmpegSink {
    /// Start an encoder writing `output` with `codec` at `fps`.
    pub fn create(
        tools: &FfmpegTools,
        output: &Path,
        codec: &CodecId,
        fps: f64,
        resolution: (u32, u32),
    ) -> VideoResult<Self> {
        let mut child = encoder_command(tools, codec, fps, resolution)
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| VideoError::Spawn {
                program: tools.ffmpeg.display().to_string(),
                source,
            })?;
        let stdin = child.stdin.take();
        // The encoder blocks once its stderr pipe fills, so read it as it comes.
        let stderr = child.stderr.take().map(|pipe| drain_tail(pipe, STDERR_TAIL));

        log::debug!("Encoding {} with {}", output.display(), codec);

        Ok(Self {
            child: Some(child),
            stdin,
            stderr,
            resolution,
        })
    }
}

/// Read `reader` to the end on a background thread, keeping the last `limit`
/// bytes.
fn drain_tail<R: Read + Send + 'static>(mut reader: R, limit: usize) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut tail = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    tail.extend_from_slice(&chunk[..n]);
                    if tail.len() > limit {
                        let excess = tail.len() - limit;
                        tail.drain(..excess);
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        tail
    })
}

fn encoder_command(tools: &FfmpegTools, codec: &CodecId, fps: f64, (w, h): (u32, u32)) -> Command {
    let (encoder, tag) = encoder_for(codec).unwrap_or(("mpeg4", Some("mp4v")));
    let mut command = Command::new(&tools.ffmpeg);
    command
        .args(["-v", "error", "-y", "-f", "rawvideo", "-pix_fmt", "rgb24"])
        .args(["-s", &format!("{}x{}", w, h)])
        .args(["-r", &format!("{}", fps)])
        .args(["-i", "-", "-c:v", encoder]);
    if let Some(tag) = tag {
        command.args(["-vtag", tag]);
    }
    if encoder != "rawvideo" {
        command.args(["-pix_fmt", "yuv420p"]);
    }
    command
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &Frame) -> VideoResult<()> {
        let (width, height) = self.resolution;
        if frame.dimensions() != self.resolution {
            return Err(VideoError::FrameSize {
                width,
                height,
                got_width: frame.width(),
                got_height: frame.height(),
            });
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| VideoError::Write(ErrorKind::BrokenPipe.into()))?;
        stdin.write_all(frame.as_raw()).map_err(VideoError::Write)
    }

    fn finish(&mut self) -> VideoResult<()> {
        // Closing stdin signals end of input to the encoder.
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(VideoError::Write)?;
        let stderr = self
            .stderr
            .take()
            .and_then(|drain| drain.join().ok())
            .unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(VideoError::Encoder {
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            })
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(e) = self.finish() {
                log::warn!("Encoder did not shut down cleanly: {}", e);
            }
        }
    }
}

/// Probes codecs by encoding one synthetic frame with each.
#[derive(Debug, Clone, Default)]
pub struct FfmpegCodecProbe {
    tools: FfmpegTools,
}

impl FfmpegCodecProbe {
    /// Create a probe using `tools`.
    pub fn new(tools: FfmpegTools) -> Self {
        Self { tools }
    }
}

impl CodecProbe for FfmpegCodecProbe {
    fn can_write(&self, codec: &CodecId) -> bool {
        let Some((encoder, _)) = encoder_for(codec) else {
            return false;
        };
        let status = Command::new(&self.tools.ffmpeg)
            .args(["-v", "quiet", "-nostdin", "-f", "lavfi", "-i", "color=c=black:s=64x64"])
            .args(["-frames:v", "1", "-c:v", encoder, "-f", "null", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        matches!(status, Ok(s) if s.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output_video() {
        let json = r#"{
            "streams": [
                { "codec_type": "audio", "codec_name": "aac" },
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "codec_tag_string": "avc1",
                    "codec_tag": "0x31637661",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "30000/1001",
                    "nb_frames": "240"
                }
            ],
            "format": { "duration": "8.008" }
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.resolution(), (1920, 1080));
        assert!((info.fps - 29.97).abs() < 0.01);
        assert_eq!(info.total_frames, 240);
        assert_eq!(info.codec, Some(CodecId::new("avc1")));
    }

    #[test]
    fn test_frame_count_estimated_from_duration() {
        let json = r#"{
            "streams": [
                {
                    "codec_type": "video",
                    "codec_tag": "0x0000",
                    "width": 64,
                    "height": 48,
                    "r_frame_rate": "25/1"
                }
            ],
            "format": { "duration": "4.0" }
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.total_frames, 100);
        assert_eq!(info.codec, None);
    }

    #[test]
    fn test_missing_video_stream() {
        let json = r#"{ "streams": [ { "codec_type": "audio" } ] }"#;
        assert!(parse_probe_output(json).is_err());
        assert!(parse_probe_output("not json").is_err());
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("30/1"), Some(30.0));
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("24"), Some(24.0));
    }

    #[test]
    fn test_encoder_mapping() {
        assert_eq!(encoder_for(&CodecId::new("mp4v")), Some(("mpeg4", Some("mp4v"))));
        assert_eq!(encoder_for(&CodecId::new("MJPG")), Some(("mjpeg", None)));
        assert_eq!(encoder_for(&CodecId::new("zzzz")), None);
    }

    #[test]
    fn test_drain_keeps_only_the_tail() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let tail = drain_tail(std::io::Cursor::new(data.clone()), 1000)
            .join()
            .unwrap();
        assert_eq!(tail.as_slice(), &data[data.len() - 1000..]);

        let short = drain_tail(std::io::Cursor::new(b"boom".to_vec()), 1000)
            .join()
            .unwrap();
        assert_eq!(short, b"boom");
    }

    #[test]
    fn test_probe_missing_file_is_source_unavailable() {
        let err = FfmpegTools::default()
            .probe(Path::new("/definitely/not/here.mp4"))
            .unwrap_err();
        assert!(matches!(err, VideoError::SourceUnavailable { .. }));
    }
}
