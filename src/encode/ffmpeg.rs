//! Video assembly through the system `ffmpeg` and `ffprobe` binaries.
//!
//! A card and its narration become an MP4: the still image is looped for the audio duration and
//! encoded as yuv420p H.264 with AAC audio.

use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Stdio},
};

use tracing::{debug, info};

use crate::{
    config::VideoConfig,
    foundation::error::{CardcastError, CardcastResult},
};

pub fn is_ffmpeg_on_path() -> bool {
    tool_runs("ffmpeg")
}

pub fn is_ffprobe_on_path() -> bool {
    tool_runs("ffprobe")
}

fn tool_runs(name: &str) -> bool {
    Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> CardcastResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    format: Option<ProbeFormat>,
}

/// Parse the container duration out of `ffprobe -print_format json` output.
pub fn parse_probe_duration(json: &[u8]) -> CardcastResult<f64> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| CardcastError::encode(format!("ffprobe json parse failed: {e}")))?;
    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or_else(|| CardcastError::encode("ffprobe reported no duration"))?;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CardcastError::encode(format!(
            "ffprobe reported invalid duration {duration}"
        )));
    }
    Ok(duration)
}

/// Duration of a media file in seconds.
pub fn probe_duration(path: &Path) -> CardcastResult<f64> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| CardcastError::encode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(CardcastError::encode(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    let duration = parse_probe_duration(&out.stdout)?;
    debug!(path = %path.display(), duration, "probed media duration");
    Ok(duration)
}

/// Command-line arguments for [`mux_still_image`], without the program name.
pub fn mux_args(
    image: &Path,
    audio: &Path,
    duration_secs: f64,
    out: &Path,
    cfg: &VideoConfig,
) -> CardcastResult<Vec<OsString>> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(CardcastError::validation(format!(
            "video duration must be finite and > 0, got {duration_secs}"
        )));
    }
    if cfg.fps == 0 {
        return Err(CardcastError::validation("video fps must be non-zero"));
    }
    if cfg.threads == Some(0) {
        return Err(CardcastError::validation("video threads must be non-zero"));
    }

    let fps = cfg.fps.to_string();
    let mut args: Vec<OsString> = Vec::with_capacity(40);
    let mut push = |items: &[&str]| args.extend(items.iter().map(OsString::from));

    push(&[if cfg.overwrite { "-y" } else { "-n" }, "-loglevel", "error"]);
    push(&["-loop", "1", "-framerate", &fps, "-i"]);
    args.push(image.as_os_str().to_owned());
    args.push("-i".into());
    args.push(audio.as_os_str().to_owned());

    let mut push = |items: &[&str]| args.extend(items.iter().map(OsString::from));
    push(&[
        "-t",
        &format!("{duration_secs:.3}"),
        "-c:v",
        &cfg.video_codec,
        "-preset",
        &cfg.preset,
        "-tune",
        "stillimage",
        "-b:v",
        &cfg.video_bitrate,
        "-pix_fmt",
        "yuv420p",
        "-r",
        &fps,
        "-c:a",
        &cfg.audio_codec,
        "-b:a",
        &cfg.audio_bitrate,
        "-shortest",
        "-movflags",
        "+faststart",
    ]);
    if let Some(max) = cfg.max_dimension {
        // Shrink only; both sides stay even for yuv420p.
        push(&[
            "-vf",
            &format!(
                "scale=w='min(iw,{max})':h='min(ih,{max})':force_original_aspect_ratio=decrease:force_divisible_by=2"
            ),
        ]);
    }
    if let Some(threads) = cfg.threads {
        push(&["-threads", &threads.to_string()]);
    }
    args.push(out.as_os_str().to_owned());
    Ok(args)
}

/// Encode `image` looped for `duration_secs` with `audio` into `out`.
///
/// A failed run removes whatever partial output ffmpeg left behind.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(out = %out.display(), duration_secs = duration_secs)
)]
pub fn mux_still_image(
    image: &Path,
    audio: &Path,
    duration_secs: f64,
    out: &Path,
    cfg: &VideoConfig,
) -> CardcastResult<()> {
    let args = mux_args(image, audio, duration_secs, out, cfg)?;
    for (what, p) in [("image", image), ("audio", audio)] {
        if !p.is_file() {
            return Err(CardcastError::validation(format!(
                "{what} input '{}' does not exist",
                p.display()
            )));
        }
    }
    if !cfg.overwrite && out.exists() {
        return Err(CardcastError::validation(format!(
            "output file '{}' already exists",
            out.display()
        )));
    }
    ensure_parent_dir(out)?;

    if !is_ffmpeg_on_path() {
        return Err(CardcastError::encode(
            "ffmpeg is required for MP4 encoding, but was not found on PATH",
        ));
    }

    let output = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            CardcastError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

    if !output.status.success() {
        let _ = std::fs::remove_file(out);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CardcastError::encode(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    info!(out = %out.display(), duration_secs, "video muxed");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
