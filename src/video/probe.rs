//! Field extraction from ffprobe/ffmpeg text output
//!
//! ffprobe's JSON is only scanned for the handful of fields we need, so a
//! partially malformed document still yields whatever could be found.

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""duration":\s*"([^"]+)""#).expect("valid duration regex"));
static WIDTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""width":\s*(\d+)"#).expect("valid width regex"));
static HEIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""height":\s*(\d+)"#).expect("valid height regex"));
static FRAME_RATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""r_frame_rate":\s*"(\d+)/(\d+)""#).expect("valid frame rate regex")
});
static FORMAT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""format_name":\s*"([^"]+)""#).expect("valid format regex"));
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(ffmpeg|ffprobe) version ([^\s]+)").expect("valid version regex"));

/// Properties of a rendered video as reported by ffprobe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoProperties {
    pub width: u32,
    pub height: u32,
    pub duration: Duration,
    /// Integer frames per second, 0 when unknown
    pub fps: u32,
    pub format: String,
}

/// First `"duration": "<secs>"` value in the output
pub fn parse_duration(output: &str) -> Option<Duration> {
    let captures = DURATION_RE.captures(output)?;
    let secs: f64 = captures[1].trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Extract video properties; missing fields stay at their defaults
///
/// The container format comes from `format_name` (any muxer list naming mp4
/// counts as mp4), falling back to the file extension.
pub fn parse_video_properties(output: &str, path: &Path) -> VideoProperties {
    let number = |re: &Regex| -> u32 {
        re.captures(output)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0)
    };

    let fps = FRAME_RATE_RE
        .captures(output)
        .and_then(|c| {
            let num: u32 = c[1].parse().ok()?;
            let den: u32 = c[2].parse().ok()?;
            (den > 0).then(|| num / den)
        })
        .unwrap_or(0);

    let format = FORMAT_NAME_RE
        .captures(output)
        .map(|c| {
            let names = &c[1];
            if names.split(',').any(|name| name == "mp4") {
                "mp4".to_string()
            } else {
                names.split(',').next().unwrap_or(names).to_string()
            }
        })
        .or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_lowercase())
        })
        .unwrap_or_default();

    VideoProperties {
        width: number(&WIDTH_RE),
        height: number(&HEIGHT_RE),
        duration: parse_duration(output).unwrap_or_default(),
        fps,
        format,
    }
}

/// Version token following "<tool> version" in a `-version` banner
pub fn parse_version(output: &str, tool: &str) -> Option<String> {
    VERSION_RE
        .captures_iter(output)
        .find(|c| &c[1] == tool)
        .map(|c| c[2].to_string())
}
