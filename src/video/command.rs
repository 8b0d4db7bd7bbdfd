//! ffmpeg/ffprobe argument lists
//!
//! Everything here is pure: the composer decides which form to run and hands
//! the resulting arguments to a [`CommandRunner`](super::runner::CommandRunner).

use std::path::Path;
use std::time::Duration;

use crate::effects::KenBurnsEffect;
use crate::error::Result;
use crate::video::types::{ImageFrame, VideoSettings};

/// Encoder flags shared by every render
fn encoder_args(args: &mut Vec<String>) {
    args.extend(
        ["-c:v", "libx264", "-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
            .iter()
            .map(|s| s.to_string()),
    );
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Loop a single still for the length of the audio (or `duration` without audio)
pub fn single_image_args(
    image: &Path,
    audio: Option<&Path>,
    settings: &VideoSettings,
    duration: Duration,
    output: &Path,
) -> Vec<String> {
    let mut args = vec!["-loop".to_string(), "1".to_string(), "-i".to_string(), path_arg(image)];

    if let Some(audio) = audio {
        args.push("-i".to_string());
        args.push(path_arg(audio));
    }

    encoder_args(&mut args);
    args.push("-vf".to_string());
    args.push(format!("scale={}:{}", settings.width, settings.height));
    args.push("-r".to_string());
    args.push(settings.fps.to_string());

    match audio {
        Some(_) => {
            args.push("-c:a".to_string());
            args.push("aac".to_string());
            args.push("-b:a".to_string());
            args.push(settings.audio_bitrate.clone());
            args.push("-shortest".to_string());
        }
        None => {
            args.push("-t".to_string());
            args.push(format!("{:.2}", duration.as_secs_f64()));
        }
    }

    args.push("-y".to_string());
    args.push(path_arg(output));
    args
}

/// Inputs for a multi-image render
#[derive(Debug, Clone, Copy)]
pub struct MultiImageInputs<'a> {
    pub images: &'a [ImageFrame],
    pub narration: Option<&'a Path>,
    pub background_music: Option<&'a Path>,
    pub settings: &'a VideoSettings,
    /// Animate each still with its Ken Burns settings
    pub ken_burns: bool,
}

/// Scale, letterbox and concatenate every still, mixing audio when there are
/// two tracks
pub fn multi_image_args(inputs: &MultiImageInputs<'_>, output: &Path) -> Result<Vec<String>> {
    let settings = inputs.settings;
    let (w, h) = (settings.width, settings.height);
    let mut args = Vec::new();

    for image in inputs.images {
        if !inputs.ken_burns {
            args.push("-loop".to_string());
            args.push("1".to_string());
            args.push("-t".to_string());
            args.push(format!("{:.2}", image.duration.as_secs_f64()));
        }
        args.push("-i".to_string());
        args.push(path_arg(&image.path));
    }

    let audio_index = inputs.images.len();
    for track in [inputs.narration, inputs.background_music].into_iter().flatten() {
        args.push("-i".to_string());
        args.push(path_arg(track));
    }

    let ken_burns = KenBurnsEffect::new();
    let mut filters = Vec::with_capacity(inputs.images.len() + 2);
    for (i, image) in inputs.images.iter().enumerate() {
        let mut stage = format!(
            "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1",
        );

        if inputs.ken_burns {
            let config = image.ken_burns.unwrap_or_default();
            let params = ken_burns.calculate_parameters(&config, image.duration)?;
            stage.push(',');
            stage.push_str(&ken_burns.generate_filter_expression(&params, w, h));
            stage.push_str(&format!(
                ",fps={},trim=duration={:.2},setpts=PTS-STARTPTS",
                settings.fps,
                image.duration.as_secs_f64()
            ));
        }

        stage.push_str(&format!("[v{}]", i));
        filters.push(stage);
    }

    let concat_inputs: String = (0..inputs.images.len()).map(|i| format!("[v{}]", i)).collect();
    filters.push(format!(
        "{}concat=n={}:v=1:a=0[outv]",
        concat_inputs,
        inputs.images.len()
    ));

    let mixed = inputs.narration.is_some() && inputs.background_music.is_some();
    if mixed {
        filters.push(format!(
            "[{}:a]volume={:.2}[a1];[{}:a]volume={:.2}[a2];[a1][a2]amix=inputs=2:duration=longest[outa]",
            audio_index,
            settings.narration_volume,
            audio_index + 1,
            settings.background_music_volume
        ));
    }

    args.push("-filter_complex".to_string());
    args.push(filters.join(";"));
    args.push("-map".to_string());
    args.push("[outv]".to_string());

    let has_audio = inputs.narration.is_some() || inputs.background_music.is_some();
    if mixed {
        args.push("-map".to_string());
        args.push("[outa]".to_string());
    } else if has_audio {
        // a single track is mapped straight from its input
        args.push("-map".to_string());
        args.push(format!("{}:a", audio_index));
    }

    encoder_args(&mut args);
    args.push("-r".to_string());
    args.push(settings.fps.to_string());

    if has_audio {
        args.push("-c:a".to_string());
        args.push("aac".to_string());
        args.push("-b:a".to_string());
        args.push(settings.audio_bitrate.clone());
    }

    args.push("-y".to_string());
    args.push(path_arg(output));
    Ok(args)
}

/// Grab one frame at `offset`
pub fn thumbnail_args(video: &Path, offset: Duration, output: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        path_arg(video),
        "-ss".to_string(),
        format!("{:.2}", offset.as_secs_f64()),
        "-vframes".to_string(),
        "1".to_string(),
        "-q:v".to_string(),
        "2".to_string(),
        "-y".to_string(),
        path_arg(output),
    ]
}

/// Container-level probe; output carries `"duration": "<secs>"`
pub fn duration_probe_args(path: &Path) -> Vec<String> {
    ["-v", "quiet", "-print_format", "json", "-show_format"]
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(path_arg(path)))
        .collect()
}

/// Container and stream probe used to validate a rendered video
pub fn video_probe_args(path: &Path) -> Vec<String> {
    ["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"]
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(path_arg(path)))
        .collect()
}

/// Minimal structural probe for an audio file
pub fn audio_probe_args(path: &Path) -> Vec<String> {
    ["-v", "error", "-show_entries", "format=duration", "-of", "csv=p=0"]
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(path_arg(path)))
        .collect()
}
