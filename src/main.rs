use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use shorts_compositor::{
    composition::{CompositionService, RandomMotion},
    config::Config,
    effects::{EffectChain, EffectsFile},
    video::{
        ComposeVideoRequest, Composer, FfmpegComposer, MediaValidator, ProcessRunner, ToolChecker,
        Validator, VideoSettings,
    },
};

#[derive(Parser)]
#[command(
    name = "shorts-compositor",
    version,
    about = "Compose vertical story videos from stills, narration and music",
    long_about = "Shorts-Compositor validates a composition manifest, fills in per-image timing and Ken Burns motion, and renders the result with ffmpeg."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the video described by a TOML manifest
    Compose {
        /// Manifest describing images, audio and output
        manifest: PathBuf,

        /// Seed for reproducible default motion
        #[arg(long)]
        seed: Option<u64>,

        /// Skip probing the rendered video
        #[arg(long)]
        no_validate: bool,
    },

    /// Print the ffmpeg filter graph for a TOML effects file
    Filter {
        effects: PathBuf,

        #[arg(long, default_value_t = 1080)]
        width: u32,

        #[arg(long, default_value_t = 1920)]
        height: u32,

        #[arg(long, default_value_t = 30)]
        fps: u32,
    },

    /// Check a rendered video against expected settings
    Validate {
        video: PathBuf,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        #[arg(long)]
        fps: Option<u32>,

        /// Expected container format (e.g. mp4)
        #[arg(long)]
        format: Option<String>,
    },

    /// Grab a single frame from a video
    Thumbnail {
        video: PathBuf,
        output: PathBuf,

        /// Offset into the video, in seconds
        #[arg(long, default_value_t = 1.0)]
        offset: f64,
    },

    /// Verify that ffmpeg and ffprobe are installed
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("Starting Shorts-Compositor v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(|e| anyhow::anyhow!(e.user_message()))?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    match cli.command {
        Command::Compose {
            manifest,
            seed,
            no_validate,
        } => compose(&config, &manifest, seed, no_validate).await,
        Command::Filter {
            effects,
            width,
            height,
            fps,
        } => filter(&effects, width, height, fps),
        Command::Validate {
            video,
            width,
            height,
            fps,
            format,
        } => {
            let defaults = config.video.clone();
            let expected = VideoSettings {
                width: width.unwrap_or(defaults.width),
                height: height.unwrap_or(defaults.height),
                fps: fps.unwrap_or(defaults.fps),
                format: format.unwrap_or(defaults.format),
                ..defaults
            };
            validate(&config, &video, &expected).await
        }
        Command::Thumbnail { video, output, offset } => {
            let offset = Duration::try_from_secs_f64(offset)
                .with_context(|| format!("invalid thumbnail offset: {}", offset))?;
            let composer = FfmpegComposer::from_config(&config);
            composer
                .generate_thumbnail(&video, &output, offset)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            info!("Thumbnail saved to: {:?}", output);
            Ok(())
        }
        Command::Check => {
            let runner = Arc::new(ProcessRunner::with_timeout(config.tools.timeout()));
            let report = ToolChecker::from_config(&config, runner)
                .check_all()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("ffmpeg:  {} ({})", report.ffmpeg_version, report.ffmpeg_path.display());
            println!("ffprobe: {} ({})", report.ffprobe_version, report.ffprobe_path.display());
            Ok(())
        }
    }
}

async fn compose(config: &Config, manifest: &Path, seed: Option<u64>, no_validate: bool) -> Result<()> {
    let request = load_manifest(config, manifest)?;

    let runner = Arc::new(ProcessRunner::with_timeout(config.tools.timeout()));
    let validator = Arc::new(MediaValidator::from_config(config, runner));
    let motion = RandomMotion::new(seed.or(config.motion.seed));

    let service = CompositionService::new(Arc::new(FfmpegComposer::from_config(config)), validator.clone())
        .with_motion(Box::new(motion))
        .with_config(config.composition.clone());

    info!("Starting composition process...");
    let response = service
        .compose_video(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if config.composition.validate_output && !no_validate {
        let result = validator
            .validate_video(&response.output_path, &request.settings)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
        if !result.is_valid {
            bail!(
                "rendered video does not match the requested settings: {}",
                result.errors.join("; ")
            );
        }
    }

    info!(
        "Composition complete! Output saved to: {:?} ({:.2}s, {} bytes)",
        response.output_path,
        response.duration.as_secs_f64(),
        response.file_size
    );
    if let Some(thumbnail) = &response.thumbnail_path {
        info!("Thumbnail saved to: {:?}", thumbnail);
    }
    Ok(())
}

/// Parse a manifest, taking output settings from the config when it has none
fn load_manifest(config: &Config, path: &Path) -> Result<ComposeVideoRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {:?}", path))?;
    let table: toml::Table =
        toml::from_str(&content).with_context(|| format!("failed to parse manifest {:?}", path))?;
    let has_settings = table.contains_key("settings");

    let mut request: ComposeVideoRequest = table
        .try_into()
        .with_context(|| format!("invalid manifest {:?}", path))?;
    if !has_settings {
        request.settings = config.video.clone();
    }
    Ok(request)
}

fn filter(path: &Path, width: u32, height: u32, fps: u32) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read effects file {:?}", path))?;
    let file = EffectsFile::from_toml(&content)
        .with_context(|| format!("failed to parse effects file {:?}", path))?;

    if file.effects.is_empty() {
        warn!("No effects in {:?}", path);
    }

    let graph = EffectChain::new()
        .build_from_specs(&file.effects, width, height, fps)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!("{}", graph);
    Ok(())
}

async fn validate(config: &Config, video: &Path, expected: &VideoSettings) -> Result<()> {
    let runner = Arc::new(ProcessRunner::with_timeout(config.tools.timeout()));
    let validator = MediaValidator::from_config(config, runner);

    let result = validator
        .validate_video(video, expected)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!(
        "{}x{} {} {:.2}s {} bytes",
        result.width,
        result.height,
        result.format,
        result.duration.as_secs_f64(),
        result.file_size
    );

    if !result.is_valid {
        for error in &result.errors {
            println!("  - {}", error);
        }
        bail!("{:?} failed validation", video);
    }

    info!("{:?} matches the expected settings", video);
    Ok(())
}
