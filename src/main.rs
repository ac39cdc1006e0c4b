use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};

use aurafilm::{
    config::Config,
    params::{ParamStore, Params, PresetRegistry},
    session::LiveSession,
    video::{FrameSource, ImageSequenceSource, RecordingOutput, TestPatternSource},
};

/// Frames rendered from the test pattern when no limit is given
const DEFAULT_PATTERN_FRAMES: u64 = 90;

#[derive(Parser)]
#[command(
    name = "aurafilm",
    version,
    about = "Real-time analog film emulation",
    long_about = "AuraFilm runs frames through a film emulation chain (tone curve, grain, halation, bloom, chromatic aberration, flicker, gate weave and vignette) and exports stills and recordings."
)]
struct Cli {
    /// Image file or directory of images (defaults to a moving test pattern)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for photos and recordings
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Film look to apply
    #[arg(short, long)]
    preset: Option<String>,

    /// Additional directory of user presets
    #[arg(long)]
    preset_dir: Option<PathBuf>,

    /// Number of frames to process
    #[arg(short, long)]
    frames: Option<u64>,

    /// Processing width
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Processing height
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Regenerate grain from the live noise stream
    #[arg(long)]
    live_grain: bool,

    /// Record the processed frames to a video
    #[arg(long)]
    record: bool,

    /// Save the last processed frame as a photo
    #[arg(long)]
    photo: bool,

    /// Save the resulting look as a user preset with this name
    #[arg(long)]
    save_preset: Option<String>,

    /// List available presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Configuration file (defaults to ~/.aurafilm/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("Starting AuraFilm v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Config::from_file(path)?
        }
        None => Config::load_or_default(Config::default_path()),
    };

    let mut registry = PresetRegistry::new();
    let preset_dirs = config.presets.user_dir.iter().chain(cli.preset_dir.iter());
    for dir in preset_dirs {
        let loaded = registry.load_dir(dir)?;
        info!("Loaded {} presets from {:?}", loaded, dir);
    }

    if cli.list_presets {
        for name in registry.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let preset_name = cli.preset.as_deref().unwrap_or(&config.presets.last_preset);
    let preset = registry
        .require(preset_name)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let mut params = Params::default();
    params.resolution.width = cli.width.unwrap_or(config.capture.width);
    params.resolution.height = cli.height.unwrap_or(config.capture.height);
    params.grain.lock = !cli.live_grain;
    preset.apply_to(&mut params);

    info!(
        "Preset: {} at {}x{}",
        params.preset_name, params.resolution.width, params.resolution.height
    );

    let max_frames = cli
        .frames
        .or((config.capture.max_frames > 0).then_some(config.capture.max_frames));

    let source: Box<dyn FrameSource> = match &cli.input {
        Some(path) => {
            let source =
                ImageSequenceSource::open(path).map_err(|e| anyhow::anyhow!(e.user_message()))?;
            // A still image only repeats when a frame count was asked for.
            let looping = source.len() == 1 && max_frames.is_some();
            Box::new(source.looping(looping))
        }
        None => {
            let frames = max_frames.unwrap_or(DEFAULT_PATTERN_FRAMES);
            Box::new(
                TestPatternSource::new(params.resolution.width, params.resolution.height)?
                    .with_limit(frames),
            )
        }
    };

    let store = Arc::new(ParamStore::default());
    let mut session = LiveSession::new(Arc::clone(&store), source);
    session.load_params(params)?;
    let output_dir = cli.output.clone().unwrap_or_else(|| config.export.captures_dir.clone());

    if cli.record {
        let path = session.start_recording(
            &output_dir,
            config.capture.fps,
            &config.export.video_codec,
            config.export.keep_frames,
        )?;
        info!("Recording to {:?}", path);
    }

    let processed = session.run(max_frames)?;
    if processed == 0 {
        warn!("No frames were processed");
    }

    if cli.photo {
        let path = session.capture_photo(&output_dir, &config.export.photo_format)?;
        info!("Photo captured: {:?}", path);
    }

    if cli.record {
        match session.stop_recording().await {
            Ok(RecordingOutput::Video { path, frame_count }) => {
                info!("Recording complete: {:?} ({} frames)", path, frame_count);
            }
            Ok(RecordingOutput::Frames { dir, frame_count }) => {
                warn!("Encoder unavailable; {} frames kept in {:?}", frame_count, dir);
            }
            Err(e) => return Err(anyhow::anyhow!(e.user_message())),
        }
    }

    if let Some(name) = &cli.save_preset {
        let dir = cli
            .preset_dir
            .clone()
            .or_else(|| config.presets.user_dir.clone())
            .unwrap_or_else(|| Config::default_path().with_file_name("presets"));
        let path = registry.save_user_preset(&dir, name, &store.snapshot())?;
        info!("Preset '{}' saved to {:?}", name, path);
    }

    Ok(())
}
