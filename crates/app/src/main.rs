use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use music_fx_core::{
    AppConfig, AudioFeatures, BackgroundRenderer, EffectClip, EnergyProfile, FxError,
};
use tracing_subscriber::EnvFilter;

fn main() -> music_fx_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            features,
            theme,
            duration,
            config,
            seed,
            frames_dir,
        } => run_render(
            &features,
            &theme,
            duration,
            config.as_deref(),
            seed,
            frames_dir.as_deref(),
        ),
        Commands::Profile {
            samples,
            frame_length,
            hop_length,
        } => run_profile(&samples, frame_length, hop_length),
    }
}

fn run_render(
    features: &Path,
    theme: &str,
    duration: Option<f32>,
    config: Option<&Path>,
    seed: Option<u64>,
    frames_dir: Option<&Path>,
) -> music_fx_core::Result<()> {
    tracing::info!(?features, theme, ?duration, "rendering background");

    let mut config = match config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(seed) = seed {
        config.render.seed = seed;
    }

    let features = AudioFeatures::load(features)?;
    let renderer = BackgroundRenderer::new(config)?;
    let clip = renderer.render(duration, theme, &features)?;

    println!("{}", serde_json::to_string_pretty(&clip.info())?);

    if let Some(dir) = frames_dir {
        write_frames(&clip, dir)?;
    }
    Ok(())
}

fn write_frames(clip: &EffectClip, dir: &Path) -> music_fx_core::Result<()> {
    std::fs::create_dir_all(dir)?;
    for (index, frame) in clip.frames().iter().enumerate() {
        let path = dir.join(format!("frame_{index:05}.png"));
        image::save_buffer(
            &path,
            frame.pixels(),
            frame.width(),
            frame.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|err| FxError::msg(format!("failed to write {}: {err}", path.display())))?;
    }
    tracing::info!(?dir, frames = clip.len(), "wrote frames");
    Ok(())
}

fn run_profile(
    samples: &Path,
    frame_length: usize,
    hop_length: usize,
) -> music_fx_core::Result<()> {
    tracing::info!(?samples, frame_length, hop_length, "computing energy profile");

    let contents = std::fs::read_to_string(samples)?;
    let samples: Vec<f32> = serde_json::from_str(&contents)?;
    let profile = EnergyProfile::compute(&samples, frame_length, hop_length)?;

    println!("{}", serde_json::to_string(&profile)?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive procedural background renderer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a themed background from pre-computed audio features.
    Render {
        /// JSON file with sample rate, duration, energy profile and sync points.
        #[arg(short, long)]
        features: PathBuf,
        /// One of realistic, animated, abstract or cinematic.
        #[arg(short, long, default_value = "abstract")]
        theme: String,
        /// Clip length in seconds; defaults to the audio duration.
        #[arg(short, long)]
        duration: Option<f32>,
        /// Optional JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Overrides the configured random seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Directory to write numbered PNG frames into.
        #[arg(long)]
        frames_dir: Option<PathBuf>,
    },
    /// Compute a normalised energy profile from a JSON array of samples.
    Profile {
        /// JSON file containing an array of mono samples.
        samples: PathBuf,
        #[arg(long, default_value_t = 2048)]
        frame_length: usize,
        #[arg(long, default_value_t = 512)]
        hop_length: usize,
    },
}
