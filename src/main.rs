//! ringfx - headless renderer and viewer for ring particle effects
//!
//! # Commands
//!
//! - `ringfx list` - List path and ring presets
//! - `ringfx render` - Render frames of a preset to numbered PNGs
//! - `ringfx export` - Write a catalog preset as JSON for hand editing
//! - `ringfx view` - Open a live window (feature `viewer`)
//!
//! # Usage
//!
//! ```bash
//! # 120 frames of the embers preset, one breath cycle per 14 s
//! ringfx render embers-03 --frames 120 --breath --out frames/
//!
//! # Render from a saved engine config
//! ringfx render --config prana.json --out frames/
//!
//! # Tweak a preset by hand, then render it
//! ringfx export meteor-shower-06 --out meteor.json
//! ringfx render --preset-file meteor.json
//! ```
//!
//! Logging follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ringfx::prelude::*;

const DARK_BACKGROUND: Rgb = Rgb::new(10, 10, 18);
const LIGHT_BACKGROUND: Rgb = Rgb::new(245, 240, 230);

/// ringfx - breath-synchronized ring particle effects
#[derive(Parser)]
#[command(name = "ringfx")]
#[command(about = "Render breath-synchronized ring particle effects")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List path and ring presets
    List(ListArgs),

    /// Render frames of a preset to numbered PNG files
    Render(RenderArgs),

    /// Write a catalog preset as JSON
    Export(ExportArgs),

    /// Open a live window
    #[cfg(feature = "viewer")]
    View(ViewArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Candidate,
    Final,
}

impl From<StatusArg> for PresetStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Candidate => PresetStatus::Candidate,
            StatusArg::Final => PresetStatus::Final,
        }
    }
}

#[derive(Args)]
struct ListArgs {
    /// Only ring presets with this status
    #[arg(long, value_enum)]
    status: Option<StatusArg>,

    /// Only ring presets in this category
    #[arg(long)]
    category: Option<String>,
}

/// Inputs shared by `render` and `view`.
#[derive(Args)]
struct EngineArgs {
    /// Path id or ring preset id
    preset: Option<String>,

    /// Engine config JSON; other flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Preset JSON used instead of a catalog preset
    #[arg(long, conflicts_with = "preset")]
    preset_file: Option<PathBuf>,

    /// Canvas side length in pixels
    #[arg(long)]
    size: Option<f32>,

    /// Breath phase name (inhale, holdTop, exhale, holdBottom, rest)
    #[arg(long)]
    phase: Option<String>,

    /// Global opacity and glow in [0, 1]
    #[arg(long)]
    intensity: Option<f32>,

    /// Accent color as #rrggbb
    #[arg(long)]
    accent: Option<String>,

    /// Invert colors for a light background
    #[arg(long)]
    light: bool,

    /// Cycle the default 4-4-4-2 breath pattern
    #[arg(long)]
    breath: bool,

    /// Seed for deterministic output
    #[arg(long)]
    seed: Option<u64>,
}

impl EngineArgs {
    fn to_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EngineConfig::default(),
        };

        if let Some(name) = &self.preset {
            config.source = PresetSource::Named(name.clone());
        }
        if let Some(path) = &self.preset_file {
            let preset = Preset::load(path)
                .with_context(|| format!("Failed to load preset {}", path.display()))?;
            config.source = preset.into();
        }
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(phase) = &self.phase {
            config.phase = phase.clone();
        }
        if let Some(intensity) = self.intensity {
            config.intensity = intensity;
        }
        if let Some(accent) = &self.accent {
            config.accent_color = accent.clone();
        }
        if self.light {
            config.is_light = true;
        }
        if self.breath && config.breath.is_none() {
            config.breath = Some(BreathPattern::default());
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.is_active = true;
        Ok(config)
    }
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Simulated frames per second
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Write every Nth frame
    #[arg(long, default_value_t = 1)]
    every: u32,

    /// Output directory
    #[arg(long, short, default_value = "frames")]
    out: PathBuf,

    /// Keep the background transparent
    #[arg(long)]
    transparent: bool,
}

#[derive(Args)]
struct ExportArgs {
    /// Path id or ring preset id
    preset: String,

    /// Output JSON file
    #[arg(long, short)]
    out: PathBuf,
}

#[cfg(feature = "viewer")]
#[derive(Args)]
struct ViewArgs {
    #[command(flatten)]
    engine: EngineArgs,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List(args) => list(args),
        Commands::Render(args) => render(args),
        Commands::Export(args) => export(args),
        #[cfg(feature = "viewer")]
        Commands::View(args) => {
            let config = args.engine.to_config()?;
            ringfx::viewer::run(config).map_err(|e| anyhow::anyhow!("{}", e))
        }
    }
}

fn list(args: ListArgs) -> Result<()> {
    if args.status.is_none() && args.category.is_none() {
        println!("Path presets:");
        for preset in registry::path_presets_all() {
            println!(
                "  {} {:<10} {:<24} {} / {}",
                preset.symbol.as_deref().unwrap_or(" "),
                preset.id,
                preset.name,
                preset.particle_type,
                preset.motion_pattern
            );
            if let Some(description) = &preset.description {
                println!("      {}", description);
            }
        }
        println!();
    }

    println!("Ring presets:");
    let status = args.status.map(PresetStatus::from);
    for preset in registry::presets(status) {
        if let Some(category) = &args.category {
            if preset.category.as_deref() != Some(category.as_str()) {
                continue;
            }
        }
        println!(
            "  {:<22} {:<24} {:<12} {}",
            preset.id,
            preset.name,
            preset.category.as_deref().unwrap_or("-"),
            preset.status.map_or("-", PresetStatus::as_str)
        );
    }

    if args.category.is_none() {
        println!();
        println!("Categories: {}", registry::categories().join(", "));
    }
    Ok(())
}

fn render(args: RenderArgs) -> Result<()> {
    let config = args.engine.to_config()?;
    let size = (config.canvas_size().round() as u32).max(1);
    let background = match (args.transparent, config.is_light) {
        (true, _) => None,
        (false, true) => Some(LIGHT_BACKGROUND),
        (false, false) => Some(DARK_BACKGROUND),
    };
    let every = args.every.max(1);
    let frame_ms = 1000.0 / args.fps.max(1.0);

    std::fs::create_dir_all(&args.out).map_err(ExportError::from)?;

    let mut engine = ParticleEngine::new(config);
    let mut canvas = RasterCanvas::new(size, size);

    log::info!(
        "Rendering {} frames of '{}' at {}x{} to {}",
        args.frames,
        engine.preset().id,
        size,
        size,
        args.out.display()
    );

    let mut written = 0;
    for i in 0..args.frames {
        engine.frame(i as f64 * frame_ms, &mut canvas);
        if i % every == 0 {
            let path = args.out.join(format!("frame_{:05}.png", i));
            canvas.save_png(&path, background)?;
            written += 1;
        }
    }

    log::info!(
        "Wrote {} frames ({:.1}s simulated, final phase {})",
        written,
        engine.time(),
        engine.phase().map_or("unknown", BreathPhase::as_str)
    );
    Ok(())
}

fn export(args: ExportArgs) -> Result<()> {
    let source = PresetSource::Named(args.preset.clone());
    let preset = registry::resolve(&source);
    if !preset.id.eq_ignore_ascii_case(&args.preset) {
        log::warn!("'{}' is not in the catalog, exporting '{}'", args.preset, preset.id);
    }
    preset
        .save(&args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    log::info!("Exported '{}' to {}", preset.id, args.out.display());
    Ok(())
}
