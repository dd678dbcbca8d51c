use clap::{Parser, Subcommand};
use nexus_common::{LogicalSize, PhysicalSize};
use nexus_render::{DrawCommand, RecordingSurface, Surface};
use nexus_runtime::{BackgroundEngine, RefreshScheduler, ResizeNotifier};
use nexus_scene::{Scene, SceneConfig};
use serde::Serialize;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nexus-cli", about = "Headless tool for the nexus background")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Check a scene configuration file
    Validate {
        /// Scene configuration file (YAML)
        path: PathBuf,
    },
    /// Run the engine against an in-memory surface and dump the last frame
    Trace {
        /// Number of display refreshes to run
        #[arg(short, long, default_value = "1")]
        frames: u64,
        /// Logical width of the surface
        #[arg(long, default_value = "800")]
        width: f64,
        /// Logical height of the surface
        #[arg(long, default_value = "450")]
        height: f64,
        /// Device pixel ratio
        #[arg(long, default_value = "1.0")]
        scale: f64,
        /// Scene configuration file (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct TraceReport {
    frames_presented: u64,
    /// Frame counter after the run.
    clock: Option<u64>,
    logical: LogicalSize,
    buffer: PhysicalSize,
    commands: Vec<DrawCommand>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    Ok(match path {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    })
}

fn trace(config: SceneConfig, frames: u64, logical: LogicalSize, scale: f64) -> TraceReport {
    let scheduler = Rc::new(RefreshScheduler::new());
    let resize = Rc::new(ResizeNotifier::new());
    let surface = Rc::new(RefCell::new(RecordingSurface::new(logical, scale)));

    let mut engine = BackgroundEngine::new(Scene::new(config), scheduler.clone(), resize);
    engine.attach_surface(&surface);
    engine.set_active(true);
    for _ in 0..frames {
        scheduler.on_refresh();
    }
    let clock = engine.clock();
    engine.teardown();

    let surface = surface.borrow();
    TraceReport {
        frames_presented: surface.frames_presented(),
        clock,
        logical,
        buffer: surface.buffer_size(),
        commands: surface.last_frame().to_vec(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so trace output on stdout stays machine-readable.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("nexus-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", nexus_common::crate_info());
            println!("render: {}", nexus_render::crate_info());
            println!("scene: {}", nexus_scene::crate_info());
            println!("runtime: {}", nexus_runtime::crate_info());
            println!("render-wgpu: {}", nexus_render_wgpu::crate_info());
        }
        Commands::Validate { path } => {
            let config = SceneConfig::load(&path)?;
            tracing::debug!(path = %path.display(), "config is valid");
            println!(
                "{}: ok ({} orbs, grid cell {})",
                path.display(),
                config.orbs.count,
                config.grid.cell_size
            );
        }
        Commands::Trace {
            frames,
            width,
            height,
            scale,
            config,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let report = trace(config, frames, LogicalSize::new(width, height), scale);
            tracing::info!(
                frames = report.frames_presented,
                commands = report.commands.len(),
                "trace finished"
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "frames={} clock={} logical={}x{} buffer={}x{}",
                    report.frames_presented,
                    report
                        .clock
                        .map_or_else(|| "idle".to_string(), |t| t.to_string()),
                    report.logical.width,
                    report.logical.height,
                    report.buffer.width,
                    report.buffer.height
                );
                for cmd in &report.commands {
                    println!("  {cmd}");
                }
            }
        }
    }

    Ok(())
}
