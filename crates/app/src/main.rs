use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sounddeck_core::{
    AppConfig, ManualFrameTiming, MediaHandle, MediaId, RenderSurface, SoundDeckError, Visualizer,
};
use tracing_subscriber::EnvFilter;

const SURFACE_WIDTH: u32 = 800;
const SURFACE_HEIGHT: u32 = 400;
const SAMPLE_RATE: f32 = 48_000.0;

fn main() -> sounddeck_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            frames,
            fft_size,
            tone_hz,
        } => run_demo(frames, fft_size, tone_hz),
        Commands::Export { output, frames } => run_export(&output, frames),
    }
}

/// Feeds a synthesized tone through the full pipeline, pumping the frame
/// loop by hand the way the dashboard's render host would.
fn run_demo(frames: u32, fft_size: usize, tone_hz: f32) -> sounddeck_core::Result<()> {
    tracing::info!(frames, fft_size, tone_hz, "starting demo");

    let (mut visualizer, timing) = build_visualizer(fft_size)?;
    let handle = MediaHandle::new(MediaId(1));

    visualizer.resume_audio();
    visualizer.start_visualization(&handle)?;

    let mut phase = 0.0_f32;
    for frame in 0..frames {
        handle.push_samples(&tone_block(&mut phase, tone_hz, fft_size))?;
        if let Some(id) = timing.next_due() {
            visualizer.on_frame(id);
        }
        if let Some(surface) = visualizer.surface() {
            tracing::debug!(frame, commands = surface.commands().len(), "rendered frame");
        }
    }

    visualizer.stop_visualization();
    tracing::info!(frames, "demo finished");
    Ok(())
}

/// Renders a handful of frames and writes the final frame's draw commands as
/// JSON, for inspecting what a host would rasterize.
fn run_export(output: &PathBuf, frames: u32) -> sounddeck_core::Result<()> {
    tracing::info!(?output, frames, "exporting a rendered frame");

    let (mut visualizer, timing) = build_visualizer(AppConfig::default().analyzer.fft_size)?;
    let handle = MediaHandle::new(MediaId(1));

    visualizer.resume_audio();
    visualizer.start_visualization(&handle)?;

    let mut phase = 0.0_f32;
    for _ in 0..frames {
        handle.push_samples(&tone_block(&mut phase, 440.0, 256))?;
        if let Some(id) = timing.next_due() {
            visualizer.on_frame(id);
        }
    }
    visualizer.stop_visualization();

    let surface = visualizer.surface().ok_or(SoundDeckError::SurfaceMissing)?;
    std::fs::write(output, surface.to_json()?)?;
    tracing::info!(?output, "frame exported");
    Ok(())
}

fn build_visualizer(fft_size: usize) -> sounddeck_core::Result<(Visualizer, ManualFrameTiming)> {
    let mut config = AppConfig::default();
    config.analyzer.fft_size = fft_size;

    let timing = ManualFrameTiming::default();
    let mut visualizer = Visualizer::new(config, Box::new(timing.clone()))?;
    visualizer.attach_surface(RenderSurface::new(SURFACE_WIDTH, SURFACE_HEIGHT)?);
    Ok((visualizer, timing))
}

fn tone_block(phase: &mut f32, hz: f32, len: usize) -> Vec<f32> {
    let step = 2.0 * std::f32::consts::PI * hz / SAMPLE_RATE;
    (0..len)
        .map(|_| {
            let sample = phase.sin();
            *phase += step;
            sample
        })
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "SoundDeck visualizer engine driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the render pipeline against a synthesized tone.
    Demo {
        /// Number of animation frames to pump.
        #[arg(long, default_value_t = 120)]
        frames: u32,
        /// Transform window size for the analyzer.
        #[arg(long, default_value_t = 256)]
        fft_size: usize,
        /// Frequency of the synthesized tone in Hz.
        #[arg(long, default_value_t = 440.0)]
        tone_hz: f32,
    },
    /// Render a few frames and write the final draw-command list as JSON.
    Export {
        /// Output path for the exported frame.
        output: PathBuf,
        /// Frames to render before exporting.
        #[arg(long, default_value_t = 30)]
        frames: u32,
    },
}
