//! Sensei3D - Interactive animated teacher avatar
//!
//! Demo entry point: mounts one avatar against a headless backend, drives it
//! with a fixed-rate frame loop, and scripts a hover visit.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sensei3d::{
    config::Config, AvatarHandle, AvatarInstance, FrameLoop, FrameScheduler, GraphicsBackend,
    HeadlessBackend, MountSpec, UnavailableBackend,
};

/// Sensei3D - Interactive animated teacher avatar
#[derive(Parser, Debug)]
#[command(name = "sensei3d", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mount width in pixels
    #[arg(long, default_value_t = 600)]
    width: u32,

    /// Mount height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Page viewport width in pixels (selects the quality tier)
    #[arg(long, default_value_t = 1280)]
    viewport_width: u32,

    /// Target frame rate
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Stop after this many frames (runs until Ctrl+C when omitted)
    #[arg(long)]
    frames: Option<u64>,

    /// Seconds after start to send pointer-enter
    #[arg(long, default_value_t = 1.0)]
    hover_at: f32,

    /// Seconds the pointer stays over the avatar
    #[arg(long, default_value_t = 2.0)]
    hover_for: f32,

    /// Viewport width to resize to after the hover visit
    #[arg(long)]
    resize_to: Option<u32>,

    /// Simulate a missing graphics context
    #[arg(long)]
    no_gpu: bool,

    /// Random seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the last composed frame as JSON
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", sensei3d::NAME, sensei3d::VERSION);

    // Load configuration
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    // Validate configuration
    config.validate()?;

    let frame_loop = FrameLoop::new(args.fps)?;
    let frame_loop = match args.frames {
        Some(frames) => frame_loop.with_frame_budget(frames),
        None => frame_loop,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(args, config, frame_loop))?;

    info!("Sensei3D stopped");
    Ok(())
}

async fn run(args: Args, config: Config, frame_loop: FrameLoop) -> anyhow::Result<()> {
    let headless = HeadlessBackend::new();
    let backend: Box<dyn GraphicsBackend> = if args.no_gpu {
        Box::new(UnavailableBackend::new("disabled with --no-gpu"))
    } else {
        Box::new(headless.clone())
    };
    info!("Graphics backend: {}", backend.name());

    let spec = MountSpec {
        width: args.width,
        height: args.height,
        viewport_width: args.viewport_width,
    };
    let (avatar, handle) = AvatarInstance::mount(config, spec, backend.as_ref());

    let mut scheduler = FrameScheduler::new();
    let id = scheduler.subscribe(avatar);

    tokio::spawn(script_visit(
        handle,
        args.hover_at,
        args.hover_for,
        args.resize_to.map(|w| (w, args.width, args.height)),
    ));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let (exit, frames) = frame_loop.run(&mut scheduler, shutdown_rx).await;
    info!("Frame loop exited ({:?}) after {} frames", exit, frames);

    if let Some(path) = args.dump {
        let json = match scheduler.get(id) {
            Some(avatar) => match avatar.placeholder() {
                Some(placeholder) => serde_json::to_string_pretty(placeholder)?,
                None => serde_json::to_string_pretty(&avatar.compose())?,
            },
            None => String::from("null"),
        };
        std::fs::write(&path, json)?;
        info!("Wrote frame to {}", path.display());
    }

    let report = scheduler.unmount(id)?;
    info!(
        "Unmounted: {} frames, {} timers cancelled, fallback={}",
        report.frames, report.timers_cancelled, report.fallback
    );
    if !args.no_gpu {
        info!("Headless surface drew {} frames", headless.frames_drawn());
    }
    Ok(())
}

/// Pointer visit: enter, stay, leave, then an optional resize.
async fn script_visit(
    handle: AvatarHandle,
    hover_at: f32,
    hover_for: f32,
    resize: Option<(u32, u32, u32)>,
) {
    tokio::time::sleep(Duration::from_secs_f32(hover_at.max(0.0))).await;
    if !handle.pointer_enter() {
        return;
    }
    info!("Pointer entered");

    tokio::time::sleep(Duration::from_secs_f32(hover_for.max(0.0))).await;
    if !handle.pointer_leave() {
        return;
    }
    info!("Pointer left");

    if let Some((viewport_width, width, height)) = resize {
        if !handle.resize(viewport_width, width, height) {
            warn!("Avatar gone before resize");
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
