use anyhow::Result;
use clap::Parser;
use pip_vision::{
    Config, ControlSignal, Frame, ImageSequenceSource, Monitor, PlacementCommand, PositioningController,
    VisionError,
};
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

type BoxedSource = Box<dyn FnMut() -> pip_vision::Result<Frame> + Send>;

#[derive(Parser, Debug)]
#[command(name = "pip_vision")]
#[command(about = "Finds calm 16:9 screen regions to park a picture-in-picture overlay in")]
struct Args {
    /// Content shown in the overlay. Passed through to the player.
    url: Option<String>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "pip_vision.toml")]
    config: PathBuf,

    /// Keep monitoring suspended to test window movement by hand
    #[arg(long)]
    test_movement: bool,

    /// Directory of screenshots to replay as captures
    #[arg(long, value_name = "DIR", required_unless_present = "test_movement")]
    frames: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level)?;

    info!("Starting pip_vision v{}", env!("CARGO_PKG_VERSION"));
    if let Some(url) = &args.url {
        info!("Overlay content: {}", url);
    }

    let config = Config::load(&args.config)?;
    info!("Configuration loaded from {}", args.config.display());

    let controller = if args.test_movement {
        warn!("Movement test mode: monitoring stays suspended");
        PositioningController::pinned(config)?
    } else {
        PositioningController::new(config)?
    };

    let source: BoxedSource = match &args.frames {
        Some(dir) => {
            let mut frames = ImageSequenceSource::open(dir)?;
            info!("Replaying {} screenshots from {}", frames.len(), dir.display());
            Box::new(move || pip_vision::FrameSource::capture(&mut frames))
        }
        None => Box::new(|| VisionError::capture_failure::<Frame>("no frame source configured")),
    };

    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let (placement_tx, placement_rx) = mpsc::channel(8);

    let mover_handle = tokio::spawn(log_placements(placement_rx));
    let monitor_handle = tokio::spawn(Monitor::new(controller, source, signal_rx, placement_tx).run());

    let shutdown_tx = signal_tx.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C"),
            Err(err) => error!("Failed to listen for Ctrl+C: {}", err),
        }
        let _ = shutdown_tx.send(ControlSignal::Shutdown);
    });

    let controller = monitor_handle.await??;
    drop(signal_tx);
    let _ = mover_handle.await;

    match controller.committed() {
        Some(rect) => info!("Final placement: {}x{}+{}+{}", rect.width, rect.height, rect.x, rect.y),
        None => info!("No placement committed"),
    }
    info!("pip_vision stopped");
    Ok(())
}

/// Stand-in for the window mover: logs each command it would apply.
async fn log_placements(mut placements: mpsc::Receiver<PlacementCommand>) {
    while let Some(command) = placements.recv().await {
        let rect = command.rect;
        info!(
            "Move overlay to {}x{}+{}+{}, zoom {:.2}",
            rect.width, rect.height, rect.x, rect.y, command.scale
        );
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
