// THEORY:
// The `Monitor` is the scheduler: one tokio task that owns the controller and
// the frame source and drives them on a fixed period. It is the only place that
// knows about time, channels or shutdown.
//
// Loop rules:
// 1.  **Fixed Cadence**: a `tokio::time::interval` of `update_rate` seconds. A
//     slow tick delays the next one instead of causing a burst of catch-up ticks.
// 2.  **Signals First**: the `select!` is biased towards the control channel, so
//     a suspend, resume or reload that arrived during a tick is applied before
//     the next capture is taken. A pass already running always finishes.
// 3.  **Latest Placement Wins**: a command waits in a one-slot outbox until the
//     mover has room for it, so a slow mover never stalls ticks or signals. A
//     newer command replaces one that is still waiting.
// 4.  **Exit Paths**: a `Shutdown` signal, a closed signal channel, or a dropped
//     placement receiver end the loop with `Ok`. A capture failure ends it with
//     the error and sends nothing, leaving the last placement in place.
//
// A tick runs on the loop's own task and blocks it while growth runs on the
// rayon pool, so the monitor belongs on a multi-threaded runtime.

use crate::config::Config;
use crate::controller::{ControllerState, PlacementCommand, PositioningController};
use crate::error::Result;
use crate::sources::FrameSource;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub enum ControlSignal {
    Suspend,
    Resume,
    /// Replace the running configuration.
    Reconfigure(Box<Config>),
    Shutdown,
}

pub struct Monitor<S: FrameSource> {
    controller: PositioningController,
    source: S,
    signals: mpsc::UnboundedReceiver<ControlSignal>,
    placements: mpsc::Sender<PlacementCommand>,
}

impl<S: FrameSource> Monitor<S> {
    pub fn new(
        controller: PositioningController,
        source: S,
        signals: mpsc::UnboundedReceiver<ControlSignal>,
        placements: mpsc::Sender<PlacementCommand>,
    ) -> Self {
        Self {
            controller,
            source,
            signals,
            placements,
        }
    }

    /// Runs until shutdown. Returns the controller so callers can inspect its
    /// final state.
    pub async fn run(mut self) -> Result<PositioningController> {
        let mut ticker = ticker_for(self.controller.config());
        info!(
            "Monitor started: every {:.2}s, {} seeds, {}px blocks, threshold {}%",
            self.controller.config().update_rate,
            self.controller.config().seeds,
            self.controller.config().block_size,
            self.controller.config().change_threshold
        );

        let mut outbox: Option<PlacementCommand> = None;

        loop {
            tokio::select! {
                biased;

                signal = self.signals.recv() => match signal {
                    None => {
                        debug!("Control channel closed");
                        break;
                    }
                    Some(ControlSignal::Shutdown) => {
                        info!("Shutdown requested");
                        break;
                    }
                    Some(ControlSignal::Suspend) => self.controller.suspend(),
                    Some(ControlSignal::Resume) => self.controller.resume(),
                    Some(ControlSignal::Reconfigure(config)) => match self.controller.reconfigure(*config) {
                        Ok(()) => ticker = ticker_for(self.controller.config()),
                        Err(e) => warn!("Rejected configuration reload, keeping the current one: {}", e),
                    },
                },

                permit = self.placements.reserve(), if outbox.is_some() => match permit {
                    Ok(permit) => {
                        if let Some(command) = outbox.take() {
                            permit.send(command);
                        }
                    }
                    Err(_) => {
                        warn!("Placement receiver dropped, stopping monitor");
                        break;
                    }
                },

                _ = ticker.tick() => {
                    if self.controller.state() == ControllerState::Suspended {
                        continue;
                    }

                    let frame = match self.source.capture() {
                        Ok(frame) => frame,
                        Err(e) => {
                            error!("Frame capture failed, stopping monitor: {}", e);
                            return Err(e);
                        }
                    };

                    let outcome = self.controller.tick(frame);
                    if let Some(command) = outcome.command() {
                        if outbox.replace(*command).is_some() {
                            debug!("Window mover is behind, replacing the unsent placement");
                        }
                    }
                }
            }
        }

        info!("Monitor stopped");
        Ok(self.controller)
    }
}

fn ticker_for(config: &Config) -> Interval {
    let mut ticker = interval(config.tick_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
