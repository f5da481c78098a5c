// THEORY:
// The `PositioningController` is the decision layer that sits on top of the two
// core modules. Every tick it is handed one capture and decides, from the block
// change ratio alone, whether the current overlay placement can be trusted or the
// screen must be searched again.
//
// States:
// - STABLE: holding the committed rectangle (or nothing yet at startup).
// - DETECTING: a seed-growth pass is running on the current capture.
// - SUSPENDED: monitoring is off. Entering it forgets the retained digests and
//   the committed rectangle, so the first tick after resuming always searches.
//
// Per-cycle trouble never escapes this type: a resolution change is just a 100%
// change ratio, and a pass that finds nothing keeps the previous placement. The
// controller is synchronous and single-owner; the async `Monitor` drives it.
//
// Only the digests of the previous capture are kept between ticks. The pixels of
// a capture are dropped as soon as the tick that received it returns.

use crate::config::Config;
use crate::core_modules::change_detector::{BlockChangeDetector, BlockDigests};
use crate::core_modules::frame::Frame;
use crate::core_modules::rectangle::Rectangle;
use crate::core_modules::seed_growth::SeedGrowthEngine;
use crate::error::Result;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Stable,
    Detecting,
    Suspended,
}

/// Where the overlay should go, and how much to zoom its content to fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementCommand {
    pub rect: Rectangle,
    pub scale: f64,
}

/// What a single tick decided.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Monitoring is suspended; the capture was ignored.
    Suspended,
    /// The screen changed too little to search again.
    Unchanged { change_percent: f64 },
    /// A search ran and a new placement was committed.
    Placed {
        change_percent: f64,
        command: PlacementCommand,
    },
    /// A search ran and confirmed the placement already committed.
    Confirmed { change_percent: f64 },
    /// A search ran and found nothing usable; the previous placement stands.
    NoUsableRegion { change_percent: f64 },
}

impl TickOutcome {
    pub fn command(&self) -> Option<&PlacementCommand> {
        match self {
            TickOutcome::Placed { command, .. } => Some(command),
            _ => None,
        }
    }

    pub fn detection_ran(&self) -> bool {
        matches!(
            self,
            TickOutcome::Placed { .. } | TickOutcome::Confirmed { .. } | TickOutcome::NoUsableRegion { .. }
        )
    }
}

pub struct PositioningController {
    config: Config,
    detector: BlockChangeDetector,
    engine: SeedGrowthEngine,
    state: ControllerState,
    previous: Option<BlockDigests>,
    committed: Option<Rectangle>,
    /// Held in SUSPENDED for manual placement testing; resume is ignored.
    pinned: bool,
    ticks: u64,
}

impl PositioningController {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let engine = SeedGrowthEngine::new(&config)?;
        Ok(Self {
            detector: BlockChangeDetector::new(config.block_size),
            engine,
            config,
            state: ControllerState::Stable,
            previous: None,
            committed: None,
            pinned: false,
            ticks: 0,
        })
    }

    /// A controller that never leaves SUSPENDED.
    pub fn pinned(config: Config) -> Result<Self> {
        let mut controller = Self::new(config)?;
        controller.pinned = true;
        controller.suspend();
        Ok(controller)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn committed(&self) -> Option<Rectangle> {
        self.committed
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn suspend(&mut self) {
        if self.state != ControllerState::Suspended {
            info!("Monitoring suspended");
        }
        self.state = ControllerState::Suspended;
        self.previous = None;
        self.committed = None;
    }

    pub fn resume(&mut self) {
        if self.pinned {
            debug!("Resume ignored: controller is pinned for movement testing");
            return;
        }
        if self.state == ControllerState::Suspended {
            info!("Monitoring resumed");
            self.state = ControllerState::Stable;
        }
    }

    /// Swaps in a new configuration. Retained state is dropped so the next tick
    /// searches from scratch. On error the old configuration stays in effect.
    pub fn reconfigure(&mut self, config: Config) -> Result<()> {
        config.validate()?;
        self.engine = SeedGrowthEngine::new(&config)?;
        self.detector = BlockChangeDetector::new(config.block_size);
        self.config = config;
        self.previous = None;
        self.committed = None;
        info!("Configuration reloaded");
        Ok(())
    }

    /// Content zoom that fits the nominal content size inside `rect`.
    pub fn scale_for(&self, rect: &Rectangle) -> f64 {
        let sx = rect.width as f64 / self.config.content_width as f64;
        let sy = rect.height as f64 / self.config.content_height as f64;
        sx.min(sy)
    }

    pub fn tick(&mut self, frame: Frame) -> TickOutcome {
        if self.state == ControllerState::Suspended {
            return TickOutcome::Suspended;
        }
        self.ticks += 1;

        let digests = self.detector.digest(&frame);
        let (change_percent, must_detect) = match self.previous.as_ref() {
            None => {
                debug!("[{:03}] No previous capture, running initial search", self.ticks);
                (100.0, true)
            }
            Some(previous) => {
                let report = self.detector.compare_digests(previous, &digests);
                if report.requires_full_detection() {
                    info!(
                        "Screen geometry changed to {}x{}, searching again",
                        frame.width(),
                        frame.height()
                    );
                }
                (report.change_percent, report.requires_full_detection())
            }
        };
        self.previous = Some(digests);

        debug!("[{:03}] {:5.1}% blocks changed", self.ticks, change_percent);

        if !must_detect && change_percent <= self.config.change_threshold {
            return TickOutcome::Unchanged { change_percent };
        }

        if self.committed.is_some() {
            info!(
                "{:.1}% of blocks changed (threshold {}%), searching for a new region",
                change_percent, self.config.change_threshold
            );
        }

        self.state = ControllerState::Detecting;
        let results = self.engine.detect(&frame, None);
        self.state = ControllerState::Stable;

        match results.best().copied() {
            None => {
                info!("No usable region found, keeping the previous placement");
                TickOutcome::NoUsableRegion { change_percent }
            }
            Some(best) if self.committed == Some(best) => {
                debug!("Search confirmed the current placement {:?}", best);
                TickOutcome::Confirmed { change_percent }
            }
            Some(best) => {
                let command = PlacementCommand {
                    rect: best,
                    scale: self.scale_for(&best),
                };
                info!(
                    "Placing overlay at {}x{}+{}+{} ({} px², zoom {:.2})",
                    best.width,
                    best.height,
                    best.x,
                    best.y,
                    best.area(),
                    command.scale
                );
                self.committed = Some(best);
                TickOutcome::Placed {
                    change_percent,
                    command,
                }
            }
        }
    }
}
