// THEORY:
// pip_vision finds where a picture-in-picture overlay can sit without covering
// anything the user is working on. It watches full-screen captures, notices when
// enough of the screen has changed, and then searches for the largest calm,
// uniformly colored 16:9 area to move the overlay into.
//
// Layers, bottom to top:
// 1.  `core_modules`: frames, pixels and rectangles, the block-hash change
//     detector and the seed-growth search. Pure and synchronous.
// 2.  `controller`: the per-tick state machine deciding when to search and what
//     to commit.
// 3.  `monitor`: the async loop that captures on a timer, obeys control signals
//     and sends placement commands to whoever moves the window.
//
// Capture itself is behind the `FrameSource` trait in `sources`.

pub mod config;
pub mod controller;
pub mod core_modules;
pub mod error;
pub mod monitor;
pub mod sources;

pub use config::{ColorMode, Config};
pub use controller::{ControllerState, PlacementCommand, PositioningController, TickOutcome};
pub use core_modules::change_detector::{BlockChangeDetector, ChangeMap, ChangeReport};
pub use core_modules::frame::Frame;
pub use core_modules::rectangle::Rectangle;
pub use core_modules::seed_growth::{ResultSet, SeedGrowthEngine};
pub use error::{Result, VisionError};
pub use monitor::{ControlSignal, Monitor};
pub use sources::{FrameSource, ImageSequenceSource};
