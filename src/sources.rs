// THEORY:
// A `FrameSource` is the capture seam. The engine never talks to a display
// server; it asks a source for the next full-screen frame and gets either a
// `Frame` or a `CaptureFailure`. Platform capture backends, recorded sessions
// and test fixtures all plug in here.
//
// `ImageSequenceSource` replays a directory of still images in file-name order,
// looping at the end, which is enough to exercise the whole pipeline headless.

use crate::core_modules::frame::Frame;
use crate::error::{Result, VisionError};
use std::path::{Path, PathBuf};
use tracing::debug;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<Frame>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Result<Frame> + Send,
{
    fn capture(&mut self) -> Result<Frame> {
        self()
    }
}

pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequenceSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| VisionError::CaptureFailure(format!("cannot read {}: {e}", dir.display())))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return VisionError::capture_failure(format!("no images found in {}", dir.display()));
        }
        debug!("Replaying {} frames from {}", paths.len(), dir.display());
        Ok(Self { paths, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn capture(&mut self) -> Result<Frame> {
        let path = &self.paths[self.next];
        self.next = (self.next + 1) % self.paths.len();
        let image = image::open(path)
            .map_err(|e| VisionError::CaptureFailure(format!("{}: {e}", path.display())))?;
        Ok(Frame::from_image(&image))
    }
}
