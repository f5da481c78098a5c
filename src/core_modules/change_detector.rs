// THEORY:
// The `BlockChangeDetector` answers one question per tick: how much of the screen
// changed since the last capture? It is the cheap gate in front of the expensive
// seed-growth search.
//
// Key architectural principles:
// 1.  **Data Transformation**: A frame is first reduced to `BlockDigests`, one
//     digest per block in row-major order. Hashing is embarrassingly parallel and
//     runs over the rayon pool; `collect` keeps the row-major order regardless of
//     which worker finished first.
// 2.  **Comparison**: Two digest sets of the same geometry are compared position
//     by position into a `ChangeMap`. The change ratio is the share of `true`
//     entries, expressed as a percentage.
// 3.  **Graceful Geometry Changes**: If the frames have different dimensions (a
//     resolution switch mid-run), the detector does not fail. It reports every
//     block as changed and flags that a full re-detection is required.
// 4.  **Statelessness**: The detector keeps no frames. Callers own frame and
//     digest lifetimes, which lets the controller drop pixel data as soon as a
//     capture has been digested.

use crate::core_modules::block::block::{Block, BlockDigest, blocks_along};
use crate::core_modules::frame::Frame;
use rayon::prelude::*;

/// Block digests of one frame plus the geometry they were computed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDigests {
    frame_width: u32,
    frame_height: u32,
    block_size: u32,
    grid_width: u32,
    grid_height: u32,
    digests: Vec<BlockDigest>,
}

impl BlockDigests {
    pub fn compute(frame: &Frame, block_size: u32) -> Self {
        let (frame_width, frame_height) = frame.dimensions();
        let grid_width = blocks_along(frame_width, block_size);
        let grid_height = blocks_along(frame_height, block_size);
        let num_blocks = grid_width as usize * grid_height as usize;

        let digests = (0..num_blocks)
            .into_par_iter()
            .map(|index| {
                let grid_x = (index % grid_width as usize) as u32;
                let grid_y = (index / grid_width as usize) as u32;
                Block::new(grid_x, grid_y, block_size, frame_width, frame_height).digest(frame)
            })
            .collect();

        Self {
            frame_width,
            frame_height,
            block_size,
            grid_width,
            grid_height,
            digests,
        }
    }

    pub fn frame_dimensions(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn grid_dimensions(&self) -> (u32, u32) {
        (self.grid_width, self.grid_height)
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    fn same_geometry(&self, other: &BlockDigests) -> bool {
        self.frame_dimensions() == other.frame_dimensions() && self.block_size == other.block_size
    }
}

/// One flag per block, `true` where the block changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeMap {
    grid_width: u32,
    grid_height: u32,
    changed: Vec<bool>,
}

impl ChangeMap {
    pub fn is_changed(&self, grid_x: u32, grid_y: u32) -> bool {
        self.changed[(grid_y * self.grid_width + grid_x) as usize]
    }

    pub fn changed_count(&self) -> usize {
        self.changed.iter().filter(|c| **c).count()
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn grid_dimensions(&self) -> (u32, u32) {
        (self.grid_width, self.grid_height)
    }

    /// Share of changed blocks in percent. An empty grid has not changed.
    pub fn change_percent(&self) -> f64 {
        if self.changed.is_empty() {
            return 0.0;
        }
        self.changed_count() as f64 * 100.0 / self.changed.len() as f64
    }
}

#[derive(Debug, Clone)]
pub struct ChangeReport {
    pub map: ChangeMap,
    pub change_percent: f64,
    /// The two frames had different geometry; every block counts as changed.
    pub dimensions_changed: bool,
}

impl ChangeReport {
    pub fn requires_full_detection(&self) -> bool {
        self.dimensions_changed
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BlockChangeDetector {
    block_size: u32,
}

impl BlockChangeDetector {
    pub fn new(block_size: u32) -> Self {
        Self { block_size }
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn digest(&self, frame: &Frame) -> BlockDigests {
        BlockDigests::compute(frame, self.block_size)
    }

    /// Compares two frames directly. Prefer `compare_digests` when the previous
    /// frame's digests are already known.
    pub fn compare(&self, previous: &Frame, current: &Frame) -> ChangeReport {
        self.compare_digests(&self.digest(previous), &self.digest(current))
    }

    pub fn compare_digests(&self, previous: &BlockDigests, current: &BlockDigests) -> ChangeReport {
        let (grid_width, grid_height) = current.grid_dimensions();

        if !previous.same_geometry(current) {
            return ChangeReport {
                map: ChangeMap {
                    grid_width,
                    grid_height,
                    changed: vec![true; current.len()],
                },
                change_percent: 100.0,
                dimensions_changed: true,
            };
        }

        let changed = previous
            .digests
            .iter()
            .zip(&current.digests)
            .map(|(before, after)| before != after)
            .collect();
        let map = ChangeMap {
            grid_width,
            grid_height,
            changed,
        };
        let change_percent = map.change_percent();

        ChangeReport {
            map,
            change_percent,
            dimensions_changed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    fn checkerboard(width: u32, height: u32, block: u32, phase: u32) -> Frame {
        Frame::from_fn(width, height, |x, y| {
            if ((x / block) + (y / block) + phase) % 2 == 0 {
                Pixel::new(0, 0, 0)
            } else {
                Pixel::new(255, 255, 255)
            }
        })
    }

    #[test]
    fn identical_frames_have_zero_change() {
        let frame = checkerboard(64, 48, 8, 0);
        let report = BlockChangeDetector::new(8).compare(&frame, &frame.clone());
        assert_eq!(report.change_percent, 0.0);
        assert_eq!(report.map.changed_count(), 0);
        assert!(!report.requires_full_detection());
    }

    #[test]
    fn fully_different_frames_have_full_change() {
        let before = checkerboard(64, 48, 8, 0);
        let after = checkerboard(64, 48, 8, 1);
        let report = BlockChangeDetector::new(8).compare(&before, &after);
        assert_eq!(report.change_percent, 100.0);
        assert_eq!(report.map.len(), 8 * 6);
    }

    #[test]
    fn dimension_change_forces_full_detection() {
        let before = Frame::filled(64, 48, Pixel::new(1, 2, 3));
        let after = Frame::filled(80, 48, Pixel::new(1, 2, 3));
        let report = BlockChangeDetector::new(16).compare(&before, &after);
        assert_eq!(report.change_percent, 100.0);
        assert!(report.requires_full_detection());
        assert_eq!(report.map.grid_dimensions(), (5, 3));
        assert_eq!(report.map.len(), 15);
    }

    #[test]
    fn map_cardinality_matches_clipped_grid() {
        let frame = Frame::filled(1920, 1080, Pixel::new(0, 0, 0));
        let digests = BlockDigests::compute(&frame, 100);
        assert_eq!(digests.grid_dimensions(), (20, 11));
        assert_eq!(digests.len(), 220);
    }

    #[test]
    fn partial_change_ratio() {
        let before = Frame::filled(1920, 1080, Pixel::new(0, 0, 0));
        // Paint the first 70 blocks of the row-major grid.
        let after = Frame::from_fn(1920, 1080, |x, y| {
            let index = (y / 100) * 20 + (x / 100);
            if index < 70 { Pixel::new(200, 0, 0) } else { Pixel::new(0, 0, 0) }
        });
        let report = BlockChangeDetector::new(100).compare(&before, &after);
        assert_eq!(report.map.changed_count(), 70);
        assert!((report.change_percent - 70.0 * 100.0 / 220.0).abs() < 1e-9);
        assert!(report.map.is_changed(0, 0));
        assert!(report.map.is_changed(9, 3));
        assert!(!report.map.is_changed(10, 3));
    }
}
