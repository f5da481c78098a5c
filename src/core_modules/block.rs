// THEORY:
// A `Block` is a fixed tile of the screen used to coarsen change detection.
// Comparing a 1080p capture pixel-by-pixel every tick would be wasteful; instead
// the screen is cut into `block_size` squares and each square is reduced to a
// digest. Two captures are "the same" in a block exactly when the digests match.
//
// Like `Pixel`, a `Block` is a "dumb" container: it knows its grid coordinate and
// the pixel range it covers, and how to hash that range of a frame. It does not
// know about previous frames; comparison belongs to the change detector.
//
// Partitioning is stable: block (i, j) covers columns
// `[i * size, min((i + 1) * size, width))` and the matching rows, so blocks on
// the right and bottom edges are clipped rather than padded.

pub mod block {
    use crate::core_modules::frame::Frame;
    use crate::core_modules::rectangle::Rectangle;
    use sha2::{Digest, Sha256};

    pub type BlockDigest = [u8; 32];

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Block {
        /// Column index in the block grid.
        pub grid_x: u32,
        /// Row index in the block grid.
        pub grid_y: u32,
        /// Pixel area covered, clipped to the frame.
        pub bounds: Rectangle,
    }

    impl Block {
        pub fn new(grid_x: u32, grid_y: u32, block_size: u32, frame_width: u32, frame_height: u32) -> Self {
            let x = grid_x * block_size;
            let y = grid_y * block_size;
            let width = block_size.min(frame_width - x);
            let height = block_size.min(frame_height - y);
            Self {
                grid_x,
                grid_y,
                bounds: Rectangle::new(x, y, width, height),
            }
        }

        /// SHA-256 over the block's RGB bytes, row by row.
        pub fn digest(&self, frame: &Frame) -> BlockDigest {
            let mut hasher = Sha256::new();
            for y in self.bounds.y..self.bounds.bottom() {
                hasher.update(frame.row_span(y, self.bounds.x, self.bounds.right()));
            }
            hasher.finalize().into()
        }
    }

    /// Number of blocks needed to cover `extent` pixels.
    pub fn blocks_along(extent: u32, block_size: u32) -> u32 {
        extent.div_ceil(block_size)
    }
}
