// THEORY:
// The `Pixel` module is the most fundamental unit of the engine: a "dumb" data
// container for one RGB sample and the single operation every higher layer needs
// from it, a color distance. Screen captures carry no meaningful alpha, so only
// the three color channels are stored.
//
// Distance is measured per channel on the native 0..255 scale and the largest
// channel difference wins (Chebyshev distance). This keeps the boundary tolerance
// (`lookahead_pixels`) readable as "no channel may drift by more than N levels".
//
// `PixelSum` is the accumulator used wherever a region is reduced to its mean
// color. It is a plain struct of integer sums so the hot sampling loops never
// allocate.

pub mod pixel {
    pub type Channel = u8;

    pub const CHANNELS: usize = 3;

    /// A single RGB sample.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Pixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl Pixel {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// Largest absolute per-channel difference between two pixels.
        #[inline]
        pub fn distance(&self, other: &Pixel) -> u8 {
            let r = self.red.abs_diff(other.red);
            let g = self.green.abs_diff(other.green);
            let b = self.blue.abs_diff(other.blue);
            r.max(g).max(b)
        }
    }

    impl From<&[u8]> for Pixel {
        fn from(bytes: &[u8]) -> Self {
            if bytes.len() < CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2])
        }
    }

    impl From<[u8; 3]> for Pixel {
        fn from(rgb: [u8; 3]) -> Self {
            Pixel::new(rgb[0], rgb[1], rgb[2])
        }
    }

    /// Running channel sums for computing a mean color without allocation.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PixelSum {
        red: u64,
        green: u64,
        blue: u64,
        count: u64,
    }

    impl PixelSum {
        #[inline]
        pub fn push(&mut self, pixel: Pixel) {
            self.red += pixel.red as u64;
            self.green += pixel.green as u64;
            self.blue += pixel.blue as u64;
            self.count += 1;
        }

        pub fn count(&self) -> u64 {
            self.count
        }

        /// The mean color, or `None` if nothing was pushed.
        pub fn mean(&self) -> Option<Pixel> {
            if self.count == 0 {
                return None;
            }
            Some(Pixel {
                red: (self.red / self.count) as u8,
                green: (self.green / self.count) as u8,
                blue: (self.blue / self.count) as u8,
            })
        }
    }
}
