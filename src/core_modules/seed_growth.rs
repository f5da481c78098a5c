// THEORY:
// The `SeedGrowthEngine` is the search layer. Given one frame it answers "where
// are the largest calm 16:9 areas right now?" by seeding many candidates across
// the screen, growing them all, and ranking what survives.
//
// Algorithm steps:
// 1.  **Seeding**: `place_seeds` lays `seeds` points over the scan region
//     (the whole frame, or a caller-restricted area clipped to it).
// 2.  **Parallel Growth**: Each seed becomes a `Candidate` that grows on the
//     engine's rayon pool. The frame is shared read-only; each task owns its own
//     candidate, so the only synchronisation is the join at the end of the map.
//     `collect` keeps seed order, which keeps results deterministic.
// 3.  **Ranking**: Candidates that a color boundary stopped at their minimal
//     size are dropped; a minimal box held back only by the bounds stays. The rest are sorted by area (largest first), then by top edge, then by left
//     edge; identical rectangles found from different seeds collapse to one.
// 4.  **Non-overlap Reduction** (optional): greedy largest-first selection keeps
//     a rectangle only if it shares no area with anything already kept. This is
//     not the best possible total-area cover, but it is fast and predictable.
//
// An empty result is a normal outcome on busy screens, not an error.

use crate::config::Config;
use crate::core_modules::candidate::{Candidate, GrowthContext, GrowthSettings};
use crate::core_modules::frame::Frame;
use crate::core_modules::rectangle::Rectangle;
use crate::core_modules::seeds::place_seeds;
use crate::error::Result;
use rayon::prelude::*;
use std::cmp::Reverse;
use tracing::debug;

/// Ranked rectangles from one detection pass, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    rectangles: Vec<Rectangle>,
}

impl ResultSet {
    /// Sorts, de-duplicates and, if asked, reduces `rectangles` to a disjoint set.
    pub fn rank(mut rectangles: Vec<Rectangle>, no_overlap: bool) -> Self {
        rectangles.sort_by_key(|r| (Reverse(r.area()), r.y, r.x, Reverse(r.width)));
        rectangles.dedup();

        if no_overlap {
            let mut kept: Vec<Rectangle> = Vec::with_capacity(rectangles.len());
            for rect in rectangles {
                if kept.iter().all(|k| !k.intersects(&rect)) {
                    kept.push(rect);
                }
            }
            rectangles = kept;
        }

        Self { rectangles }
    }

    pub fn best(&self) -> Option<&Rectangle> {
        self.rectangles.first()
    }

    pub fn len(&self) -> usize {
        self.rectangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rectangle> {
        self.rectangles.iter()
    }

    pub fn as_slice(&self) -> &[Rectangle] {
        &self.rectangles
    }
}

impl IntoIterator for ResultSet {
    type Item = Rectangle;
    type IntoIter = std::vec::IntoIter<Rectangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.rectangles.into_iter()
    }
}

pub struct SeedGrowthEngine {
    settings: GrowthSettings,
    seeds: usize,
    jitter: u32,
    jitter_seed: u64,
    no_overlap: bool,
    exclude_center: Option<(u32, u32)>,
    pool: rayon::ThreadPool,
}

impl SeedGrowthEngine {
    pub fn new(config: &Config) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.growth_workers())
            .thread_name(|i| format!("seed-growth-{i}"))
            .build()?;

        Ok(Self {
            settings: GrowthSettings::from(config),
            seeds: config.seeds,
            jitter: config.jitter,
            jitter_seed: config.jitter_seed,
            no_overlap: config.no_overlap,
            exclude_center: config
                .exclusion_enabled()
                .then_some((config.exclude_center_width, config.exclude_center_height)),
            pool,
        })
    }

    /// Finds the largest uniform 16:9 areas of `frame`, optionally only inside `region`.
    pub fn detect(&self, frame: &Frame, region: Option<Rectangle>) -> ResultSet {
        let bounds = match region {
            Some(region) => match region.intersection(&frame.bounds()) {
                Some(bounds) => bounds,
                None => return ResultSet::default(),
            },
            None => frame.bounds(),
        };

        let ctx = GrowthContext {
            frame,
            bounds,
            exclusion: self.exclusion_zone(frame),
            settings: &self.settings,
        };
        let seeds = place_seeds(bounds, self.seeds, self.jitter, self.jitter_seed);

        let grown: Vec<Rectangle> = self.pool.install(|| {
            seeds
                .par_iter()
                .filter_map(|seed| Candidate::seed(*seed, &ctx))
                .map(|candidate| candidate.grow(&ctx))
                .filter(Candidate::is_usable)
                .map(|candidate| candidate.rect())
                .collect()
        });

        debug!(
            "Seed growth: {} seeds, {} candidates grew in {:?}",
            seeds.len(),
            grown.len(),
            bounds
        );

        ResultSet::rank(grown, self.no_overlap)
    }

    /// The centered no-go zone for this frame, if enabled.
    pub fn exclusion_zone(&self, frame: &Frame) -> Option<Rectangle> {
        let (width_pct, height_pct) = self.exclude_center?;
        let width = frame.width() * width_pct / 100;
        let height = frame.height() * height_pct / 100;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Rectangle::new(
            (frame.width() - width) / 2,
            (frame.height() - height) / 2,
            width,
            height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorMode;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::rectangle::{height_for_width, width_for_height};

    const EPSILON: f64 = 0.06;

    fn config(seeds: usize) -> Config {
        Config {
            seeds,
            worker_threads: 4,
            ..Config::default()
        }
    }

    fn maximal_area(width: u32, height: u32) -> u64 {
        let h = height.min(height_for_width(width));
        width_for_height(h) as u64 * h as u64
    }

    fn quadrants(width: u32, height: u32) -> Frame {
        Frame::from_fn(width, height, |x, y| match (x < width / 3, y < height / 2) {
            (true, true) => Pixel::new(230, 230, 230),
            (true, false) => Pixel::new(30, 30, 30),
            (false, true) => Pixel::new(200, 40, 40),
            (false, false) => Pixel::new(40, 40, 200),
        })
    }

    #[test]
    fn rank_orders_by_area_then_position() {
        let ranked = ResultSet::rank(
            vec![
                Rectangle::new(50, 0, 16, 9),
                Rectangle::new(0, 0, 32, 18),
                Rectangle::new(10, 0, 16, 9),
                Rectangle::new(10, 0, 16, 9),
                Rectangle::new(0, 40, 16, 9),
            ],
            false,
        );
        assert_eq!(
            ranked.as_slice(),
            &[
                Rectangle::new(0, 0, 32, 18),
                Rectangle::new(10, 0, 16, 9),
                Rectangle::new(50, 0, 16, 9),
                Rectangle::new(0, 40, 16, 9),
            ]
        );
    }

    #[test]
    fn rank_without_overlap_is_greedy_largest_first() {
        let ranked = ResultSet::rank(
            vec![
                Rectangle::new(0, 0, 32, 18),
                Rectangle::new(20, 10, 16, 9),
                Rectangle::new(32, 0, 16, 9),
                Rectangle::new(30, 0, 16, 9),
            ],
            true,
        );
        assert_eq!(
            ranked.as_slice(),
            &[Rectangle::new(0, 0, 32, 18), Rectangle::new(32, 0, 16, 9)]
        );
    }

    #[test]
    fn uniform_frame_yields_maximal_rectangle() {
        for (width, height) in [(320, 180), (400, 180), (300, 300)] {
            let frame = Frame::filled(width, height, Pixel::new(12, 34, 56));
            let engine = SeedGrowthEngine::new(&config(9)).expect("engine");
            let results = engine.detect(&frame, None);
            assert!(!results.is_empty());
            for rect in results.iter() {
                assert_eq!(rect.area(), maximal_area(width, height), "{width}x{height}: {rect:?}");
            }
        }
    }

    #[test]
    fn full_hd_uniform_frame_fills_the_screen() {
        let frame = Frame::filled(1920, 1080, Pixel::new(0, 0, 0));
        let engine = SeedGrowthEngine::new(&Config {
            growth_pixels: 20,
            ..config(4)
        })
        .expect("engine");
        let results = engine.detect(&frame, None);
        assert_eq!(results.best(), Some(&Rectangle::new(0, 0, 1920, 1080)));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn no_rectangle_straddles_a_vertical_boundary() {
        let boundary = 250;
        let frame = Frame::from_fn(640, 360, |x, _| {
            if x < boundary { Pixel::new(220, 30, 30) } else { Pixel::new(20, 40, 200) }
        });
        for mode in [ColorMode::Average, ColorMode::Corners] {
            let engine = SeedGrowthEngine::new(&Config {
                color_mode: mode,
                ..config(25)
            })
            .expect("engine");
            let results = engine.detect(&frame, None);
            assert!(!results.is_empty());
            for rect in results.iter() {
                assert!(
                    rect.right() <= boundary || rect.x >= boundary,
                    "{mode:?}: {rect:?} straddles column {boundary}"
                );
            }
        }
    }

    #[test]
    fn non_overlapping_results_are_disjoint() {
        let frame = quadrants(640, 360);
        let engine = SeedGrowthEngine::new(&Config {
            no_overlap: true,
            ..config(36)
        })
        .expect("engine");
        let results = engine.detect(&frame, None);
        assert!(results.len() >= 2);
        let rects = results.as_slice();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert_eq!(a.intersection_area(b), 0, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn results_are_sorted_and_aspect_locked() {
        let frame = quadrants(640, 360);
        let results = SeedGrowthEngine::new(&config(36)).expect("engine").detect(&frame, None);
        assert!(!results.is_empty());
        let rects = results.as_slice();
        assert!(rects.windows(2).all(|w| w[0].area() >= w[1].area()));
        for rect in rects {
            assert!((rect.aspect_ratio() - 16.0 / 9.0).abs() <= EPSILON, "{rect:?}");
            assert!(frame.bounds().contains(rect));
        }
    }

    #[test]
    fn detection_is_deterministic() {
        let frame = quadrants(480, 270);
        let engine = SeedGrowthEngine::new(&config(49)).expect("engine");
        let first = engine.detect(&frame, None);
        let second = engine.detect(&frame, None);
        let other_engine = SeedGrowthEngine::new(&Config {
            worker_threads: 1,
            ..config(49)
        })
        .expect("engine");
        assert_eq!(first, second);
        assert_eq!(first, other_engine.detect(&frame, None));
    }

    #[test]
    fn noisy_frame_yields_no_region() {
        let frame = Frame::from_fn(320, 180, |x, y| {
            if (x + y) % 2 == 0 { Pixel::new(0, 0, 0) } else { Pixel::new(255, 255, 255) }
        });
        let results = SeedGrowthEngine::new(&config(25)).expect("engine").detect(&frame, None);
        assert!(results.is_empty());
        assert_eq!(results.best(), None);
    }

    #[test]
    fn low_contrast_boundary_is_not_crossed() {
        let boundary = 250;
        for d in [18u8, 25] {
            let frame = Frame::from_fn(640, 360, |x, _| {
                if x < boundary { Pixel::new(100, 100, 100) } else { Pixel::new(100 + d, 100, 100) }
            });
            for mode in [ColorMode::Average, ColorMode::Corners] {
                for rate in [1, 4] {
                    let engine = SeedGrowthEngine::new(&Config {
                        color_mode: mode,
                        pixel_sample_rate: rate,
                        worker_threads: 4,
                        ..Config::default()
                    })
                    .expect("engine");
                    let results = engine.detect(&frame, None);
                    assert!(!results.is_empty());
                    for rect in results.iter() {
                        assert!(
                            rect.right() <= boundary || rect.x >= boundary,
                            "d={d} {mode:?} rate={rate}: {rect:?} straddles column {boundary}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn minimal_uniform_frame_is_its_own_region() {
        for width in [16, 17] {
            let frame = Frame::filled(width, 9, Pixel::new(40, 40, 40));
            let results = SeedGrowthEngine::new(&config(4)).expect("engine").detect(&frame, None);
            assert_eq!(results.best().map(Rectangle::area), Some(16 * 9), "{width}x9");
            assert!(results.iter().all(|rect| frame.bounds().contains(rect)));
        }
    }

    #[test]
    fn region_past_the_coordinate_limit_is_empty() {
        let frame = Frame::filled(640, 360, Pixel::new(90, 90, 90));
        let engine = SeedGrowthEngine::new(&config(9)).expect("engine");
        assert!(engine.detect(&frame, Some(Rectangle::new(u32::MAX - 10, 0, 100, 100))).is_empty());
        assert!(engine.detect(&frame, Some(Rectangle::new(0, u32::MAX - 10, 100, 100))).is_empty());
    }

    #[test]
    fn restricted_region_confines_results() {
        let frame = Frame::filled(640, 360, Pixel::new(90, 90, 90));
        let region = Rectangle::new(400, 200, 400, 400);
        let results = SeedGrowthEngine::new(&config(9)).expect("engine").detect(&frame, Some(region));
        let clipped = Rectangle::new(400, 200, 240, 160);
        assert!(!results.is_empty());
        for rect in results.iter() {
            assert!(clipped.contains(rect), "{rect:?}");
        }
        assert_eq!(results.best().map(Rectangle::area), Some(maximal_area(240, 160)));

        let outside = Rectangle::new(700, 0, 10, 10);
        assert!(SeedGrowthEngine::new(&config(9)).expect("engine").detect(&frame, Some(outside)).is_empty());
    }

    #[test]
    fn exclusion_zone_is_respected() {
        let frame = Frame::filled(640, 360, Pixel::new(90, 90, 90));
        let engine = SeedGrowthEngine::new(&Config {
            exclude_center_width: 25,
            exclude_center_height: 33,
            ..config(25)
        })
        .expect("engine");
        let zone = engine.exclusion_zone(&frame).expect("zone enabled");
        assert_eq!(zone, Rectangle::new(240, 121, 160, 118));
        let results = engine.detect(&frame, None);
        assert!(!results.is_empty());
        assert!(results.iter().all(|rect| !rect.intersects(&zone)));
    }
}
