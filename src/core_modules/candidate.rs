// THEORY:
// A `Candidate` is one growing rectangle: the stateful, per-seed worker of the
// seed-growth layer. It starts as the smallest 16:9 box around its seed and
// pushes its four edges outward step by step until it can no longer grow without
// crossing a color boundary, the scan bounds, or the exclusion zone.
//
// Key architectural principles:
// 1.  **Aspect Lock**: Height is the driving dimension. Each step adds up to
//     `growth_pixels` of height and re-derives the width as `round(h * 16 / 9)`,
//     so the ratio holds after every step, not just at the end. The increase on
//     each axis is split across that axis' active edges; when one edge runs out
//     of room the other takes the remainder.
// 2.  **Look Before Growing**: Before a step is committed, every edge that will
//     move samples the band of pixels just outside it. The band is at least as
//     thick as the pixels about to be added, and the top/bottom bands span the
//     post-step width, so the union of bands is exactly the area the step would
//     swallow. Every sampled pixel is held against the interior reference on its
//     own; a single stray sample halts that edge for good and the step is
//     re-planned without it. Sampling starts from the band's outer line, so a
//     boundary anywhere inside the band is always seen.
// 3.  **Private State**: A candidate reads the shared frame and writes only to
//     itself. Any number of them can grow concurrently with no synchronisation.
// 4.  **Bounded Work**: `MAX_GROWTH_STEPS` caps the loop independently of any
//     configuration value.

use crate::config::{ColorMode, Config};
use crate::core_modules::frame::Frame;
use crate::core_modules::pixel::pixel::{CHANNELS, Pixel, PixelSum};
use crate::core_modules::rectangle::{ASPECT_HEIGHT, Point, Rectangle, height_for_width, width_for_height};

/// Hard cap on growth steps per candidate.
pub const MAX_GROWTH_STEPS: u32 = 1 << 16;

const MIN_HEIGHT: u32 = ASPECT_HEIGHT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

/// The growth parameters a candidate needs, pulled out of `Config` once per pass.
#[derive(Debug, Clone, Copy)]
pub struct GrowthSettings {
    pub tolerance: u8,
    pub wall_thickness: u32,
    pub growth_pixels: u32,
    pub sample_rate: u32,
    pub color_mode: ColorMode,
}

impl From<&Config> for GrowthSettings {
    fn from(config: &Config) -> Self {
        Self {
            tolerance: config.lookahead_pixels.min(255) as u8,
            wall_thickness: config.wall_thickness.max(1),
            growth_pixels: config.growth_pixels.max(1),
            sample_rate: config.pixel_sample_rate.max(1),
            color_mode: config.color_mode,
        }
    }
}

/// Read-only inputs shared by every candidate of one detection pass.
#[derive(Debug, Clone, Copy)]
pub struct GrowthContext<'a> {
    pub frame: &'a Frame,
    /// Candidates never leave this area. Always inside the frame.
    pub bounds: Rectangle,
    pub exclusion: Option<Rectangle>,
    pub settings: &'a GrowthSettings,
}

/// Pixels each edge moves by in one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StepPlan {
    amounts: [u32; 4],
}

impl StepPlan {
    fn amount(&self, direction: Direction) -> u32 {
        self.amounts[direction.index()]
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    rect: Rectangle,
    halted: [bool; 4],
    reference: Pixel,
    steps: u32,
    /// Some edge stopped at a color boundary or the exclusion zone.
    obstructed: bool,
}

impl Candidate {
    /// Places the minimal candidate around `seed`. Returns `None` when the bounds
    /// are too small, the start overlaps the exclusion zone, or some channel
    /// varies by more than the tolerance across the starting interior.
    pub fn seed(seed: Point, ctx: &GrowthContext<'_>) -> Option<Self> {
        let height = MIN_HEIGHT;
        let width = width_for_height(height);
        let bounds = ctx.bounds;
        if bounds.width < width || bounds.height < height {
            return None;
        }

        let x = seed
            .x
            .saturating_sub(width / 2)
            .clamp(bounds.x, bounds.right() - width);
        let y = seed
            .y
            .saturating_sub(height / 2)
            .clamp(bounds.y, bounds.bottom() - height);
        let rect = Rectangle::new(x, y, width, height);

        if ctx.exclusion.is_some_and(|zone| zone.intersects(&rect)) {
            return None;
        }

        if !is_uniform(ctx.frame, rect, ctx.settings.tolerance) {
            return None;
        }
        let reference = reference_color(ctx.frame, rect, ctx.settings.color_mode)?;

        Some(Self {
            rect,
            halted: [false; 4],
            reference,
            steps: 0,
            obstructed: false,
        })
    }

    /// Grows until no step is possible or the step cap is reached.
    pub fn grow(mut self, ctx: &GrowthContext<'_>) -> Self {
        while self.steps < MAX_GROWTH_STEPS && self.step(ctx) {}
        self
    }

    pub fn rect(&self) -> Rectangle {
        self.rect
    }

    pub fn reference(&self) -> Pixel {
        self.reference
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Whether the candidate expanded at least once past its minimal size.
    pub fn has_grown(&self) -> bool {
        self.steps > 0
    }

    /// Whether the result is worth reporting. A candidate that never grew only
    /// counts when the bounds alone stopped it, as on a screen no larger than
    /// the minimal box.
    pub fn is_usable(&self) -> bool {
        self.has_grown() || !self.obstructed
    }

    pub fn is_halted(&self, direction: Direction) -> bool {
        self.halted[direction.index()]
    }

    fn halt(&mut self, direction: Direction) {
        self.halted[direction.index()] = true;
    }

    /// Attempts one growth step. Returns `false` once the candidate is finished.
    fn step(&mut self, ctx: &GrowthContext<'_>) -> bool {
        for direction in Direction::ALL {
            if !self.is_halted(direction) && self.room(direction, ctx.bounds) == 0 {
                self.halt(direction);
            }
        }

        // Every failed band halts one more edge, so this settles within four rounds.
        loop {
            let Some(plan) = self.plan(ctx) else {
                return false;
            };

            let mut blocked = false;
            for direction in Direction::ALL {
                let amount = plan.amount(direction);
                if amount == 0 {
                    continue;
                }
                let band = self.band(direction, &plan, ctx);
                if self.crosses_boundary(band, direction, ctx) {
                    self.halt(direction);
                    self.obstructed = true;
                    blocked = true;
                }
            }

            if !blocked {
                self.apply(&plan);
                self.steps += 1;
                return true;
            }
        }
    }

    fn room(&self, direction: Direction, bounds: Rectangle) -> u32 {
        match direction {
            Direction::Up => self.rect.y - bounds.y,
            Direction::Down => bounds.bottom() - self.rect.bottom(),
            Direction::Left => self.rect.x - bounds.x,
            Direction::Right => bounds.right() - self.rect.right(),
        }
    }

    fn active_room(&self, direction: Direction, bounds: Rectangle) -> u32 {
        if self.is_halted(direction) {
            0
        } else {
            self.room(direction, bounds)
        }
    }

    fn plan(&self, ctx: &GrowthContext<'_>) -> Option<StepPlan> {
        let up_room = self.active_room(Direction::Up, ctx.bounds);
        let down_room = self.active_room(Direction::Down, ctx.bounds);
        let left_room = self.active_room(Direction::Left, ctx.bounds);
        let right_room = self.active_room(Direction::Right, ctx.bounds);

        let height = self.rect.height;
        let width = self.rect.width;
        let max_height = height + up_room + down_room;
        let max_width = width + left_room + right_room;

        let target_height = (height + ctx.settings.growth_pixels)
            .min(max_height)
            .min(height_for_width(max_width));
        if target_height <= height {
            return None;
        }
        let target_width = width_for_height(target_height);

        let (up, down) = split(target_height - height, up_room, down_room);
        let (left, right) = split(target_width - width, left_room, right_room);

        Some(StepPlan {
            amounts: [up, down, left, right],
        })
    }

    /// The strip just outside `direction`'s edge that the planned step would sample.
    fn band(&self, direction: Direction, plan: &StepPlan, ctx: &GrowthContext<'_>) -> Rectangle {
        let thickness = ctx
            .settings
            .wall_thickness
            .max(plan.amount(direction))
            .min(self.room(direction, ctx.bounds));
        let r = self.rect;
        let new_left = r.x - plan.amount(Direction::Left);
        let new_width = r.width + plan.amount(Direction::Left) + plan.amount(Direction::Right);

        match direction {
            Direction::Up => Rectangle::new(new_left, r.y - thickness, new_width, thickness),
            Direction::Down => Rectangle::new(new_left, r.bottom(), new_width, thickness),
            Direction::Left => Rectangle::new(r.x - thickness, r.y, thickness, r.height),
            Direction::Right => Rectangle::new(r.right(), r.y, thickness, r.height),
        }
    }

    fn crosses_boundary(&self, band: Rectangle, direction: Direction, ctx: &GrowthContext<'_>) -> bool {
        if band.is_empty() || ctx.exclusion.is_some_and(|zone| zone.intersects(&band)) {
            return true;
        }
        // Sample from the far side of the band so its outermost line is always read.
        let reverse_x = direction == Direction::Right;
        let reverse_y = direction == Direction::Down;
        let reference = self.reference;
        let tolerance = ctx.settings.tolerance;
        !all_samples(
            ctx.frame,
            band,
            ctx.settings.color_mode,
            ctx.settings.sample_rate,
            reverse_x,
            reverse_y,
            |pixel| pixel.distance(&reference) <= tolerance,
        )
    }

    fn apply(&mut self, plan: &StepPlan) {
        let up = plan.amount(Direction::Up);
        let down = plan.amount(Direction::Down);
        let left = plan.amount(Direction::Left);
        let right = plan.amount(Direction::Right);
        self.rect = Rectangle::new(
            self.rect.x - left,
            self.rect.y - up,
            self.rect.width + left + right,
            self.rect.height + up + down,
        );
    }
}

/// Splits `amount` between two opposite edges: half each, with the remainder
/// moving to whichever side still has room. Callers guarantee
/// `amount <= room_a + room_b`.
fn split(amount: u32, room_a: u32, room_b: u32) -> (u32, u32) {
    let a = (amount / 2).min(room_a);
    let b = (amount - a).min(room_b);
    (amount - b, b)
}

/// Feeds the pixels `mode` picks from `area` to `accept`, stopping at the first
/// rejection. Corners mode picks the four corners; average mode every `rate`-th
/// pixel on both axes. Returns whether every visited pixel was accepted.
fn all_samples<F>(
    frame: &Frame,
    area: Rectangle,
    mode: ColorMode,
    rate: u32,
    reverse_x: bool,
    reverse_y: bool,
    mut accept: F,
) -> bool
where
    F: FnMut(Pixel) -> bool,
{
    match mode {
        ColorMode::Corners => {
            let (x0, y0, x1, y1) = (area.x, area.y, area.right() - 1, area.bottom() - 1);
            [(x0, y0), (x1, y0), (x0, y1), (x1, y1)]
                .into_iter()
                .all(|(x, y)| accept(frame.pixel(x, y)))
        }
        ColorMode::Average => strided(area.y, area.bottom(), rate, reverse_y)
            .all(|y| strided(area.x, area.right(), rate, reverse_x).all(|x| accept(frame.pixel(x, y)))),
    }
}

/// The interior color a candidate measures its bands against.
fn reference_color(frame: &Frame, area: Rectangle, mode: ColorMode) -> Option<Pixel> {
    if area.is_empty() {
        return None;
    }
    let mut sum = PixelSum::default();
    all_samples(frame, area, mode, 1, false, false, |pixel| {
        sum.push(pixel);
        true
    });
    sum.mean()
}

/// Whether no channel spans more than `tolerance` levels across `area`.
fn is_uniform(frame: &Frame, area: Rectangle, tolerance: u8) -> bool {
    let mut low = [u8::MAX; CHANNELS];
    let mut high = [u8::MIN; CHANNELS];
    for y in area.y..area.bottom() {
        for px in frame.row_span(y, area.x, area.right()).chunks_exact(CHANNELS) {
            for c in 0..CHANNELS {
                low[c] = low[c].min(px[c]);
                high[c] = high[c].max(px[c]);
            }
        }
    }
    (0..CHANNELS).all(|c| high[c].saturating_sub(low[c]) <= tolerance)
}

/// Every `rate`-th coordinate of `[start, end)`, walking from `end - 1` when `reverse`.
#[inline]
fn strided(start: u32, end: u32, rate: u32, reverse: bool) -> impl Iterator<Item = u32> {
    let count = (end - start).div_ceil(rate);
    (0..count).map(move |i| if reverse { end - 1 - i * rate } else { start + i * rate })
}
