// THEORY:
// `Config` is the single, strongly-typed source of every tuning knob in the
// engine. It is built once (defaults, then an optional TOML/JSON file, then
// `PIP_VISION_*` environment variables), validated once, and then handed by
// reference to each component. Nothing reads configuration ambiently.
//
// Validation rejects; it never clamps. A value outside its legal range is an
// `InvalidConfig` naming the offending field, so a typo in a config file stops
// the process at startup instead of silently degrading detection quality.

use crate::error::{Result, VisionError};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "PIP_VISION_";

/// How a band or an interior is reduced to a single reference color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Mean color over the sampled area.
    Average,
    /// Mean of the four corner pixels of the sampled area.
    Corners,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Growth attempts per detection pass.
    pub seeds: usize,
    /// Edge length, in pixels, of a change-detection block.
    pub block_size: u32,
    /// Seconds between monitoring ticks.
    pub update_rate: f64,
    /// Percentage of changed blocks above which the screen is searched again.
    pub change_threshold: f64,
    /// Maximum per-channel color distance (0-255) a boundary band may have from
    /// the interior reference before growth in that direction stops.
    pub lookahead_pixels: u32,
    /// Thickness of the band sampled just outside a growing edge.
    pub wall_thickness: u32,
    pub color_mode: ColorMode,
    /// Height added to a candidate per growth step.
    pub growth_pixels: u32,
    /// Reduce the result set to pairwise-disjoint rectangles.
    pub no_overlap: bool,
    /// Maximum seed offset, in pixels, from its grid position.
    pub jitter: u32,
    /// Seed for the jitter generator. Same seed, same seed layout.
    pub jitter_seed: u64,
    /// Stride used when averaging band pixels.
    pub pixel_sample_rate: u32,
    /// Width of the centered no-go zone, as a percentage of the frame. 0 disables.
    pub exclude_center_width: u32,
    /// Height of the centered no-go zone, as a percentage of the frame. 0 disables.
    pub exclude_center_height: u32,
    /// Growth worker threads. 0 uses one per CPU.
    pub worker_threads: usize,
    /// Nominal width of the overlay content, used for the zoom factor.
    pub content_width: u32,
    /// Nominal height of the overlay content, used for the zoom factor.
    pub content_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seeds: 100,
            block_size: 10,
            update_rate: 1.0,
            change_threshold: 50.0,
            lookahead_pixels: 15,
            wall_thickness: 5,
            color_mode: ColorMode::Average,
            growth_pixels: 5,
            no_overlap: false,
            jitter: 25,
            jitter_seed: 0,
            pixel_sample_rate: 4,
            exclude_center_width: 0,
            exclude_center_height: 0,
            worker_threads: 0,
            content_width: 1280,
            content_height: 720,
        }
    }
}

impl Config {
    /// Loads defaults, then `config_path` if it exists, then environment overrides.
    /// Files ending in `.json` are read as JSON, everything else as TOML.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let is_json = config_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        figment = if is_json {
            figment.merge(Json::file(config_path))
        } else {
            figment.merge(Toml::file(config_path))
        };
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.seeds == 0 {
            return VisionError::invalid_config("seeds must be greater than 0");
        }
        if self.block_size == 0 {
            return VisionError::invalid_config("block_size must be greater than 0");
        }
        if !self.update_rate.is_finite() || self.update_rate <= 0.0 {
            return VisionError::invalid_config(format!(
                "update_rate must be a positive number of seconds, got {}",
                self.update_rate
            ));
        }
        if !(self.change_threshold > 0.0 && self.change_threshold <= 100.0) {
            return VisionError::invalid_config(format!(
                "change_threshold must be in (0, 100], got {}",
                self.change_threshold
            ));
        }
        if self.lookahead_pixels > 255 {
            return VisionError::invalid_config(format!(
                "lookahead_pixels is a 0-255 color tolerance, got {}",
                self.lookahead_pixels
            ));
        }
        if self.wall_thickness == 0 {
            return VisionError::invalid_config("wall_thickness must be greater than 0");
        }
        if self.growth_pixels == 0 {
            return VisionError::invalid_config("growth_pixels must be greater than 0");
        }
        if self.pixel_sample_rate == 0 {
            return VisionError::invalid_config("pixel_sample_rate must be greater than 0");
        }
        if self.exclude_center_width >= 100 || self.exclude_center_height >= 100 {
            return VisionError::invalid_config(format!(
                "exclusion zone must be smaller than the screen, got {}% x {}%",
                self.exclude_center_width, self.exclude_center_height
            ));
        }
        if self.content_width == 0 || self.content_height == 0 {
            return VisionError::invalid_config("content_width and content_height must be greater than 0");
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(self.update_rate)
    }

    pub fn exclusion_enabled(&self) -> bool {
        self.exclude_center_width > 0 && self.exclude_center_height > 0
    }

    /// Number of threads the growth pool should run with.
    pub fn growth_workers(&self) -> usize {
        let workers = if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        };
        workers.min(self.seeds).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_seeds_rejected() {
        let config = Config {
            seeds: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(VisionError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let config = Config {
            block_size: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(VisionError::InvalidConfig(_))));
    }

    #[test]
    fn test_change_threshold_bounds() {
        for bad in [0.0, -1.0, 100.5, f64::NAN] {
            let config = Config {
                change_threshold: bad,
                ..Config::default()
            };
            assert!(config.validate().is_err(), "threshold {bad} should be rejected");
        }
        let config = Config {
            change_threshold: 100.0,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_growth_and_lookahead_limits() {
        let config = Config {
            growth_pixels: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            lookahead_pixels: 256,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_growth_workers_bounded_by_seeds() {
        let config = Config {
            seeds: 2,
            worker_threads: 16,
            ..Config::default()
        };
        assert_eq!(config.growth_workers(), 2);
    }

    #[test]
    fn test_load_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "pip_vision.toml",
                r#"
                seeds = 12
                block_size = 32
                color_mode = "corners"
                no_overlap = true
                "#,
            )?;

            let config = Config::load("pip_vision.toml").expect("config should load");
            assert_eq!(config.seeds, 12);
            assert_eq!(config.block_size, 32);
            assert_eq!(config.color_mode, ColorMode::Corners);
            assert!(config.no_overlap);
            assert_eq!(config.growth_pixels, Config::default().growth_pixels);
            Ok(())
        });
    }

    #[test]
    fn test_load_json_file_and_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("config.json", r#"{ "seeds": 40, "update_rate": 0.5 }"#)?;
            jail.set_env("PIP_VISION_SEEDS", "7");

            let config = Config::load("config.json").expect("config should load");
            assert_eq!(config.seeds, 7);
            assert_eq!(config.update_rate, 0.5);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load("does-not-exist.toml").expect("defaults should load");
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_file_value_is_rejected_not_clamped() {
        Jail::expect_with(|jail| {
            jail.create_file("pip_vision.toml", "seeds = 0")?;
            let result = Config::load("pip_vision.toml");
            assert!(matches!(result, Err(VisionError::InvalidConfig(_))));
            Ok(())
        });
    }

    #[test]
    fn test_unknown_color_mode_is_an_extraction_error() {
        Jail::expect_with(|jail| {
            jail.create_file("pip_vision.toml", r#"color_mode = "median""#)?;
            let result = Config::load("pip_vision.toml");
            assert!(matches!(result, Err(VisionError::Config(_))));
            Ok(())
        });
    }
}
