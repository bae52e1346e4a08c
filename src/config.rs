//! Timing of the phase cycling loop.
//!
//! Defaults match a real light: a phase lasts somewhere between four and six
//! seconds. Every field can be overridden from the environment:
//!
//! ```text
//! TRAFFIC_LIGHT_MIN_CYCLE_MS=4000
//! TRAFFIC_LIGHT_MAX_CYCLE_MS=6000
//! TRAFFIC_LIGHT_INTER_CYCLE_DELAY_MS=1
//! ```

use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_MIN_CYCLE_MS: u64 = 4000;
pub const DEFAULT_MAX_CYCLE_MS: u64 = 6000;
pub const DEFAULT_INTER_CYCLE_DELAY_MS: u64 = 1;

pub const ENV_MIN_CYCLE_MS: &str = "TRAFFIC_LIGHT_MIN_CYCLE_MS";
pub const ENV_MAX_CYCLE_MS: &str = "TRAFFIC_LIGHT_MAX_CYCLE_MS";
pub const ENV_INTER_CYCLE_DELAY_MS: &str = "TRAFFIC_LIGHT_INTER_CYCLE_DELAY_MS";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleConfig {
    /// Shortest phase, inclusive.
    pub min_cycle_ms: u64,
    /// Longest phase, exclusive.
    pub max_cycle_ms: u64,
    /// Pause after publishing a phase change.
    pub inter_cycle_delay_ms: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            min_cycle_ms: DEFAULT_MIN_CYCLE_MS,
            max_cycle_ms: DEFAULT_MAX_CYCLE_MS,
            inter_cycle_delay_ms: DEFAULT_INTER_CYCLE_DELAY_MS,
        }
    }
}

impl CycleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from defaults, overriding every key `lookup` resolves.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            min_cycle_ms: parse_or(&lookup, ENV_MIN_CYCLE_MS, defaults.min_cycle_ms),
            max_cycle_ms: parse_or(&lookup, ENV_MAX_CYCLE_MS, defaults.max_cycle_ms),
            inter_cycle_delay_ms: parse_or(
                &lookup,
                ENV_INTER_CYCLE_DELAY_MS,
                defaults.inter_cycle_delay_ms,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_cycle_ms >= self.max_cycle_ms {
            return Err(ConfigError::EmptyCycleRange {
                min: self.min_cycle_ms,
                max: self.max_cycle_ms,
            });
        }
        Ok(())
    }

    /// Draws a phase length uniformly from `[min_cycle_ms, max_cycle_ms)`.
    pub fn draw_cycle<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.gen_range(self.min_cycle_ms..self.max_cycle_ms))
    }

    pub fn inter_cycle_delay(&self) -> Duration {
        Duration::from_millis(self.inter_cycle_delay_ms)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring {key}={raw:?}, not a number; using {default}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use tracing_test::traced_test;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = CycleConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CycleConfig::default());
        assert_eq!(config.min_cycle_ms, 4000);
        assert_eq!(config.max_cycle_ms, 6000);
        assert_eq!(config.inter_cycle_delay(), Duration::from_millis(1));
    }

    #[test]
    fn overrides() {
        let config = CycleConfig::from_lookup(lookup_from(&[
            (ENV_MIN_CYCLE_MS, "10"),
            (ENV_MAX_CYCLE_MS, " 20 "),
            (ENV_INTER_CYCLE_DELAY_MS, "0"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            CycleConfig {
                min_cycle_ms: 10,
                max_cycle_ms: 20,
                inter_cycle_delay_ms: 0,
            }
        );
    }

    #[test]
    #[traced_test]
    fn garbage_falls_back_to_default() {
        let config =
            CycleConfig::from_lookup(lookup_from(&[(ENV_MAX_CYCLE_MS, "soon")])).unwrap();

        assert_eq!(config.max_cycle_ms, DEFAULT_MAX_CYCLE_MS);
        assert!(logs_contain("ignoring TRAFFIC_LIGHT_MAX_CYCLE_MS"));
    }

    #[test]
    fn empty_range_is_rejected() {
        let err = CycleConfig::from_lookup(lookup_from(&[(ENV_MIN_CYCLE_MS, "6000")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptyCycleRange { min: 6000, max: 6000 });
    }

    #[test]
    fn draws_stay_in_range_and_spread_evenly() {
        let config = CycleConfig::default();
        let mut rng = StdRng::seed_from_u64(42);

        // four 500 ms wide buckets over [4000, 6000)
        let mut buckets = [0u32; 4];
        let samples = 40_000;
        for _ in 0..samples {
            let ms = config.draw_cycle(&mut rng).as_millis() as u64;
            assert!((4000..6000).contains(&ms), "{ms} ms out of range");
            buckets[((ms - 4000) / 500) as usize] += 1;
        }

        let expected = samples / 4;
        for (i, count) in buckets.iter().enumerate() {
            let deviation = count.abs_diff(expected) as f64 / expected as f64;
            assert!(deviation < 0.05, "bucket {i} has {count}, expected ~{expected}");
        }
    }
}
