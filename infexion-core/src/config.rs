//! Agent configuration
//!
//! Defaults reproduce the tournament agent: the time-to-depth step schedule,
//! protected-then-safe spawning and a centre opening.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::board::Hex;
use crate::game::MAX_TOTAL_POWER;
use crate::movegen::MoveGenerator;

/// Default share of the remaining clock a single decision may use
pub const DEFAULT_DEADLINE_FRACTION: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("depth schedule thresholds must be strictly decreasing (step {index})")]
    UnsortedSchedule { index: usize },

    #[error("depth schedule depths must not increase as time shrinks (step {index})")]
    IncreasingDepth { index: usize },

    #[error("deadline fraction must be in (0, 1], got {0}")]
    BadDeadlineFraction(f32),

    #[error("saturation threshold {0} exceeds the spawn cap of {cap}", cap = MAX_TOTAL_POWER)]
    SaturationAboveCap(u32),

    #[error("opening coordinate ({r}, {q}) is off the board")]
    InvalidOpening { r: u8, q: u8 },
}

// ============================================================================
// DEPTH SCHEDULE
// ============================================================================

/// Search depth used while more than `above_secs` remain
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthStep {
    pub above_secs: f32,
    pub depth: u32,
}

/// Step function from remaining clock time to search depth
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthSchedule {
    /// Ordered from the largest threshold down
    pub steps: Vec<DepthStep>,
    /// Depth once every threshold has been passed
    pub floor: u32,
}

impl Default for DepthSchedule {
    fn default() -> Self {
        let step = |above_secs, depth| DepthStep { above_secs, depth };
        Self {
            steps: vec![step(150.0, 9), step(120.0, 7), step(60.0, 5), step(10.0, 3)],
            floor: 1,
        }
    }
}

impl DepthSchedule {
    /// Same depth regardless of the clock
    pub fn fixed(depth: u32) -> Self {
        Self {
            steps: vec![],
            floor: depth,
        }
    }

    pub fn depth_for(&self, time_remaining: f32) -> u32 {
        self.steps
            .iter()
            .find(|step| time_remaining > step.above_secs)
            .map_or(self.floor, |step| step.depth)
    }

    /// Thresholds strictly decreasing, depths non-increasing, floor last
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, pair) in self.steps.windows(2).enumerate() {
            if pair[1].above_secs >= pair[0].above_secs {
                return Err(ConfigError::UnsortedSchedule { index: index + 1 });
            }
            if pair[1].depth > pair[0].depth {
                return Err(ConfigError::IncreasingDepth { index: index + 1 });
            }
        }
        if let Some(last) = self.steps.last() {
            if self.floor > last.depth {
                return Err(ConfigError::IncreasingDepth {
                    index: self.steps.len(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// AGENT CONFIG
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub depth_schedule: DepthSchedule,
    pub generator: MoveGenerator,
    /// First spawn on an empty board
    pub opening: Hex,
    /// Hard per-decision deadline as a share of the remaining clock
    /// (`None` searches to full depth no matter how long it takes)
    pub deadline_fraction: Option<f32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            depth_schedule: DepthSchedule::default(),
            generator: MoveGenerator::default(),
            opening: Hex::CENTER,
            deadline_fraction: Some(DEFAULT_DEADLINE_FRACTION),
        }
    }
}

impl AgentConfig {
    /// Config that always searches `depth` plies
    pub fn fixed_depth(depth: u32) -> Self {
        Self {
            depth_schedule: DepthSchedule::fixed(depth),
            ..Default::default()
        }
    }

    pub fn with_depth_schedule(mut self, schedule: DepthSchedule) -> Self {
        self.depth_schedule = schedule;
        self
    }

    pub fn with_generator(mut self, generator: MoveGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_deadline_fraction(mut self, fraction: Option<f32>) -> Self {
        self.deadline_fraction = fraction;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.depth_schedule.validate()?;

        if let Some(fraction) = self.deadline_fraction {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(ConfigError::BadDeadlineFraction(fraction));
            }
        }

        if self.generator.saturation_threshold > MAX_TOTAL_POWER {
            return Err(ConfigError::SaturationAboveCap(
                self.generator.saturation_threshold,
            ));
        }

        if !self.opening.is_valid() {
            return Err(ConfigError::InvalidOpening {
                r: self.opening.r,
                q: self.opening.q,
            });
        }

        Ok(())
    }

    /// Load and validate a JSON config; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: AgentConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::SpawnHeuristic;

    #[test]
    fn test_default_schedule() {
        let schedule = DepthSchedule::default();
        assert_eq!(schedule.depth_for(180.0), 9);
        assert_eq!(schedule.depth_for(150.5), 9);
        assert_eq!(schedule.depth_for(150.0), 7);
        assert_eq!(schedule.depth_for(121.0), 7);
        assert_eq!(schedule.depth_for(90.0), 5);
        assert_eq!(schedule.depth_for(60.0), 3);
        assert_eq!(schedule.depth_for(11.0), 3);
        assert_eq!(schedule.depth_for(10.0), 1);
        assert_eq!(schedule.depth_for(0.0), 1);
        assert_eq!(schedule.depth_for(-5.0), 1);
    }

    #[test]
    fn test_schedule_monotone() {
        let schedule = DepthSchedule::default();
        let mut previous = u32::MAX;
        let mut t = 200.0f32;
        while t >= 0.0 {
            let depth = schedule.depth_for(t);
            assert!(depth <= previous, "depth rose at t={}", t);
            previous = depth;
            t -= 0.5;
        }
    }

    #[test]
    fn test_validate_schedule() {
        assert!(AgentConfig::default().validate().is_ok());

        let unsorted = DepthSchedule {
            steps: vec![
                DepthStep { above_secs: 10.0, depth: 3 },
                DepthStep { above_secs: 60.0, depth: 5 },
            ],
            floor: 1,
        };
        assert_eq!(unsorted.validate(), Err(ConfigError::UnsortedSchedule { index: 1 }));

        let rising = DepthSchedule {
            steps: vec![
                DepthStep { above_secs: 60.0, depth: 3 },
                DepthStep { above_secs: 10.0, depth: 5 },
            ],
            floor: 1,
        };
        assert_eq!(rising.validate(), Err(ConfigError::IncreasingDepth { index: 1 }));

        let high_floor = DepthSchedule {
            steps: vec![DepthStep { above_secs: 60.0, depth: 3 }],
            floor: 4,
        };
        assert!(high_floor.validate().is_err());
    }

    #[test]
    fn test_validate_fields() {
        let bad_fraction = AgentConfig::default().with_deadline_fraction(Some(1.5));
        assert_eq!(bad_fraction.validate(), Err(ConfigError::BadDeadlineFraction(1.5)));

        let generator = MoveGenerator {
            saturation_threshold: 60,
            ..MoveGenerator::default()
        };
        let too_saturated = AgentConfig::default().with_generator(generator);
        assert_eq!(too_saturated.validate(), Err(ConfigError::SaturationAboveCap(60)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "generator": { "spawn_order": ["Safe"] }, "deadline_fraction": null }"#;
        let config: AgentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.generator.spawn_order, vec![SpawnHeuristic::Safe]);
        assert_eq!(config.generator.saturation_threshold, MAX_TOTAL_POWER);
        assert_eq!(config.deadline_fraction, None);
        assert_eq!(config.depth_schedule, DepthSchedule::default());
        assert_eq!(config.opening, Hex::CENTER);
    }

    #[test]
    fn test_load_roundtrip() {
        let path = std::env::temp_dir().join(format!("infexion-config-{}.json", std::process::id()));
        let config = AgentConfig::fixed_depth(2);
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = AgentConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AgentConfig::load(Path::new("/nonexistent/infexion.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
