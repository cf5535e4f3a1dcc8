//! Game configuration and validation
//!
//! All tunables live here so the host can ship alternate balance data.
//! Validation happens once, at session construction; the simulation
//! assumes a valid config everywhere else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::LEVEL_MAX;

/// Errors that can occur when constructing a game session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No chain stages to generate from.
    #[error("stage pool is empty")]
    EmptyStagePool,
    /// A level must contain at least one stage.
    #[error("stages_per_level must be >= 1, got {0}")]
    InvalidStageCount(u32),
    /// The grid scan needs a positive world extent.
    #[error("world_size must be > 0, got {0}")]
    InvalidWorldSize(i32),
    /// The grid scan needs a positive step.
    #[error("grid_offset must be > 0, got {0}")]
    InvalidGridOffset(i32),
    /// Obstacles are placed every Nth stage; N = 0 would divide by zero.
    #[error("obstacle_interval must be >= 1")]
    InvalidObstacleInterval,
    /// Every racer needs a skin to wear.
    #[error("model pool must cover the player plus {needed} enemies, got {got}")]
    EmptyModelPool { needed: usize, got: usize },
}

/// Full balance data for one game session.
///
/// `Default` carries the shipping balance; tests construct smaller worlds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    // === World grid ===
    /// Half-extent of the square game world.
    pub world_size: f32,
    /// Margin subtracted from `world_size` to get the generation bound.
    pub world_size_reduce: f32,
    /// Grid centre-point offset; scan step is four times this.
    pub grid_offset: f32,
    /// Random centre-point shift, 0 = none, 1 = up to one offset.
    pub grid_noise: f32,

    // === Chain layout ===
    /// Forward distance between consecutive stages.
    pub offset_stage: f32,
    /// Height gained per level.
    pub offset_height: f32,
    /// Per-stage lateral jitter bound; also the per-level side jump.
    pub offset_side: f32,
    /// Levels in this playthrough, clamped to `[1, LEVEL_MAX]`.
    pub levels: u32,
    /// Stages generated per level.
    pub stages_per_level: u32,
    /// Levels to suppress the random direction flip after a bounds flip.
    pub correction_levels: u32,

    // === Stage pools ===
    /// Plain bounce stages.
    pub normal_stages: usize,
    /// Bounce stages that grant a speed boost on landing.
    pub booster_stages: usize,
    /// Stages that detonate into fragments on landing.
    pub breakable_stages: usize,
    /// Stages that oscillate sideways.
    pub moving_stages: usize,
    /// Off-chain disappearing stages seeded from the grid scan.
    pub long_jump_stages: usize,

    // === Obstacles ===
    /// An obstacle is placed at every Nth link midpoint.
    pub obstacle_interval: u32,
    /// Obstacle pool size.
    pub obstacle_count: usize,

    // === Long jump behavior ===
    /// Probability that a sampled grid point activates a long-jump stage.
    pub long_jump_probability: f32,
    /// Seconds from landing until a long-jump stage disappears.
    pub long_jump_disappear: f32,

    // === Breakable behavior ===
    /// Fragments a breakable stage shatters into.
    pub fragment_count: usize,
    /// Downward fragment speed (negative = falling).
    pub fragment_gravity: f32,
    /// Lateral fragment drift speed bound.
    pub fragment_drift: f32,
    /// Fragments stop updating below this world height.
    pub fall_height_limit: f32,

    // === Moving-stage behavior ===
    /// Oscillation speed along the local x axis.
    pub move_speed: f32,
    /// Oscillation half-extent.
    pub move_distance: f32,

    // === Racers ===
    /// Hard cap on simultaneous enemies.
    pub enemy_max: usize,
    /// Character model (skin) pool size.
    pub model_count: usize,
    /// Stage-number label pool size.
    pub label_count: usize,

    // === Effects ===
    /// Medium shockwave instances (player landings).
    pub shockwaves_medium: usize,
    /// Small shockwave instances (enemy landings).
    pub shockwaves_small: usize,
    /// World height at which water splashes render.
    pub splash_height: f32,

    // === Slow motion ===
    /// Time scale the slow-motion effect drops to, `0 <= min < 1`.
    pub sim_speed_min: f32,
    /// Time-scale recovery per second.
    pub sim_speed_accel: f32,

    // === Standings ===
    /// Placements reported to the UI (the player is always included).
    pub standings_top: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_size: 200.0,
            world_size_reduce: 30.0,
            grid_offset: 5.0,
            grid_noise: 0.5,

            offset_stage: 10.0,
            offset_height: 20.0,
            offset_side: 5.0,
            levels: 3,
            stages_per_level: 10,
            correction_levels: 2,

            normal_stages: 56,
            booster_stages: 8,
            breakable_stages: 8,
            moving_stages: 8,
            long_jump_stages: 8,

            obstacle_interval: 4,
            obstacle_count: 16,

            long_jump_probability: 0.35,
            long_jump_disappear: 5.0,

            fragment_count: 4,
            fragment_gravity: -6.0,
            fragment_drift: 2.0,
            fall_height_limit: -10.0,

            move_speed: 2.0,
            move_distance: 2.0,

            enemy_max: 7,
            model_count: 8,
            label_count: 80,

            shockwaves_medium: 5,
            shockwaves_small: 5,
            splash_height: 0.5,

            sim_speed_min: 0.2,
            sim_speed_accel: 0.4,

            standings_top: 3,
        }
    }
}

impl GameConfig {
    /// Total chain stages in the pool (long-jump stages excluded).
    pub fn chain_pool_size(&self) -> usize {
        self.normal_stages + self.booster_stages + self.breakable_stages + self.moving_stages
    }

    /// Stages a full playthrough at `levels` needs.
    pub fn stages_per_run(&self) -> u32 {
        self.levels * self.stages_per_level
    }

    /// Generation bound used by the drift correction.
    pub fn actual_world_size(&self) -> f32 {
        self.world_size - self.world_size_reduce
    }

    /// Levels clamped to the legal range.
    pub fn clamped_levels(&self) -> u32 {
        self.levels.clamp(1, LEVEL_MAX)
    }

    /// Fail-fast validation, run once at session construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_pool_size() == 0 {
            return Err(ConfigError::EmptyStagePool);
        }
        if self.stages_per_level == 0 {
            return Err(ConfigError::InvalidStageCount(self.stages_per_level));
        }
        if self.world_size <= 0.0 || self.actual_world_size() <= 0.0 {
            return Err(ConfigError::InvalidWorldSize(self.world_size as i32));
        }
        if self.grid_offset <= 0.0 {
            return Err(ConfigError::InvalidGridOffset(self.grid_offset as i32));
        }
        if self.obstacle_interval == 0 {
            return Err(ConfigError::InvalidObstacleInterval);
        }
        let racers = 1 + self.enemy_max;
        if self.model_count < racers {
            return Err(ConfigError::EmptyModelPool {
                needed: self.enemy_max,
                got: self.model_count,
            });
        }

        // Pools are sized generously by design; a short pool is playable
        // (generation skips with a warning) but worth flagging early.
        let worst_case = (LEVEL_MAX * self.stages_per_level) as usize;
        if self.chain_pool_size() < worst_case {
            log::warn!(
                "chain pool ({}) is smaller than a max-level run ({}); generation may starve",
                self.chain_pool_size(),
                worst_case
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_stage_pool() {
        let config = GameConfig {
            normal_stages: 0,
            booster_stages: 0,
            breakable_stages: 0,
            moving_stages: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyStagePool));
    }

    #[test]
    fn test_rejects_zero_stages_per_level() {
        let config = GameConfig {
            stages_per_level: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidStageCount(0)));
    }

    #[test]
    fn test_rejects_margin_eating_world() {
        let config = GameConfig {
            world_size: 20.0,
            world_size_reduce: 25.0,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorldSize(_))
        ));
    }

    #[test]
    fn test_rejects_short_model_pool() {
        let config = GameConfig {
            model_count: 3,
            enemy_max: 7,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyModelPool { .. })
        ));
    }

    #[test]
    fn test_levels_clamp() {
        let config = GameConfig {
            levels: 99,
            ..GameConfig::default()
        };
        assert_eq!(config.clamped_levels(), LEVEL_MAX);

        let config = GameConfig {
            levels: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.clamped_levels(), 1);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = GameConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.levels, config.levels);
        assert_eq!(back.chain_pool_size(), config.chain_pool_size());
    }
}
