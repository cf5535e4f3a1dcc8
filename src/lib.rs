//! Bounce Race - a bouncing-platform race game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (stage generation, racers, standings)
//! - `config`: Data-driven game balance and validation
//!
//! The crate is a pure simulation library: the host engine calls
//! [`sim::GameSession::tick`] once per frame, feeds collision
//! notifications in, and drains [`sim::GameEvent`]s out to drive
//! rendering, audio and UI.

pub mod config;
pub mod sim;

pub use config::{ConfigError, GameConfig};
pub use sim::{GameEvent, GameSession, RacerId};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Stage number carried by the end platform; reaching it wins the race.
    pub const END_STAGE_NUMBER: u32 = 0;
    /// Standings value for a racer that has not touched a stage yet.
    pub const NO_STAGE: i32 = -1;
    /// Hard cap on the per-playthrough level count.
    pub const LEVEL_MAX: u32 = 8;
    /// Ticks spent in `Generating` before a stall warning is logged.
    pub const GENERATION_STALL_TICKS: u64 = 100_000;
}

/// Horizontal yaw (radians) looking from `from` toward `to`, ignoring height.
///
/// Zero yaw faces +z; positive turns toward +x.
#[inline]
pub fn flat_yaw(from: Vec3, to: Vec3) -> f32 {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    dx.atan2(dz)
}

/// Midpoint of two positions.
#[inline]
pub fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    (a + b) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_yaw_ignores_height() {
        let a = Vec3::new(0.0, 5.0, 0.0);
        let b = Vec3::new(0.0, -3.0, 10.0);
        assert!(flat_yaw(a, b).abs() < 1e-6);

        // Straight toward +x is a quarter turn
        let c = Vec3::new(10.0, 2.0, 0.0);
        assert!((flat_yaw(a, c) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_midpoint() {
        let m = midpoint(Vec3::new(2.0, 4.0, 6.0), Vec3::new(4.0, 0.0, -6.0));
        assert_eq!(m, Vec3::new(3.0, 2.0, 0.0));
    }
}
