//! Host-facing simulation events
//!
//! The sim never touches engine objects directly. Every visual, audio
//! or UI consequence is queued as a `GameEvent`; the host drains the
//! buffer once per frame and maps events onto its own scene graph.
//! Events are fire-and-forget: nothing here expects a reply.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::effects::ShockwaveSize;
use super::stage::{StageId, StageKind};

/// Identity of a participant in the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RacerId {
    Player,
    /// Index into the enemy pool.
    Enemy(usize),
}

impl RacerId {
    pub fn is_player(&self) -> bool {
        matches!(self, RacerId::Player)
    }
}

/// One frame-ordered notification to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A stage instance was activated and posed in the world.
    StagePlaced {
        stage: StageId,
        kind: StageKind,
        stage_number: u32,
        position: Vec3,
        yaw: f32,
    },
    /// A stage instance was deactivated and returned to its pool.
    StageHidden { stage: StageId },
    /// An obstacle was posed at a link midpoint.
    ObstaclePlaced {
        obstacle: usize,
        position: Vec3,
        yaw: f32,
    },
    /// An obstacle was returned to its pool.
    ObstacleHidden { obstacle: usize },
    /// A stage-number label was parented to a stage.
    LabelPlaced { stage_number: u32, position: Vec3 },
    /// A pooled shockwave ring should play at a position.
    Shockwave {
        size: ShockwaveSize,
        /// Pool slot of the effect instance to (re)start.
        instance: usize,
        position: Vec3,
    },
    /// Water splash at the configured splash height.
    WaterSplash { position: Vec3 },
    /// Race-finish celebration burst.
    Confetti,
    /// Show or hide the landing-boost feet effects on a racer.
    Booster { racer: RacerId, active: bool },
    /// A breakable stage shattered into fragments.
    StageDetonated { stage: StageId },
    /// A long-jump stage's countdown elapsed.
    StageDisappeared { stage: StageId },
    /// A character model (skin) was assigned to a racer.
    ModelAssigned { racer: RacerId, model: usize },
    /// A skin went back to the selector pool.
    ModelReleased { model: usize },
    /// An enemy was posed at its spawn stage.
    EnemyPlaced { enemy: usize, position: Vec3 },
    /// An enemy began racing.
    EnemyStarted { enemy: usize },
    /// An enemy was returned to its pool.
    EnemyHidden { enemy: usize },
    /// Generation and placement finished; the course is ready.
    RaceReady { player_start: Vec3 },
    /// All racers are live.
    RaceStarted,
    /// The crown moved to a new leader.
    LeaderChanged { racer: RacerId },
    /// The player reached the end platform.
    LevelCompleted,
    /// The player fell; the level will replay at the same length.
    LevelFailed,
    /// Breakable detonation kicked off the global slow-motion effect.
    SlowMotionStarted,
}
