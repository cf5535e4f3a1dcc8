//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Tick driven only, no internal timers
//! - Seeded RNG only
//! - Structural work budgeted to one request per subsystem per tick
//! - No rendering or platform dependencies

pub mod effects;
pub mod enemy;
pub mod events;
pub mod generator;
pub mod grid;
pub mod labels;
pub mod models;
pub mod queue;
pub mod session;
pub mod stage;
pub mod tracker;

pub use effects::{ParticleGenerator, ShockwaveSize};
pub use enemy::EnemyGenerator;
pub use events::{GameEvent, RacerId};
pub use generator::{GenPhase, StageGenerator};
pub use grid::GridGenerator;
pub use labels::LabelPlacer;
pub use models::ModelSelector;
pub use queue::{ProcessStatus, RequestQueue};
pub use session::{GameSession, SessionSnapshot};
pub use stage::{ObstaclePool, Stage, StageId, StageKind, StagePool};
pub use tracker::{RaceTracker, Standing};
