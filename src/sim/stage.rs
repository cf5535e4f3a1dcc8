//! Stage entities and pools
//!
//! Stages are pre-allocated in a single arena and never created or
//! destroyed mid-session: generation draws hidden instances from an
//! `available` list, poses them, and links them into the used chain;
//! reset walks them back. `linked` references are arena indices, so
//! chain traversal and teardown stay explicit.
//!
//! The chain is ordered from the end platform outward: slot 0 is the
//! fixed goal platform (stage number 0), and generated stages count up
//! away from it. The player starts on the highest-numbered stage and
//! bounces down toward zero.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use crate::config::GameConfig;
use crate::consts::END_STAGE_NUMBER;

/// Arena index of a stage instance.
pub type StageId = usize;

/// Behavior class of a stage, dispatched on landing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageKind {
    /// Plain bounce.
    Normal,
    /// Bounce plus a speed boost for the landing racer.
    Booster,
    /// Off-chain disappearing stage; landing starts its countdown.
    LongJump,
    /// Shatters into falling fragments on landing.
    Breakable,
    /// Oscillates along its local x axis.
    Moving,
}

/// What landing on a stage did, beyond the bounce itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    Bounce,
    Boost,
    DisappearStarted,
    Detonated,
    /// Landing on an already-detonated or vanished stage.
    Spent,
}

/// One shard of a breakable stage.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Accumulated displacement from the stage origin.
    pub offset: Vec3,
    /// Accumulated euler rotation.
    pub rotation: Vec3,
    /// Lateral drift direction (x, z).
    drift: Vec2,
    /// Rotation speed per axis.
    spin: Vec3,
}

impl Fragment {
    fn new(rng: &mut Pcg32, drift_speed: f32) -> Self {
        let drift = drift_speed.max(f32::EPSILON);
        Self {
            offset: Vec3::ZERO,
            rotation: Vec3::ZERO,
            drift: Vec2::new(
                rng.random_range(-drift..drift),
                rng.random_range(-drift..drift),
            ),
            spin: Vec3::new(
                rng.random_range(-2.0..2.0),
                rng.random_range(-2.0..2.0),
                rng.random_range(-2.0..2.0),
            ),
        }
    }

    fn reset(&mut self) {
        self.offset = Vec3::ZERO;
        self.rotation = Vec3::ZERO;
    }
}

/// Kind-specific runtime state.
#[derive(Debug, Clone)]
pub enum Behavior {
    Static,
    LongJump {
        /// Seconds until disappearance, once landing arms it.
        disappear_in: Option<f32>,
    },
    Breakable {
        detonated: bool,
        fragments: Vec<Fragment>,
    },
    Moving {
        /// Current oscillation displacement along local x.
        travel: f32,
        /// +1 or -1.
        direction: f32,
    },
}

/// A platform instance in the arena.
#[derive(Debug, Clone)]
pub struct Stage {
    pub kind: StageKind,
    pub position: Vec3,
    pub yaw: f32,
    pub stage_number: u32,
    /// Previous stage in the chain (closer to the goal).
    pub linked: Option<StageId>,
    pub active: bool,
    pub behavior: Behavior,
}

impl Stage {
    fn new(kind: StageKind, config: &GameConfig, rng: &mut Pcg32) -> Self {
        let behavior = match kind {
            StageKind::Normal | StageKind::Booster => Behavior::Static,
            StageKind::LongJump => Behavior::LongJump { disappear_in: None },
            StageKind::Breakable => Behavior::Breakable {
                detonated: false,
                fragments: (0..config.fragment_count)
                    .map(|_| Fragment::new(rng, config.fragment_drift))
                    .collect(),
            },
            StageKind::Moving => Behavior::Moving {
                travel: 0.0,
                direction: 1.0,
            },
        };
        Self {
            kind,
            position: Vec3::ZERO,
            yaw: 0.0,
            stage_number: END_STAGE_NUMBER,
            linked: None,
            active: false,
            behavior,
        }
    }

    /// Local x axis in world space, derived from the facing yaw.
    fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// World position including the moving-stage oscillation.
    pub fn current_position(&self) -> Vec3 {
        match &self.behavior {
            Behavior::Moving { travel, .. } => self.position + self.right() * *travel,
            _ => self.position,
        }
    }
}

/// Arena plus the available/used bookkeeping around it.
#[derive(Debug)]
pub struct StagePool {
    stages: Vec<Stage>,
    /// Hidden chain-stage instances, drawable in any order.
    available: Vec<StageId>,
    /// Hidden long-jump instances.
    long_available: Vec<StageId>,
    /// Used chain, goal first. `chain[0]` is the fixed end platform.
    chain: Vec<StageId>,
    /// Activated long-jump stages, in placement order.
    long_used: Vec<StageId>,
}

impl StagePool {
    pub fn new(config: &GameConfig, rng: &mut Pcg32) -> Self {
        let mut stages = Vec::with_capacity(1 + config.chain_pool_size() + config.long_jump_stages);

        // Slot 0: the end platform. Always active, never recycled.
        let mut end = Stage::new(StageKind::Normal, config, rng);
        end.active = true;
        stages.push(end);

        let mut available = Vec::with_capacity(config.chain_pool_size());
        let kinds = [
            (StageKind::Normal, config.normal_stages),
            (StageKind::Booster, config.booster_stages),
            (StageKind::Breakable, config.breakable_stages),
            (StageKind::Moving, config.moving_stages),
        ];
        for (kind, count) in kinds {
            for _ in 0..count {
                available.push(stages.len());
                stages.push(Stage::new(kind, config, rng));
            }
        }

        let mut long_available = Vec::with_capacity(config.long_jump_stages);
        for _ in 0..config.long_jump_stages {
            long_available.push(stages.len());
            stages.push(Stage::new(StageKind::LongJump, config, rng));
        }

        Self {
            stages,
            available,
            long_available,
            chain: vec![0],
            long_used: Vec::new(),
        }
    }

    pub fn get(&self, id: StageId) -> &Stage {
        &self.stages[id]
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn get_mut(&mut self, id: StageId) -> &mut Stage {
        &mut self.stages[id]
    }

    pub const END_PLATFORM: StageId = 0;

    pub fn chain(&self) -> &[StageId] {
        &self.chain
    }

    /// Newest chain stage (the player-start side).
    pub fn chain_tail(&self) -> StageId {
        *self.chain.last().expect("chain always holds the end platform")
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn long_available_count(&self) -> usize {
        self.long_available.len()
    }

    pub fn long_used_count(&self) -> usize {
        self.long_used.len()
    }

    /// Generated chain stages (end platform excluded).
    pub fn used_count(&self) -> usize {
        self.chain.len() - 1
    }

    /// Draw the available chain stage at `index` and append it to the
    /// chain, posed and numbered. Returns the arena id.
    pub fn place_chain_stage(
        &mut self,
        index: usize,
        position: Vec3,
        yaw: f32,
        stage_number: u32,
    ) -> StageId {
        let id = self.available.swap_remove(index);
        let linked = self.chain_tail();
        let stage = &mut self.stages[id];
        stage.position = position;
        stage.yaw = yaw;
        stage.stage_number = stage_number;
        stage.linked = Some(linked);
        stage.active = true;
        self.chain.push(id);
        id
    }

    /// Activate the available long-jump stage at `index` at a grid
    /// point. The link is geometric only; long stages are not part of
    /// the numbered chain.
    pub fn place_long_stage(&mut self, index: usize, position: Vec3) -> StageId {
        let id = self.long_available.swap_remove(index);
        let linked = self.chain_tail();
        let stage = &mut self.stages[id];
        stage.position = position;
        stage.yaw = 0.0;
        stage.linked = Some(linked);
        stage.active = true;
        self.long_used.push(id);
        id
    }

    /// Return the newest recycled stage to its pool: long stages first,
    /// then the chain back to (but never including) the end platform.
    /// One call = one stage, keeping teardown on the per-tick budget.
    pub fn release_one(&mut self) -> Option<StageId> {
        let id = self.long_used.pop().or_else(|| {
            if self.chain.len() > 1 {
                self.chain.pop()
            } else {
                None
            }
        })?;

        let stage = &mut self.stages[id];
        stage.active = false;
        stage.linked = None;
        stage.stage_number = END_STAGE_NUMBER;
        match &mut stage.behavior {
            Behavior::Static => {}
            Behavior::LongJump { disappear_in } => *disappear_in = None,
            Behavior::Breakable {
                detonated,
                fragments,
            } => {
                *detonated = false;
                for fragment in fragments {
                    fragment.reset();
                }
            }
            Behavior::Moving { travel, direction } => {
                *travel = 0.0;
                *direction = 1.0;
            }
        }

        if stage.kind == StageKind::LongJump {
            self.long_available.push(id);
        } else {
            self.available.push(id);
        }
        Some(id)
    }

    /// Landing dispatch. Mutates kind-specific state and reports what
    /// the host should react to; events for the outcome are emitted by
    /// the session so they order with the rest of the frame.
    pub fn stage_action(&mut self, id: StageId) -> StageAction {
        let stage = &mut self.stages[id];
        if !stage.active {
            return StageAction::Spent;
        }
        match &mut stage.behavior {
            Behavior::Static => {
                if stage.kind == StageKind::Booster {
                    StageAction::Boost
                } else {
                    StageAction::Bounce
                }
            }
            Behavior::LongJump { disappear_in } => {
                if disappear_in.is_none() {
                    StageAction::DisappearStarted
                } else {
                    StageAction::Bounce
                }
            }
            Behavior::Breakable { detonated, .. } => {
                if *detonated {
                    StageAction::Spent
                } else {
                    *detonated = true;
                    StageAction::Detonated
                }
            }
            Behavior::Moving { .. } => StageAction::Bounce,
        }
    }

    /// Arm a long-jump stage's countdown (paired with
    /// [`StageAction::DisappearStarted`]).
    pub fn arm_disappear(&mut self, id: StageId, seconds: f32) {
        if let Behavior::LongJump { disappear_in } = &mut self.stages[id].behavior {
            *disappear_in = Some(seconds);
        }
    }

    /// Advance moving stages, breakable fragments and long-jump
    /// countdowns by scaled time. Emits disappearance events.
    pub fn tick_behaviors(
        &mut self,
        dt: f32,
        config: &GameConfig,
        events: &mut Vec<GameEvent>,
    ) {
        for (id, stage) in self.stages.iter_mut().enumerate() {
            if !stage.active {
                continue;
            }
            match &mut stage.behavior {
                Behavior::Static => {}
                Behavior::LongJump { disappear_in } => {
                    if let Some(remaining) = disappear_in {
                        *remaining -= dt;
                        if *remaining <= 0.0 {
                            *disappear_in = None;
                            stage.active = false;
                            events.push(GameEvent::StageDisappeared { stage: id });
                        }
                    }
                }
                Behavior::Breakable {
                    detonated,
                    fragments,
                } => {
                    if *detonated {
                        for fragment in fragments.iter_mut() {
                            let world_y = stage.position.y + fragment.offset.y;
                            if world_y < config.fall_height_limit {
                                continue;
                            }
                            fragment.offset += Vec3::new(
                                fragment.drift.x,
                                config.fragment_gravity,
                                fragment.drift.y,
                            ) * dt;
                            fragment.rotation += fragment.spin * dt;
                        }
                    }
                }
                Behavior::Moving { travel, direction } => {
                    if *travel > config.move_distance && *direction > 0.0 {
                        *direction = -1.0;
                    } else if *travel < -config.move_distance && *direction < 0.0 {
                        *direction = 1.0;
                    }
                    *travel += *direction * config.move_speed * dt;
                }
            }
        }
    }
}

/// Pooled link-midpoint obstacles, placed in order and released in
/// reverse, one per tick.
#[derive(Debug)]
pub struct ObstaclePool {
    poses: Vec<(Vec3, f32)>,
    used: usize,
    capacity: usize,
}

impl ObstaclePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            poses: vec![(Vec3::ZERO, 0.0); capacity],
            used: 0,
            capacity,
        }
    }

    pub fn has_available(&self) -> bool {
        self.used < self.capacity
    }

    pub fn used_count(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pose the next obstacle; `None` when the pool is exhausted.
    pub fn place(&mut self, position: Vec3, yaw: f32) -> Option<usize> {
        if !self.has_available() {
            return None;
        }
        let index = self.used;
        self.poses[index] = (position, yaw);
        self.used += 1;
        Some(index)
    }

    /// Return the most recently placed obstacle to the pool.
    pub fn release_one(&mut self) -> Option<usize> {
        if self.used == 0 {
            return None;
        }
        self.used -= 1;
        Some(self.used)
    }
}
