//! Stage chain generation
//!
//! The level builder. Drives the whole round lifecycle as a state
//! machine — generate the chain, finalize actors, run the race, tear
//! down, regenerate — spending at most one structural step per tick.
//!
//! Chain geometry: forward distance accumulates per stage with a step
//! whose sign flips once per level at random, height rises per level,
//! and lateral position takes small per-stage jitter plus a larger
//! per-level jump. When the accumulated distance drifts past the
//! playable bound the step sign is forced to flip and the per-level
//! random flip is suppressed for a fixed window of levels, pulling the
//! chain back inside before the wandering resumes.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::ParticleGenerator;
use super::enemy::EnemyGenerator;
use super::events::{GameEvent, RacerId};
use super::grid::GridGenerator;
use super::labels::LabelPlacer;
use super::models::ModelSelector;
use super::queue::{ProcessStatus, RequestQueue};
use super::stage::{ObstaclePool, StagePool};
use super::tracker::RaceTracker;
use crate::config::GameConfig;
use crate::consts::{GENERATION_STALL_TICKS, LEVEL_MAX};
use crate::{flat_yaw, midpoint};

/// Round lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenPhase {
    Idle,
    Generating,
    Placing,
    Running,
    Resetting,
}

/// A queued structural step: draw one pooled instance by index.
#[derive(Debug, Clone, Copy)]
enum StageRequest {
    Chain { index: usize },
    Long { index: usize },
}

/// The level/stage topology builder.
#[derive(Debug)]
pub struct StageGenerator {
    grid: GridGenerator,
    requests: RequestQueue<StageRequest>,
    phase: GenPhase,

    // Balance mirrored from config
    offset_stage_base: f32,
    offset_height: f32,
    offset_side: f32,
    stages_per_level: u32,
    correction_levels: u32,
    obstacle_interval: u32,
    long_jump_probability: f32,

    /// Levels this playthrough; grows by one per completed round.
    levels: u32,

    // Generation accumulators
    offset_stage: f32,
    distance: f32,
    height: f32,
    side: f32,
    level_current: u32,
    stage_counter: u32,
    stage_number_counter: u32,
    /// −1 = no correction window active.
    correction_counter: i32,
    obstacle_cursor: u32,

    link_line: Vec<Vec3>,
    player_start: Vec3,
    placed: bool,
    advance_on_reset: bool,
    stall_ticks: u64,
}

impl StageGenerator {
    pub fn new(config: &GameConfig) -> Self {
        let levels = config.clamped_levels();
        if levels != config.levels {
            log::info!("level count {} clamped to {levels}", config.levels);
        }
        let line_capacity = (2 * levels * config.stages_per_level) as usize;
        Self {
            grid: GridGenerator::new(
                config.world_size,
                config.world_size_reduce,
                config.grid_offset,
                config.grid_noise,
            ),
            requests: RequestQueue::new(),
            phase: GenPhase::Idle,

            offset_stage_base: config.offset_stage,
            offset_height: config.offset_height,
            offset_side: config.offset_side,
            stages_per_level: config.stages_per_level,
            correction_levels: config.correction_levels,
            obstacle_interval: config.obstacle_interval,
            long_jump_probability: config.long_jump_probability,

            levels,

            offset_stage: config.offset_stage,
            distance: 0.0,
            height: 0.0,
            side: 0.0,
            level_current: 0,
            stage_counter: 0,
            stage_number_counter: 1,
            correction_counter: -1,
            obstacle_cursor: 1,

            link_line: Vec::with_capacity(line_capacity.saturating_sub(1)),
            player_start: Vec3::ZERO,
            placed: false,
            advance_on_reset: true,
            stall_ticks: 0,
        }
    }

    pub fn phase(&self) -> GenPhase {
        self.phase
    }

    /// Levels in the current playthrough.
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Numbered stages a full chain holds this playthrough.
    pub fn total_stages(&self) -> u32 {
        self.levels * self.stages_per_level
    }

    /// Where the player is dropped at race start (the last generated
    /// stage, at the far end of the chain from the goal).
    pub fn player_start(&self) -> Vec3 {
        self.player_start
    }

    /// Polyline for the link-line renderer: one self point per stage
    /// plus a midpoint per consecutive pair.
    pub fn link_line(&self) -> &[Vec3] {
        &self.link_line
    }

    /// Accumulated forward distance of the chain head.
    pub fn chain_distance(&self) -> f32 {
        self.distance
    }

    fn in_correction(&self) -> bool {
        self.correction_counter > -1 && (self.correction_counter as u32) < self.correction_levels
    }

    /// Leave `Idle` and begin building the first chain.
    pub fn start(&mut self) {
        if self.phase != GenPhase::Idle {
            debug_assert!(false, "start() outside Idle");
            log::error!("generation start ignored in phase {:?}", self.phase);
            return;
        }
        log::info!(
            "generating {} levels of {} stages",
            self.levels,
            self.stages_per_level
        );
        self.phase = GenPhase::Generating;
    }

    /// Tear the round down. `advance` rolls the next playthrough to one
    /// more level (capped); a failed round replays at the same length.
    pub fn begin_reset(&mut self, advance: bool) {
        if self.phase != GenPhase::Running {
            debug_assert!(false, "begin_reset() outside Running");
            log::error!("reset ignored in phase {:?}", self.phase);
            return;
        }
        self.advance_on_reset = advance;
        self.requests.clear();
        self.phase = GenPhase::Resetting;
    }

    /// One lifecycle step per tick.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        pool: &mut StagePool,
        obstacles: &mut ObstaclePool,
        labels: &mut LabelPlacer,
        enemies: &mut EnemyGenerator,
        models: &mut ModelSelector,
        tracker: &mut RaceTracker,
        particles: &mut ParticleGenerator,
        rng: &mut Pcg32,
        events: &mut Vec<GameEvent>,
    ) {
        match self.phase {
            GenPhase::Idle | GenPhase::Running => {}
            GenPhase::Generating => self.tick_generating(pool, obstacles, rng, events),
            GenPhase::Placing => {
                self.tick_placing(pool, labels, enemies, models, tracker, events)
            }
            GenPhase::Resetting => self.tick_resetting(
                pool, obstacles, labels, enemies, models, tracker, particles, events,
            ),
        }
    }

    fn tick_generating(
        &mut self,
        pool: &mut StagePool,
        obstacles: &mut ObstaclePool,
        rng: &mut Pcg32,
        events: &mut Vec<GameEvent>,
    ) {
        self.stall_ticks += 1;
        if self.stall_ticks == GENERATION_STALL_TICKS {
            log::warn!(
                "generation has not finished after {GENERATION_STALL_TICKS} ticks \
                 (level {}/{}, stage {}/{})",
                self.level_current,
                self.levels,
                self.stage_counter,
                self.stages_per_level
            );
        }

        if self.level_current < self.levels {
            if self.stage_counter < self.stages_per_level {
                if let Some(request) = self.requests.begin() {
                    self.process_request(request, pool, obstacles, rng, events);
                    self.requests.finish();
                } else if self.requests.is_empty() {
                    if pool.available_count() == 0 {
                        log::warn!(
                            "stage pool exhausted at level {} stage {}; stage skipped",
                            self.level_current,
                            self.stage_counter
                        );
                        self.stage_counter += 1;
                    } else {
                        self.requests.enqueue(StageRequest::Chain {
                            index: rng.random_range(0..pool.available_count()),
                        });
                    }
                }
            } else {
                self.advance_level(rng);
            }
        } else if self.long_jump_probability > 0.0
            && pool.long_available_count() > 0
            && self.grid.has_points()
        {
            if let Some(request) = self.requests.begin() {
                self.process_request(request, pool, obstacles, rng, events);
                self.requests.finish();
            } else if self.requests.is_empty() {
                self.requests.enqueue(StageRequest::Long {
                    index: rng.random_range(0..pool.long_available_count()),
                });
            }
        } else {
            log::info!(
                "chain complete: {} stages over {} levels, {} long-jump stages",
                self.stage_number_counter - 1,
                self.levels,
                pool.long_used_count()
            );
            self.placed = false;
            self.phase = GenPhase::Placing;
        }
    }

    fn process_request(
        &mut self,
        request: StageRequest,
        pool: &mut StagePool,
        obstacles: &mut ObstaclePool,
        rng: &mut Pcg32,
        events: &mut Vec<GameEvent>,
    ) {
        match request {
            StageRequest::Chain { index } => {
                if index < pool.available_count() {
                    self.place_chain_stage(index, pool, obstacles, rng, events);
                    self.stall_ticks = 0;
                }
            }
            StageRequest::Long { index } => {
                if index < pool.long_available_count() {
                    self.place_long_stage(index, pool, rng, events);
                    self.stall_ticks = 0;
                }
            }
        }
    }

    fn place_chain_stage(
        &mut self,
        index: usize,
        pool: &mut StagePool,
        obstacles: &mut ObstaclePool,
        rng: &mut Pcg32,
        events: &mut Vec<GameEvent>,
    ) {
        self.distance += self.offset_stage;
        // The first stage of each level continues straight off the
        // level jump; the rest wander sideways.
        if self.stage_counter != 0 && self.offset_side > 0.0 {
            self.side += rng.random_range(-self.offset_side..=self.offset_side);
        }
        let position = Vec3::new(self.side, self.height, self.distance);

        let previous = pool.chain_tail();
        let previous_position = pool.get(previous).position;
        let yaw = flat_yaw(position, previous_position);

        let stage_number = self.stage_number_counter;
        self.stage_number_counter += 1;

        let id = pool.place_chain_stage(index, position, yaw, stage_number);
        events.push(GameEvent::StagePlaced {
            stage: id,
            kind: pool.get(id).kind,
            stage_number,
            position,
            yaw,
        });

        self.add_link_points(position, previous_position, yaw, pool, obstacles, events);
        self.stage_counter += 1;
    }

    /// Self point, plus a midpoint toward the previous stage once the
    /// chain has two generated stages. Every Nth midpoint hosts an
    /// obstacle sharing the newest stage's yaw; plain midpoints keep
    /// the previous stage's x so the line hugs the chain.
    fn add_link_points(
        &mut self,
        position: Vec3,
        previous_position: Vec3,
        yaw: f32,
        pool: &StagePool,
        obstacles: &mut ObstaclePool,
        events: &mut Vec<GameEvent>,
    ) {
        if pool.used_count() > 1 {
            let mid = midpoint(position, previous_position);
            if self.obstacle_cursor == self.obstacle_interval && obstacles.has_available() {
                if let Some(obstacle) = obstacles.place(mid, yaw) {
                    events.push(GameEvent::ObstaclePlaced {
                        obstacle,
                        position: mid,
                        yaw,
                    });
                }
                self.link_line.push(mid);
            } else {
                self.link_line
                    .push(Vec3::new(previous_position.x, mid.y, mid.z));
            }
        }
        self.link_line.push(position);

        self.obstacle_cursor = if self.obstacle_cursor + 1 > self.obstacle_interval {
            1
        } else {
            self.obstacle_cursor + 1
        };
    }

    fn place_long_stage(
        &mut self,
        index: usize,
        pool: &mut StagePool,
        rng: &mut Pcg32,
        events: &mut Vec<GameEvent>,
    ) {
        // The grid point is consumed either way; the roll only decides
        // whether a stage appears on it.
        let point = self.grid.next_point(rng);
        if rng.random::<f32>() <= self.long_jump_probability {
            let id = pool.place_long_stage(index, point);
            events.push(GameEvent::StagePlaced {
                stage: id,
                kind: pool.get(id).kind,
                stage_number: pool.get(id).stage_number,
                position: point,
                yaw: 0.0,
            });
        }
    }

    fn advance_level(&mut self, rng: &mut Pcg32) {
        self.stage_counter = 0;
        self.level_current += 1;
        self.height += self.offset_height;

        // Level-to-level lateral jump, 50/50 either side
        self.side += if rng.random_bool(0.5) {
            -self.offset_side
        } else {
            self.offset_side
        };

        // Drifted out of the playable area: force the chain back and
        // open the correction window
        let bound = self.grid.actual_world_size();
        if self.distance >= bound || self.distance <= -bound {
            self.offset_stage = -self.offset_stage;
            self.correction_counter = 0;
            log::debug!(
                "bounds correction at level {}: distance {:.1} vs bound {:.1}",
                self.level_current,
                self.distance,
                bound
            );
        }

        if self.in_correction() {
            self.correction_counter += 1;
        } else {
            // Normal wandering: 50/50 direction flip per level
            if rng.random_bool(0.5) {
                self.offset_stage = -self.offset_stage;
            }
        }
    }

    fn tick_placing(
        &mut self,
        pool: &StagePool,
        labels: &mut LabelPlacer,
        enemies: &mut EnemyGenerator,
        models: &mut ModelSelector,
        tracker: &mut RaceTracker,
        events: &mut Vec<GameEvent>,
    ) {
        if !self.placed {
            let tail = pool.chain_tail();
            self.player_start = pool.get(tail).position;

            labels.start(tail);

            // Enemies seed one stage down from the player start and
            // scale with the level count
            let seed = pool.get(tail).linked.unwrap_or(StagePool::END_PLATFORM);
            enemies.setup(self.levels as usize, seed);

            models.start_generating();
            models.request(RacerId::Player);
            tracker.register(RacerId::Player);

            self.placed = true;
        } else if enemies.status() == ProcessStatus::Idle {
            self.phase = GenPhase::Running;
            events.push(GameEvent::RaceReady {
                player_start: self.player_start,
            });
            log::info!("course ready; race can start");
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn tick_resetting(
        &mut self,
        pool: &mut StagePool,
        obstacles: &mut ObstaclePool,
        labels: &mut LabelPlacer,
        enemies: &mut EnemyGenerator,
        models: &mut ModelSelector,
        tracker: &mut RaceTracker,
        particles: &mut ParticleGenerator,
        events: &mut Vec<GameEvent>,
    ) {
        if let Some(stage) = pool.release_one() {
            events.push(GameEvent::StageHidden { stage });
        } else if let Some(obstacle) = obstacles.release_one() {
            events.push(GameEvent::ObstacleHidden { obstacle });
        } else {
            enemies.reset();
            models.reset();
            tracker.reset();
            labels.reset();
            particles.reset(events);

            if self.advance_on_reset {
                let next = (self.levels + 1).min(LEVEL_MAX);
                if next != self.levels {
                    log::info!("round won; next playthrough runs {next} levels");
                }
                self.levels = next;
            } else {
                log::info!("round failed; replaying at {} levels", self.levels);
            }

            self.offset_stage = self.offset_stage_base;
            self.distance = 0.0;
            self.height = 0.0;
            self.side = 0.0;
            self.level_current = 0;
            self.stage_counter = 0;
            self.stage_number_counter = 1;
            self.correction_counter = -1;
            self.obstacle_cursor = 1;
            self.stall_ticks = 0;
            self.placed = false;
            self.grid.reset();
            self.link_line.clear();

            self.phase = GenPhase::Generating;
        }
    }
}
