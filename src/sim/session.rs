//! Game session root
//!
//! Owns one instance of every manager and the seeded RNG, and threads
//! references explicitly — no singletons, no globals. The host drives
//! it with `tick` plus a handful of notification calls and reads back
//! events, standings and HUD numbers.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::{ParticleGenerator, ShockwaveSize};
use super::enemy::EnemyGenerator;
use super::events::{GameEvent, RacerId};
use super::generator::{GenPhase, StageGenerator};
use super::labels::LabelPlacer;
use super::models::ModelSelector;
use super::stage::{ObstaclePool, StageAction, StageId, StageKind, StagePool};
use super::tracker::{RaceTracker, Standing};
use crate::config::{ConfigError, GameConfig};
use crate::consts::{END_STAGE_NUMBER, NO_STAGE};

/// Global time-scale multiplier for the slow-motion effect.
///
/// Dropping to the configured minimum and accelerating back to one is
/// the whole behavior; everything speed-sensitive multiplies by
/// [`SimulationSpeed::scale`].
#[derive(Debug, Clone, Copy)]
pub struct SimulationSpeed {
    scale: f32,
    min: f32,
    accel: f32,
}

impl SimulationSpeed {
    fn new(min: f32, accel: f32) -> Self {
        Self {
            scale: 1.0,
            min,
            accel,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    fn start_slow_motion(&mut self) {
        self.scale = self.min;
    }

    fn tick(&mut self, dt: f32) {
        if self.scale < 1.0 {
            self.scale = (self.scale + self.accel * dt).min(1.0);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PlayerState {
    stage_number: i32,
    finished: bool,
}

/// UI-facing state in one serializable block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: GenPhase,
    pub levels: u32,
    pub total_stages: u32,
    pub player_stage_number: i32,
    pub progress: f32,
    pub time_scale: f32,
    pub standings: Vec<Standing>,
}

/// One playthrough's worth of simulation state.
#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    rng: Pcg32,
    time: SimulationSpeed,

    pool: StagePool,
    obstacles: ObstaclePool,
    generator: StageGenerator,
    enemies: EnemyGenerator,
    models: ModelSelector,
    tracker: RaceTracker,
    particles: ParticleGenerator,
    labels: LabelPlacer,

    player: PlayerState,
    race_started: bool,
    events: Vec<GameEvent>,
    tick_count: u64,
}

impl GameSession {
    /// Validate the config and build every pool up front.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let pool = StagePool::new(&config, &mut rng);
        log::info!("session created with seed {seed}");

        Ok(Self {
            obstacles: ObstaclePool::new(config.obstacle_count),
            generator: StageGenerator::new(&config),
            enemies: EnemyGenerator::new(config.enemy_max),
            models: ModelSelector::new(config.model_count),
            tracker: RaceTracker::new(1 + config.enemy_max, config.standings_top),
            particles: ParticleGenerator::new(
                config.shockwaves_medium,
                config.shockwaves_small,
                config.splash_height,
            ),
            labels: LabelPlacer::new(config.label_count),
            time: SimulationSpeed::new(config.sim_speed_min, config.sim_speed_accel),
            player: PlayerState {
                stage_number: NO_STAGE,
                finished: false,
            },
            race_started: false,
            events: Vec::new(),
            tick_count: 0,
            pool,
            rng,
            config,
        })
    }

    /// Kick off generation of the first course.
    pub fn start(&mut self) {
        self.generator.start();
    }

    /// Launch the race (first tap after [`GameEvent::RaceReady`]).
    pub fn start_race(&mut self) {
        if self.generator.phase() != GenPhase::Running || self.race_started {
            debug_assert!(false, "start_race outside a ready course");
            log::error!(
                "start_race ignored (phase {:?}, started {})",
                self.generator.phase(),
                self.race_started
            );
            return;
        }
        self.race_started = true;
        self.enemies.start_all();
        self.particles.set_booster(true, &mut self.events);
        self.events.push(GameEvent::RaceStarted);
    }

    /// Tear the course down. `advance` grows the next playthrough by a
    /// level; pass `false` to replay after a failure.
    pub fn begin_reset(&mut self, advance: bool) {
        self.generator.begin_reset(advance);
        self.race_started = false;
        self.player.stage_number = NO_STAGE;
        self.player.finished = false;
    }

    /// Advance the whole session by one frame.
    pub fn tick(&mut self, dt: f32) {
        self.tick_count += 1;
        let scaled_dt = dt * self.time.scale();
        self.time.tick(dt);

        self.generator.tick(
            &mut self.pool,
            &mut self.obstacles,
            &mut self.labels,
            &mut self.enemies,
            &mut self.models,
            &mut self.tracker,
            &mut self.particles,
            &mut self.rng,
            &mut self.events,
        );
        self.enemies.tick(
            &self.pool,
            &mut self.models,
            &mut self.tracker,
            &mut self.rng,
            &mut self.events,
        );
        self.models.tick(&mut self.rng, &mut self.events);
        self.tracker.tick(&mut self.events);
        self.particles.tick(&mut self.events);
        self.labels.tick(&self.pool, &mut self.events);

        // Stage behaviors run on slow-motion time
        self.pool
            .tick_behaviors(scaled_dt, &self.config, &mut self.events);
    }

    /// Collision notification: `racer` bounced on `stage`.
    pub fn racer_landed(&mut self, racer: RacerId, stage: StageId) {
        if stage >= self.pool.stage_count() {
            debug_assert!(false, "landing on unknown stage {stage}");
            log::error!("landing on unknown stage {stage} ignored");
            return;
        }
        let action = self.pool.stage_action(stage);
        if action == StageAction::Spent {
            return;
        }

        let landed = self.pool.get(stage);
        let kind = landed.kind;
        let stage_number = landed.stage_number;
        let position = landed.current_position();

        let size = if kind == StageKind::LongJump {
            ShockwaveSize::Large
        } else if racer.is_player() {
            ShockwaveSize::Medium
        } else {
            ShockwaveSize::Small
        };
        self.particles.add_shockwave(size, position);

        match action {
            StageAction::Boost => {
                self.events.push(GameEvent::Booster {
                    racer,
                    active: true,
                });
            }
            StageAction::DisappearStarted => {
                self.pool
                    .arm_disappear(stage, self.config.long_jump_disappear);
            }
            StageAction::Detonated => {
                self.time.start_slow_motion();
                self.events.push(GameEvent::StageDetonated { stage });
                self.events.push(GameEvent::SlowMotionStarted);
            }
            StageAction::Bounce | StageAction::Spent => {}
        }

        // Long-jump stages sit off the numbered chain and do not move
        // the standings
        if kind != StageKind::LongJump {
            self.tracker.add_request(racer, stage_number as i32);
            if racer.is_player() {
                self.player.stage_number = stage_number as i32;
            }
        }
    }

    /// Collision notification: `racer` reached the end platform.
    pub fn racer_finished(&mut self, racer: RacerId) {
        self.tracker.add_request(racer, END_STAGE_NUMBER as i32);
        if racer.is_player() && !self.player.finished {
            self.player.finished = true;
            self.player.stage_number = END_STAGE_NUMBER as i32;
            self.particles.confetti(&mut self.events);
            self.events.push(GameEvent::LevelCompleted);
        }
    }

    /// Collision notification: the player missed the chain and hit the
    /// water at `position`.
    pub fn player_fell(&mut self, position: Vec3) {
        self.particles.water_splash(position, &mut self.events);
        self.events.push(GameEvent::LevelFailed);
    }

    // === Host queries ===

    pub fn phase(&self) -> GenPhase {
        self.generator.phase()
    }

    pub fn levels(&self) -> u32 {
        self.generator.levels()
    }

    pub fn time_scale(&self) -> f32 {
        self.time.scale()
    }

    pub fn player_start(&self) -> Vec3 {
        self.generator.player_start()
    }

    pub fn link_line(&self) -> &[Vec3] {
        self.generator.link_line()
    }

    pub fn standings(&self) -> Vec<Standing> {
        self.tracker.standings()
    }

    pub fn leader(&self) -> Option<RacerId> {
        self.tracker.leader()
    }

    pub fn model_of(&self, racer: RacerId) -> Option<usize> {
        self.models.model_of(racer)
    }

    /// Stage number under the player, once they have landed somewhere.
    pub fn current_stage_number(&self) -> Option<u32> {
        (self.player.stage_number >= 0).then_some(self.player.stage_number as u32)
    }

    /// The next stage down the chain (numbers fall toward the goal).
    pub fn next_stage_number(&self) -> Option<u32> {
        self.current_stage_number()
            .map(|number| number.saturating_sub(1))
    }

    /// Fraction of the chain behind the player, 0 at the start stage
    /// and 1 on the end platform.
    pub fn progress(&self) -> f32 {
        let total = self.generator.total_stages();
        if self.player.stage_number < 0 || total == 0 {
            return 0.0;
        }
        (1.0 - self.player.stage_number as f32 / total as f32).clamp(0.0, 1.0)
    }

    /// Hand the frame's events to the host.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Compact UI state for the HUD layer.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.generator.phase(),
            levels: self.generator.levels(),
            total_stages: self.generator.total_stages(),
            player_stage_number: self.player.stage_number,
            progress: self.progress(),
            time_scale: self.time.scale(),
            standings: self.tracker.standings(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GameConfig {
        GameConfig {
            levels: 2,
            stages_per_level: 3,
            long_jump_probability: 0.0,
            enemy_max: 3,
            model_count: 4,
            ..GameConfig::default()
        }
    }

    fn ready_session(seed: u64) -> GameSession {
        let mut session = GameSession::new(test_config(), seed).unwrap();
        session.start();
        for _ in 0..10_000 {
            if session.phase() == GenPhase::Running {
                return session;
            }
            session.tick(1.0 / 60.0);
        }
        panic!("course never became ready");
    }

    /// Chain stage ids in placement order, pulled from the event log.
    fn placed_stages(events: &[GameEvent]) -> Vec<StageId> {
        events
            .iter()
            .filter_map(|event| match event {
                GameEvent::StagePlaced { stage, kind, .. } if *kind != StageKind::LongJump => {
                    Some(*stage)
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = GameConfig {
            stages_per_level: 0,
            ..GameConfig::default()
        };
        assert!(GameSession::new(config, 1).is_err());
    }

    #[test]
    fn test_full_round_lifecycle() {
        let mut session = ready_session(99);
        let events = session.drain_events();
        let chain = placed_stages(&events);
        assert_eq!(chain.len(), 6);

        session.start_race();
        for _ in 0..10 {
            session.tick(1.0 / 60.0);
        }

        // Player bounces down the whole chain, tail first
        for &stage in chain.iter().rev() {
            session.racer_landed(RacerId::Player, stage);
            for _ in 0..4 {
                session.tick(1.0 / 60.0);
            }
        }
        assert_eq!(session.current_stage_number(), Some(1));
        assert_eq!(session.leader(), Some(RacerId::Player));
        assert!(session.progress() > 0.8);

        session.racer_finished(RacerId::Player);
        session.tick(1.0 / 60.0);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::LevelCompleted));
        assert!(events.contains(&GameEvent::Confetti));
        assert_eq!(session.progress(), 1.0);

        // Winning advances the next playthrough by one level
        session.begin_reset(true);
        for _ in 0..10_000 {
            if session.phase() == GenPhase::Running {
                break;
            }
            session.tick(1.0 / 60.0);
        }
        assert_eq!(session.phase(), GenPhase::Running);
        assert_eq!(session.levels(), 3);
        assert_eq!(session.current_stage_number(), None);
    }

    #[test]
    fn test_landing_emits_shockwaves_by_racer() {
        let mut session = ready_session(7);
        let events = session.drain_events();
        let chain = placed_stages(&events);
        session.start_race();

        session.racer_landed(RacerId::Player, chain[0]);
        session.racer_landed(RacerId::Enemy(0), chain[1]);
        for _ in 0..4 {
            session.tick(1.0 / 60.0);
        }

        let sizes: Vec<ShockwaveSize> = session
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                GameEvent::Shockwave { size, .. } => Some(size),
                _ => None,
            })
            .collect();
        assert!(sizes.contains(&ShockwaveSize::Medium));
        assert!(sizes.contains(&ShockwaveSize::Small));
    }

    #[test]
    fn test_breakable_landing_starts_slow_motion() {
        let config = GameConfig {
            normal_stages: 0,
            booster_stages: 0,
            moving_stages: 0,
            breakable_stages: 12,
            ..test_config()
        };
        let mut session = GameSession::new(config, 3).unwrap();
        session.start();
        for _ in 0..10_000 {
            if session.phase() == GenPhase::Running {
                break;
            }
            session.tick(1.0 / 60.0);
        }
        let events = session.drain_events();
        let chain = placed_stages(&events);
        session.start_race();

        session.racer_landed(RacerId::Player, chain[0]);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::SlowMotionStarted));
        assert!((session.time_scale() - 0.2).abs() < 1e-6);

        // Second landing on the shattered stage is inert
        session.racer_landed(RacerId::Player, chain[0]);
        assert!(!session
            .drain_events()
            .iter()
            .any(|event| matches!(event, GameEvent::StageDetonated { .. })));

        // Time scale accelerates back to exactly one
        for _ in 0..600 {
            session.tick(1.0 / 60.0);
        }
        assert_eq!(session.time_scale(), 1.0);
    }

    #[test]
    fn test_player_fall_splashes_and_replays() {
        let mut session = ready_session(13);
        session.drain_events();
        session.start_race();

        session.player_fell(Vec3::new(4.0, -20.0, 9.0));
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::LevelFailed));
        assert!(
            events
                .iter()
                .any(|event| matches!(event, GameEvent::WaterSplash { .. }))
        );

        session.begin_reset(false);
        for _ in 0..10_000 {
            if session.phase() == GenPhase::Running {
                break;
            }
            session.tick(1.0 / 60.0);
        }
        assert_eq!(session.levels(), 2);
    }

    #[test]
    fn test_determinism_same_seed_same_events() {
        let run = |seed: u64| -> Vec<GameEvent> {
            let mut session = GameSession::new(test_config(), seed).unwrap();
            session.start();
            let mut log = Vec::new();
            for _ in 0..2_000 {
                session.tick(1.0 / 60.0);
                log.extend(session.drain_events());
            }
            log
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    #[test]
    fn test_snapshot_serializes() {
        let session = ready_session(5);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, GenPhase::Running);
        assert_eq!(snapshot.total_stages, 6);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.levels, snapshot.levels);
        assert_eq!(back.player_stage_number, NO_STAGE);
    }

    #[test]
    fn test_hud_numbers_follow_the_chain_down() {
        let mut session = ready_session(27);
        let events = session.drain_events();
        let chain = placed_stages(&events);
        session.start_race();

        assert_eq!(session.current_stage_number(), None);
        session.racer_landed(RacerId::Player, *chain.last().unwrap());
        assert_eq!(session.current_stage_number(), Some(6));
        assert_eq!(session.next_stage_number(), Some(5));
        assert_eq!(session.progress(), 0.0);
    }
}
