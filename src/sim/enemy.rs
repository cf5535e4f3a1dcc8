//! AI racer spawning
//!
//! Enemies come from a fixed pool and are walked onto the finished
//! chain one per tick: each spawn lands on the current seed stage, then
//! the seed steps down the `linked` chain so the field starts spread
//! over the last few stages. Starting and resetting drain one enemy per
//! tick under the same budget.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

use super::events::{GameEvent, RacerId};
use super::models::ModelSelector;
use super::queue::ProcessStatus;
use super::stage::{StageId, StagePool};
use super::tracker::RaceTracker;

/// A pooled AI racer.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub position: Vec3,
    pub active: bool,
    pub started: bool,
}

/// Budgeted enemy lifecycle manager.
#[derive(Debug)]
pub struct EnemyGenerator {
    enemies: Vec<Enemy>,
    available: Vec<usize>,
    used: Vec<usize>,
    status: ProcessStatus,
    requested: usize,
    process_counter: usize,
    seed: Option<StageId>,
}

impl EnemyGenerator {
    pub fn new(enemy_max: usize) -> Self {
        Self {
            enemies: vec![
                Enemy {
                    position: Vec3::ZERO,
                    active: false,
                    started: false,
                };
                enemy_max
            ],
            available: (0..enemy_max).collect(),
            used: Vec::with_capacity(enemy_max),
            status: ProcessStatus::Idle,
            requested: 0,
            process_counter: 0,
            seed: None,
        }
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    pub fn enemy(&self, index: usize) -> &Enemy {
        &self.enemies[index]
    }

    pub fn active_count(&self) -> usize {
        self.used.len()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Configure the next spawn wave: up to `requested` enemies, seeded
    /// from `stage` and walking down its links.
    pub fn setup(&mut self, requested: usize, stage: StageId) {
        let capped = requested.min(self.enemies.len());
        if capped < requested {
            log::info!("enemy request {requested} capped to pool size {capped}");
        }
        self.requested = capped;
        self.seed = Some(stage);
        self.process_counter = 0;
        self.status = ProcessStatus::Generating;
    }

    /// Activate the spawned field, one enemy per tick.
    pub fn start_all(&mut self) {
        if self.used.is_empty() {
            self.status = ProcessStatus::Idle;
            return;
        }
        self.process_counter = 0;
        self.status = ProcessStatus::Starting;
    }

    /// Return the field to the pool, one enemy per tick.
    pub fn reset(&mut self) {
        self.process_counter = 0;
        self.status = ProcessStatus::Resetting;
    }

    /// One lifecycle step per tick, by status.
    pub fn tick(
        &mut self,
        pool: &StagePool,
        models: &mut ModelSelector,
        tracker: &mut RaceTracker,
        rng: &mut Pcg32,
        events: &mut Vec<GameEvent>,
    ) {
        match self.status {
            ProcessStatus::Generating => self.spawn_one(pool, models, tracker, rng, events),
            ProcessStatus::Starting => {
                let enemy = self.used[self.process_counter];
                self.enemies[enemy].started = true;
                events.push(GameEvent::EnemyStarted { enemy });
                self.process_counter += 1;
                if self.process_counter >= self.used.len() {
                    self.status = ProcessStatus::Idle;
                }
            }
            ProcessStatus::Resetting => {
                if self.used.is_empty() {
                    self.status = ProcessStatus::Idle;
                    return;
                }
                let enemy = self.used.remove(0);
                let slot = &mut self.enemies[enemy];
                slot.active = false;
                slot.started = false;
                self.available.push(enemy);
                events.push(GameEvent::EnemyHidden { enemy });
                if self.used.is_empty() {
                    self.status = ProcessStatus::Idle;
                }
            }
            ProcessStatus::Idle => {}
        }
    }

    fn spawn_one(
        &mut self,
        pool: &StagePool,
        models: &mut ModelSelector,
        tracker: &mut RaceTracker,
        rng: &mut Pcg32,
        events: &mut Vec<GameEvent>,
    ) {
        if self.available.is_empty() {
            log::warn!("enemy pool exhausted; spawn wave cut short");
            self.status = ProcessStatus::Idle;
            return;
        }
        let seed = self.seed.unwrap_or(StagePool::END_PLATFORM);

        let index = rng.random_range(0..self.available.len());
        let enemy = self.available.swap_remove(index);
        let position = pool.get(seed).position;

        let slot = &mut self.enemies[enemy];
        slot.position = position;
        slot.active = true;
        slot.started = false;
        self.used.push(enemy);

        models.request(RacerId::Enemy(enemy));
        tracker.register(RacerId::Enemy(enemy));
        events.push(GameEvent::EnemyPlaced { enemy, position });

        // Walk the seed one stage toward the goal; hold at the chain end
        self.seed = pool.get(seed).linked.or(Some(seed));

        self.process_counter += 1;
        if self.process_counter >= self.requested {
            self.status = ProcessStatus::Idle;
        }
    }
}
