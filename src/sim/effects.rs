//! Pooled particle effect dispatch
//!
//! Shockwave rings are pooled engine-side; the sim only decides which
//! pool slot plays where, one request per tick. Medium and small rings
//! cycle through their pools with wrap-around pointers, the large ring
//! (long-jump landings) is a single instance.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::events::{GameEvent, RacerId};
use super::queue::RequestQueue;

/// Shockwave ring variants, matched to pool sizes host-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShockwaveSize {
    /// Enemy landings.
    Small,
    /// Player landings.
    Medium,
    /// Long-jump stage landings.
    Large,
}

#[derive(Debug, Clone, Copy)]
struct ParticleRequest {
    size: ShockwaveSize,
    position: Vec3,
}

/// Budgeted dispatcher for landing and ambience effects.
#[derive(Debug)]
pub struct ParticleGenerator {
    requests: RequestQueue<ParticleRequest>,
    medium_count: usize,
    medium_pointer: usize,
    small_count: usize,
    small_pointer: usize,
    splash_height: f32,
}

impl ParticleGenerator {
    pub fn new(medium_count: usize, small_count: usize, splash_height: f32) -> Self {
        Self {
            requests: RequestQueue::new(),
            medium_count,
            medium_pointer: 0,
            small_count,
            small_pointer: 0,
            splash_height,
        }
    }

    /// Queue a shockwave at a landing position.
    pub fn add_shockwave(&mut self, size: ShockwaveSize, position: Vec3) {
        self.requests.enqueue(ParticleRequest { size, position });
    }

    /// Process at most one queued effect.
    pub fn tick(&mut self, events: &mut Vec<GameEvent>) {
        let Some(request) = self.requests.begin() else {
            return;
        };
        match request.size {
            ShockwaveSize::Medium => {
                Self::place(
                    ShockwaveSize::Medium,
                    &mut self.medium_pointer,
                    self.medium_count,
                    request.position,
                    events,
                );
            }
            ShockwaveSize::Small => {
                Self::place(
                    ShockwaveSize::Small,
                    &mut self.small_pointer,
                    self.small_count,
                    request.position,
                    events,
                );
            }
            ShockwaveSize::Large => {
                events.push(GameEvent::Shockwave {
                    size: ShockwaveSize::Large,
                    instance: 0,
                    position: request.position,
                });
            }
        }
        self.requests.finish();
    }

    fn place(
        size: ShockwaveSize,
        pointer: &mut usize,
        count: usize,
        position: Vec3,
        events: &mut Vec<GameEvent>,
    ) {
        if count == 0 {
            log::warn!("no pooled {size:?} shockwaves; effect dropped");
            return;
        }
        events.push(GameEvent::Shockwave {
            size,
            instance: *pointer,
            position,
        });
        // Oldest ring gets restarted once the pool wraps
        *pointer = if *pointer + 1 >= count { 0 } else { *pointer + 1 };
    }

    /// Water splash, snapped to the configured water height.
    pub fn water_splash(&self, position: Vec3, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::WaterSplash {
            position: Vec3::new(position.x, self.splash_height, position.z),
        });
    }

    /// Race-finish celebration.
    pub fn confetti(&self, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::Confetti);
    }

    /// Show or hide the player's landing-boost feet effects.
    pub fn set_booster(&self, active: bool, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::Booster {
            racer: RacerId::Player,
            active,
        });
    }

    /// Drop pending effects and hide the booster.
    pub fn reset(&mut self, events: &mut Vec<GameEvent>) {
        self.requests.clear();
        self.set_booster(false, events);
    }

    pub fn pending(&self) -> usize {
        self.requests.len()
    }
}
