//! Stage-number label placement
//!
//! After generation the chain gets its floating number labels, one per
//! tick, walking the `linked` references from the player-start stage
//! down toward the goal. The end platform stays unlabeled.

use super::events::GameEvent;
use super::stage::{StageId, StagePool};

/// Budgeted label walk over the finished chain.
#[derive(Debug)]
pub struct LabelPlacer {
    capacity: usize,
    placed: usize,
    cursor: Option<StageId>,
}

impl LabelPlacer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            placed: 0,
            cursor: None,
        }
    }

    /// Begin the walk from the given stage (normally the chain tail).
    pub fn start(&mut self, from: StageId) {
        self.placed = 0;
        self.cursor = Some(from);
    }

    pub fn is_active(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn placed_count(&self) -> usize {
        self.placed
    }

    /// Abandon the walk and forget placements.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.placed = 0;
    }

    /// Place one label and advance toward the goal.
    pub fn tick(&mut self, pool: &StagePool, events: &mut Vec<GameEvent>) {
        let Some(id) = self.cursor else {
            return;
        };
        if self.placed >= self.capacity {
            log::warn!(
                "label pool exhausted after {} placements; chain stays partially labeled",
                self.placed
            );
            self.cursor = None;
            return;
        }

        let stage = pool.get(id);
        events.push(GameEvent::LabelPlaced {
            stage_number: stage.stage_number,
            position: stage.position,
        });
        self.placed += 1;

        self.cursor = match stage.linked {
            Some(next) if next != StagePool::END_PLATFORM => Some(next),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn chain_of(len: u32) -> StagePool {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut pool = StagePool::new(&GameConfig::default(), &mut rng);
        for number in 1..=len {
            pool.place_chain_stage(0, Vec3::new(0.0, 0.0, number as f32 * 10.0), 0.0, number);
        }
        pool
    }

    #[test]
    fn test_labels_walk_tail_to_goal_exclusive() {
        let pool = chain_of(4);
        let mut labels = LabelPlacer::new(16);
        labels.start(pool.chain_tail());

        let mut events = Vec::new();
        while labels.is_active() {
            labels.tick(&pool, &mut events);
        }

        let numbers: Vec<u32> = events
            .iter()
            .map(|event| match event {
                GameEvent::LabelPlaced { stage_number, .. } => *stage_number,
                _ => panic!("unexpected event"),
            })
            .collect();
        // Walks down from the start stage; the end platform gets no label
        assert_eq!(numbers, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_label_pool_exhaustion_stops_walk() {
        let pool = chain_of(6);
        let mut labels = LabelPlacer::new(2);
        labels.start(pool.chain_tail());

        let mut events = Vec::new();
        for _ in 0..10 {
            labels.tick(&pool, &mut events);
        }
        assert_eq!(events.len(), 2);
        assert!(!labels.is_active());
    }
}
