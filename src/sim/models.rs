//! Character model (skin) assignment
//!
//! A finite pool of visual skins is handed out to requesting racers:
//! request order is FIFO, one assignment per tick, but the skin picked
//! for each request is uniform over whatever is still available. Reset
//! walks the used list back into the pool one skin per tick.

use rand::Rng;
use rand_pcg::Pcg32;

use super::events::{GameEvent, RacerId};
use super::queue::{ProcessStatus, RequestQueue};

/// Pool-based skin selector.
#[derive(Debug)]
pub struct ModelSelector {
    available: Vec<usize>,
    in_use: Vec<usize>,
    assigned: Vec<(RacerId, usize)>,
    requests: RequestQueue<RacerId>,
    status: ProcessStatus,
}

impl ModelSelector {
    pub fn new(model_count: usize) -> Self {
        Self {
            available: (0..model_count).collect(),
            in_use: Vec::with_capacity(model_count),
            assigned: Vec::with_capacity(model_count),
            requests: RequestQueue::new(),
            status: ProcessStatus::Idle,
        }
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    /// Skin currently worn by a racer, if one was assigned.
    pub fn model_of(&self, racer: RacerId) -> Option<usize> {
        self.assigned
            .iter()
            .find(|(who, _)| *who == racer)
            .map(|(_, model)| *model)
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use.len()
    }

    /// Queue a racer for a skin.
    pub fn request(&mut self, racer: RacerId) {
        log::debug!("model requested for {racer:?}");
        self.requests.enqueue(racer);
    }

    /// Begin serving queued requests.
    pub fn start_generating(&mut self) {
        self.status = ProcessStatus::Generating;
    }

    /// Begin returning skins to the pool, dropping unserved requests.
    pub fn reset(&mut self) {
        self.status = ProcessStatus::Resetting;
        self.requests.clear();
    }

    /// One assignment or one return per tick, by status.
    pub fn tick(&mut self, rng: &mut Pcg32, events: &mut Vec<GameEvent>) {
        match self.status {
            ProcessStatus::Generating => {
                let Some(racer) = self.requests.begin() else {
                    return;
                };
                if self.available.is_empty() {
                    log::warn!("model pool exhausted; {racer:?} keeps the default skin");
                } else {
                    let index = rng.random_range(0..self.available.len());
                    let model = self.available.swap_remove(index);
                    self.in_use.push(model);
                    self.assigned.push((racer, model));
                    events.push(GameEvent::ModelAssigned { racer, model });
                }
                self.requests.finish();
            }
            ProcessStatus::Resetting => {
                if self.in_use.is_empty() {
                    self.assigned.clear();
                    self.status = ProcessStatus::Idle;
                    return;
                }
                let model = self.in_use.remove(0);
                self.available.push(model);
                events.push(GameEvent::ModelReleased { model });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_assignment_is_fifo_and_exclusive() {
        let mut models = ModelSelector::new(4);
        let mut rng = Pcg32::seed_from_u64(11);
        let mut events = Vec::new();

        models.request(RacerId::Player);
        models.request(RacerId::Enemy(0));
        models.request(RacerId::Enemy(1));
        models.start_generating();

        for _ in 0..3 {
            models.tick(&mut rng, &mut events);
        }

        let order: Vec<RacerId> = events
            .iter()
            .map(|event| match event {
                GameEvent::ModelAssigned { racer, .. } => *racer,
                _ => panic!("unexpected event"),
            })
            .collect();
        assert_eq!(
            order,
            vec![RacerId::Player, RacerId::Enemy(0), RacerId::Enemy(1)]
        );

        // No skin assigned twice
        let mut worn: Vec<usize> = events
            .iter()
            .map(|event| match event {
                GameEvent::ModelAssigned { model, .. } => *model,
                _ => unreachable!(),
            })
            .collect();
        worn.sort_unstable();
        worn.dedup();
        assert_eq!(worn.len(), 3);
        assert_eq!(models.in_use_count(), 3);
        assert_eq!(models.available_count(), 1);
    }

    #[test]
    fn test_exhausted_pool_drops_request_with_warning() {
        let mut models = ModelSelector::new(1);
        let mut rng = Pcg32::seed_from_u64(11);
        let mut events = Vec::new();

        models.request(RacerId::Player);
        models.request(RacerId::Enemy(0));
        models.start_generating();
        models.tick(&mut rng, &mut events);
        models.tick(&mut rng, &mut events);

        assert_eq!(events.len(), 1);
        assert_eq!(models.model_of(RacerId::Enemy(0)), None);
    }

    #[test]
    fn test_reset_conserves_pool_one_per_tick() {
        let mut models = ModelSelector::new(3);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut events = Vec::new();

        for racer in [RacerId::Player, RacerId::Enemy(0), RacerId::Enemy(1)] {
            models.request(racer);
        }
        models.start_generating();
        for _ in 0..3 {
            models.tick(&mut rng, &mut events);
        }

        models.reset();
        let mut returns = 0;
        while models.status() == ProcessStatus::Resetting {
            models.tick(&mut rng, &mut events);
            returns += 1;
        }
        // Three returns plus the tick that notices the empty used list
        assert_eq!(returns, 4);
        assert_eq!(models.available_count(), 3);
        assert_eq!(models.in_use_count(), 0);
        assert_eq!(models.model_of(RacerId::Player), None);
    }
}
