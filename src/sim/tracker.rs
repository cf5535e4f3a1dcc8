//! Race standings
//!
//! Standings are a fixed-capacity array of racer handles re-sorted in
//! place whenever a stage-number update is flushed through the request
//! queue. Insertion sort is deliberate: between consecutive updates the
//! array is already sorted except for the one racer that just landed,
//! so the real work is near-linear despite the worst case.
//!
//! Ranking rule: a racer with no stage yet (−1) ranks last; otherwise a
//! lower stage number ranks higher, because numbers count down toward
//! the end platform at zero.

use serde::{Deserialize, Serialize};

use super::events::{GameEvent, RacerId};
use super::queue::RequestQueue;
use crate::consts::NO_STAGE;

/// One racer's slot in the standings array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RacerEntry {
    pub racer: RacerId,
    pub stage_number: i32,
}

/// A reported placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based rank.
    pub rank: usize,
    pub racer: RacerId,
    pub stage_number: i32,
}

#[derive(Debug, Clone, Copy)]
struct PositionUpdate {
    racer: RacerId,
    stage_number: i32,
}

/// Sort key: racers without a stage sink below everyone, then lower
/// stage numbers first.
fn rank_key(entry: &RacerEntry) -> (bool, i32) {
    (entry.stage_number == NO_STAGE, entry.stage_number)
}

/// In-place stable insertion sort. Returns the number of shifted
/// entries so tests can assert the no-op case.
fn insertion_sort(entries: &mut [RacerEntry]) -> usize {
    let mut moves = 0;
    for i in 1..entries.len() {
        let current = entries[i];
        let mut j = i;
        while j > 0 && rank_key(&entries[j - 1]) > rank_key(&current) {
            entries[j] = entries[j - 1];
            j -= 1;
            moves += 1;
        }
        entries[j] = current;
    }
    moves
}

/// Standings tracker fed by landing notifications.
#[derive(Debug)]
pub struct RaceTracker {
    entries: Vec<RacerEntry>,
    capacity: usize,
    top_n: usize,
    leader: Option<RacerId>,
    requests: RequestQueue<PositionUpdate>,
}

impl RaceTracker {
    pub fn new(capacity: usize, top_n: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            top_n,
            leader: None,
            requests: RequestQueue::new(),
        }
    }

    /// Add a racer to the standings with no stage yet. Re-registering
    /// clears the racer's previous standing.
    pub fn register(&mut self, racer: RacerId) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.racer == racer) {
            entry.stage_number = NO_STAGE;
            return;
        }
        if self.entries.len() >= self.capacity {
            log::warn!("standings array full; {racer:?} not tracked");
            return;
        }
        self.entries.push(RacerEntry {
            racer,
            stage_number: NO_STAGE,
        });
    }

    /// Queue a standings update for a racer that just landed.
    pub fn add_request(&mut self, racer: RacerId, stage_number: i32) {
        self.requests.enqueue(PositionUpdate {
            racer,
            stage_number,
        });
    }

    pub fn leader(&self) -> Option<RacerId> {
        self.leader
    }

    pub fn racer_count(&self) -> usize {
        self.entries.len()
    }

    /// Current placement of one racer, 1-based.
    pub fn placement_of(&self, racer: RacerId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.racer == racer)
            .map(|index| index + 1)
    }

    /// Top-N placements; the player is appended if ranked below the cut.
    pub fn standings(&self) -> Vec<Standing> {
        let mut report: Vec<Standing> = self
            .entries
            .iter()
            .take(self.top_n)
            .enumerate()
            .map(|(index, entry)| Standing {
                rank: index + 1,
                racer: entry.racer,
                stage_number: entry.stage_number,
            })
            .collect();

        let player_reported = report.iter().any(|standing| standing.racer.is_player());
        if !player_reported {
            if let Some(index) = self
                .entries
                .iter()
                .position(|entry| entry.racer.is_player())
            {
                report.push(Standing {
                    rank: index + 1,
                    racer: RacerId::Player,
                    stage_number: self.entries[index].stage_number,
                });
            }
        }
        report
    }

    /// Flush at most one queued update and re-sort.
    pub fn tick(&mut self, events: &mut Vec<GameEvent>) {
        let Some(update) = self.requests.begin() else {
            return;
        };
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.racer == update.racer)
        {
            Some(entry) => entry.stage_number = update.stage_number,
            None => log::warn!("standings update for unregistered {:?}", update.racer),
        }
        insertion_sort(&mut self.entries);

        let new_leader = self.entries.first().map(|entry| entry.racer);
        if new_leader != self.leader {
            self.leader = new_leader;
            if let Some(racer) = new_leader {
                events.push(GameEvent::LeaderChanged { racer });
            }
        }
        self.requests.finish();
    }

    /// Forget all racers and pending updates for the next round.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.leader = None;
        self.requests.clear();
    }
}
