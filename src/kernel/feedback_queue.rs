use std::collections::VecDeque;

use super::cpu::QuantumOutcome;
use super::ProcessId;

pub(crate) const LEVELS: usize = 3;
pub(crate) const LOWEST_LEVEL: usize = LEVELS - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MlfqConfig {
    /// Time slice per level in milliseconds, level 0 first.
    pub quanta: [u64; LEVELS],
    pub boost_time: u64,
}

/// The process picked for the next slice and the level it was picked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Dispatch {
    pub level: usize,
    pub id: ProcessId,
}

/// Three-level feedback queue. Levels 0 and 1 are FIFO; the lowest level is
/// served round robin through a cursor.
pub(crate) struct FeedbackQueue {
    levels: [VecDeque<ProcessId>; LEVELS],
    cursor: usize,
    config: MlfqConfig,
    last_boost: u64,
}

impl FeedbackQueue {
    pub fn new(config: MlfqConfig, now: u64) -> FeedbackQueue {
        FeedbackQueue {
            levels: Default::default(),
            cursor: 0,
            config,
            last_boost: now,
        }
    }

    pub fn quantum(&self, level: usize) -> u64 {
        self.config.quanta[level]
    }

    pub fn enqueue(&mut self, level: usize, id: ProcessId) {
        debug_assert!(self.level_of(id).is_none(), "process {} queued twice", id);
        self.levels[level.min(LOWEST_LEVEL)].push_back(id);
    }

    /// Moves everything below level 0 to its tail, level 1 first, once
    /// `boost_time` has passed since the previous boost.
    pub fn boost_if_due(&mut self, now: u64) -> bool {
        if now.saturating_sub(self.last_boost) < self.config.boost_time {
            return false;
        }

        let (top, lower) = self.levels.split_at_mut(1);
        let mut moved = 0;
        for level in lower.iter_mut() {
            moved += level.len();
            top[0].extend(level.drain(..));
        }

        self.cursor = 0;
        self.last_boost = now;

        if moved > 0 {
            log::debug!("Boost at {} ms moved {} processes to level 0", now, moved);
        }
        true
    }

    /// Head of the highest non-empty level; the cursor entry on the lowest level.
    pub fn select(&self) -> Option<Dispatch> {
        let level = self.levels.iter().position(|queue| !queue.is_empty())?;
        let idx = if level == LOWEST_LEVEL { self.cursor } else { 0 };
        let id = *self.levels[level].get(idx)?;

        Some(Dispatch { level, id })
    }

    /// Applies the post-slice transition for a process returned by `select`.
    pub fn settle(&mut self, dispatch: Dispatch, outcome: QuantumOutcome) {
        let Dispatch { level, id } = dispatch;
        let Some(pos) = self.levels[level].iter().position(|&queued| queued == id) else {
            log::warn!("Process {} is no longer on level {}", id, level);
            return;
        };

        match outcome {
            QuantumOutcome::StillRunning if level < LOWEST_LEVEL => {
                self.levels[level].remove(pos);
                self.levels[level + 1].push_back(id);
                log::debug!("Demoted process {} to level {}", id, level + 1);
            }
            QuantumOutcome::StillRunning => {
                self.cursor = (self.cursor + 1) % self.levels[level].len();
            }
            QuantumOutcome::CompletedNow | QuantumOutcome::AlreadyDone => {
                self.levels[level].remove(pos);
                if level == LOWEST_LEVEL && self.cursor >= self.levels[level].len() {
                    self.cursor = 0;
                }
            }
        }
    }

    pub fn level_of(&self, id: ProcessId) -> Option<usize> {
        self.levels.iter().position(|queue| queue.contains(&id))
    }

    #[cfg(test)]
    pub fn level_len(&self, level: usize) -> usize {
        self.levels[level].len()
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.levels.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(VecDeque::is_empty)
    }

    /// Empties every level, highest first.
    pub fn drain(&mut self) -> Vec<ProcessId> {
        self.cursor = 0;
        self.levels.iter_mut().flat_map(|queue| queue.drain(..)).collect()
    }
}
