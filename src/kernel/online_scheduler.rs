use std::thread;
use std::time::Duration;

use super::burst_history::BurstHistory;
use super::cpu::Cpu;
use super::feedback_queue::{FeedbackQueue, MlfqConfig};
use super::launcher::Launcher;
use super::short_term_scheduler::mlfq_step;
use super::{LongTermScheduler, ProcessControlBlock, ProcessId, ProcessTable, ShutdownToken};

use crate::error::SchedulerResult;
use crate::io::{ArrivalFeed, Report};

/// Policies for work that arrives while the scheduler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnlineAlgorithm {
    ShortestJobFirst,
    Mlfq(MlfqConfig),
}

enum Pending {
    /// Arrival order; the earliest wins ties.
    Sjf(Vec<ProcessId>),
    Mlfq(FeedbackQueue),
}

/// Interleaves admission of new arrivals with one dispatch at a time.
/// Never stops on its own; only the shutdown token ends `run`.
pub(crate) struct OnlineScheduler<F: ArrivalFeed> {
    lts: LongTermScheduler<F>,
    table: ProcessTable,
    history: BurstHistory,
    pending: Pending,
    shutdown: ShutdownToken,
    poll_interval: Duration,
}

impl<F: ArrivalFeed> OnlineScheduler<F> {
    pub fn new(
        feed: F,
        algorithm: OnlineAlgorithm,
        history: BurstHistory,
        shutdown: ShutdownToken,
        poll_interval: Duration,
        now: u64,
    ) -> OnlineScheduler<F> {
        let pending = match algorithm {
            OnlineAlgorithm::ShortestJobFirst => Pending::Sjf(Vec::new()),
            OnlineAlgorithm::Mlfq(config) => Pending::Mlfq(FeedbackQueue::new(config, now)),
        };

        OnlineScheduler {
            lts: LongTermScheduler::new(feed),
            table: ProcessTable::new(),
            history,
            pending,
            shutdown,
            poll_interval,
        }
    }

    pub fn history(&self) -> &BurstHistory {
        &self.history
    }

    pub fn pending_len(&self) -> usize {
        match &self.pending {
            Pending::Sjf(pending) => pending.len(),
            Pending::Mlfq(queue) => queue.len(),
        }
    }

    pub fn run<L: Launcher, R: Report>(&mut self, cpu: &mut Cpu<L, R>) -> SchedulerResult<()> {
        log::info!("Online scheduler waiting for commands");

        let result = self.serve(cpu);

        log::info!(
            "Shutting down after {} arrivals with {} still pending (feed exhausted: {})",
            self.lts.admitted(),
            self.pending_len(),
            self.lts.feed_exhausted()
        );
        self.release_pending(cpu);
        result
    }

    fn serve<L: Launcher, R: Report>(&mut self, cpu: &mut Cpu<L, R>) -> SchedulerResult<()> {
        while !self.shutdown.is_triggered() {
            if !self.step(cpu)? {
                thread::sleep(self.poll_interval);
            }
        }
        Ok(())
    }

    /// Admits new arrivals, then dispatches at most once. Returns whether
    /// anything was dispatched.
    pub fn step<L: Launcher, R: Report>(&mut self, cpu: &mut Cpu<L, R>) -> SchedulerResult<bool> {
        let arrivals = self.lts.admit(cpu.clock(), &mut self.table);
        self.classify(&arrivals)?;

        match &mut self.pending {
            Pending::Sjf(pending) => {
                dispatch_shortest(cpu, &mut self.table, &mut self.history, pending)
            }
            Pending::Mlfq(queue) => {
                if queue.is_empty() {
                    return Ok(false);
                }
                if let Some(pcb) = mlfq_step(cpu, &mut self.table, queue)? {
                    record_history(&mut self.history, &pcb);
                }
                Ok(true)
            }
        }
    }

    fn classify(&mut self, arrivals: &[ProcessId]) -> SchedulerResult<()> {
        for &id in arrivals {
            let command = self.table.get(id)?.get_command();

            match &mut self.pending {
                Pending::Sjf(pending) => {
                    self.history.lookup_or_create(command);
                    pending.push(id);
                }
                Pending::Mlfq(queue) => {
                    let level = if self.history.contains(command) {
                        let predicted = self.history.predict(command);
                        if predicted < queue.quantum(0) as f64 {
                            0
                        } else if predicted < queue.quantum(1) as f64 {
                            1
                        } else {
                            2
                        }
                    } else {
                        self.history.lookup_or_create(command);
                        1
                    };

                    log::debug!("Queued '{}' on level {}", command, level);
                    queue.enqueue(level, id);
                }
            }
        }
        Ok(())
    }

    /// Kills every process still in the table, including one whose dispatch
    /// failed after it left the pending set.
    fn release_pending<L: Launcher, R: Report>(&mut self, cpu: &mut Cpu<L, R>) {
        match &mut self.pending {
            Pending::Sjf(pending) => pending.clear(),
            Pending::Mlfq(queue) => {
                queue.drain();
            }
        }

        for id in self.table.ids() {
            if let Ok(mut pcb) = self.table.remove(id) {
                cpu.terminate(&mut pcb);
            }
        }
    }
}

/// Runs the pending process with the lowest predicted burst to completion.
fn dispatch_shortest<L: Launcher, R: Report>(
    cpu: &mut Cpu<L, R>,
    table: &mut ProcessTable,
    history: &mut BurstHistory,
    pending: &mut Vec<ProcessId>,
) -> SchedulerResult<bool> {
    let mut shortest: Option<(usize, f64)> = None;
    for (idx, &id) in pending.iter().enumerate() {
        let predicted = history.predict(table.get(id)?.get_command());
        if shortest.map_or(true, |(_, best)| predicted < best) {
            shortest = Some((idx, predicted));
        }
    }

    let Some((idx, predicted)) = shortest else {
        return Ok(false);
    };

    let id = pending.remove(idx);
    let pcb = table.get_mut(id)?;
    log::debug!("Dispatching '{}' (predicted {:.1} ms)", pcb.get_command(), predicted);

    cpu.run_to_completion(pcb)?;
    record_history(history, &table.remove(id)?);
    Ok(true)
}

fn record_history(history: &mut BurstHistory, pcb: &ProcessControlBlock) {
    if !pcb.is_errored() {
        history.record(pcb.get_command(), pcb.get_burst_time());
    }
}
