use super::cpu::{Cpu, QuantumOutcome};
use super::feedback_queue::{FeedbackQueue, MlfqConfig};
use super::launcher::Launcher;
use super::{ProcessControlBlock, ProcessTable, ShutdownToken};

use crate::error::SchedulerResult;
use crate::io::{MetricsRow, Report};

/// Policies for a workload that is fully known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SchedulingAlgorithm {
    Fcfs,
    RoundRobin { quantum: u64 },
    Mlfq(MlfqConfig),
}

pub(crate) struct ShortTermScheduler {
    table: ProcessTable,
    shutdown: ShutdownToken,
}

impl ShortTermScheduler {
    pub fn new(shutdown: ShutdownToken) -> ShortTermScheduler {
        ShortTermScheduler {
            table: ProcessTable::new(),
            shutdown,
        }
    }

    /// Adds a process in input order.
    pub fn schedule_process(&mut self, command: &str, arrival_time: u64) {
        self.table.insert(ProcessControlBlock::new(command, arrival_time));
    }

    /// Runs every scheduled process to a terminal state, or until shutdown.
    /// Returns the metrics of the processes that completed, in completion order.
    pub fn run<L: Launcher, R: Report>(
        &mut self,
        cpu: &mut Cpu<L, R>,
        algorithm: SchedulingAlgorithm,
    ) -> SchedulerResult<Vec<MetricsRow>> {
        log::info!("Running {} processes with {:?}", self.table.len(), algorithm);

        let completed = match algorithm {
            SchedulingAlgorithm::Fcfs => self.fcfs(cpu),
            SchedulingAlgorithm::RoundRobin { quantum } => self.round_robin(cpu, quantum),
            SchedulingAlgorithm::Mlfq(config) => self.mlfq(cpu, config),
        };

        self.release_remaining(cpu);
        completed
    }

    fn fcfs<L: Launcher, R: Report>(
        &mut self,
        cpu: &mut Cpu<L, R>,
    ) -> SchedulerResult<Vec<MetricsRow>> {
        let mut completed = Vec::new();

        for id in self.table.ids() {
            if self.shutdown.is_triggered() {
                break;
            }

            let pcb = self.table.get_mut(id)?;
            cpu.run_to_completion(pcb)?;
            completed.push(self.table.remove(id)?.metrics_row());
        }

        Ok(completed)
    }

    /// The dispatch list is fixed; finished entries are skipped on their turn.
    fn round_robin<L: Launcher, R: Report>(
        &mut self,
        cpu: &mut Cpu<L, R>,
        quantum: u64,
    ) -> SchedulerResult<Vec<MetricsRow>> {
        let order = self.table.ids();
        let mut completed = Vec::new();
        let mut turn = 0;

        while completed.len() < order.len() && !self.shutdown.is_triggered() {
            let pcb = self.table.get_mut(order[turn % order.len()])?;

            if cpu.run_for_quantum(pcb, quantum)? == QuantumOutcome::CompletedNow {
                completed.push(pcb.metrics_row());
            }
            turn += 1;
        }

        Ok(completed)
    }

    fn mlfq<L: Launcher, R: Report>(
        &mut self,
        cpu: &mut Cpu<L, R>,
        config: MlfqConfig,
    ) -> SchedulerResult<Vec<MetricsRow>> {
        let mut queue = FeedbackQueue::new(config, cpu.now_ms());
        for id in self.table.ids() {
            queue.enqueue(0, id);
        }

        let mut completed = Vec::new();
        while !queue.is_empty() && !self.shutdown.is_triggered() {
            if let Some(pcb) = mlfq_step(cpu, &mut self.table, &mut queue)? {
                completed.push(pcb.metrics_row());
            }
        }

        Ok(completed)
    }

    /// Kills anything left running after a shutdown or a failed run and
    /// clears the table.
    fn release_remaining<L: Launcher, R: Report>(&mut self, cpu: &mut Cpu<L, R>) {
        for id in self.table.ids() {
            if let Ok(mut pcb) = self.table.remove(id) {
                cpu.terminate(&mut pcb);
            }
        }
    }
}

/// One boost check, one dispatch, one post-slice transition. Returns the
/// control block of a process that left the queue in a terminal state.
pub(crate) fn mlfq_step<L: Launcher, R: Report>(
    cpu: &mut Cpu<L, R>,
    table: &mut ProcessTable,
    queue: &mut FeedbackQueue,
) -> SchedulerResult<Option<ProcessControlBlock>> {
    queue.boost_if_due(cpu.now_ms());

    let Some(dispatch) = queue.select() else {
        return Ok(None);
    };

    let pcb = table.get_mut(dispatch.id)?;
    let outcome = cpu.run_for_quantum(pcb, queue.quantum(dispatch.level))?;
    queue.settle(dispatch, outcome);

    if outcome.is_terminal() {
        return table.remove(dispatch.id).map(Some);
    }
    Ok(None)
}
