use super::launcher::ManagedProcess;

use crate::io::MetricsRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessState {
    NotStarted,
    Started,
    Finished,
    Errored,
}

/// Bookkeeping for one scheduled command. All times are milliseconds
/// relative to scheduler start.
pub(crate) struct ProcessControlBlock {
    pub state: ProcessState,
    pub handle: Option<Box<dyn ManagedProcess>>,

    command: String,

    arrival_time: u64,
    start_time: u64,
    completion_time: Option<u64>,
    burst_time: u64,
    response_time: u64,
    turnaround_time: u64,
    waiting_time: u64,
}

impl ProcessControlBlock {
    pub fn new(command: impl Into<String>, arrival_time: u64) -> ProcessControlBlock {
        ProcessControlBlock {
            state: ProcessState::NotStarted,
            handle: None,
            command: command.into(),
            arrival_time,
            start_time: 0,
            completion_time: None,
            burst_time: 0,
            response_time: 0,
            turnaround_time: 0,
            waiting_time: 0,
        }
    }

    pub fn get_command(&self) -> &str {
        &self.command
    }

    #[cfg(test)]
    pub fn get_arrival_time(&self) -> u64 {
        self.arrival_time
    }

    pub fn get_completion_time(&self) -> Option<u64> {
        self.completion_time
    }

    pub fn get_burst_time(&self) -> u64 {
        self.burst_time
    }

    pub fn get_response_time(&self) -> u64 {
        self.response_time
    }

    pub fn get_turnaround_time(&self) -> u64 {
        self.turnaround_time
    }

    pub fn get_waiting_time(&self) -> u64 {
        self.waiting_time
    }

    pub fn is_started(&self) -> bool {
        self.state == ProcessState::Started
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, ProcessState::Finished | ProcessState::Errored)
    }

    pub fn is_errored(&self) -> bool {
        self.state == ProcessState::Errored
    }

    pub fn mark_started(&mut self, handle: Box<dyn ManagedProcess>, now: u64) {
        self.handle = Some(handle);
        self.state = ProcessState::Started;
        self.start_time = now;
        self.response_time = now.saturating_sub(self.arrival_time);
    }

    /// The OS refused to create the process. Terminal with zero burst.
    pub fn mark_spawn_failed(&mut self, now: u64) {
        self.start_time = now;
        self.response_time = now.saturating_sub(self.arrival_time);
        self.burst_time = 0;
        self.complete(true, now);
    }

    /// Adds one granted quantum to the burst.
    pub fn charge(&mut self, quantum_ms: u64) {
        self.burst_time += quantum_ms;
    }

    /// Sets the burst to the whole time since start, for non-preemptive runs.
    pub fn charge_elapsed(&mut self, now: u64) {
        self.burst_time = self.burst_time.max(now.saturating_sub(self.start_time));
    }

    /// Moves into a terminal state and derives the remaining metrics.
    pub fn complete(&mut self, errored: bool, now: u64) {
        debug_assert!(!self.is_terminal(), "completion recorded twice for {}", self.command);

        self.state = if errored {
            ProcessState::Errored
        } else {
            ProcessState::Finished
        };
        self.completion_time = Some(now);
        self.turnaround_time = now.saturating_sub(self.arrival_time);
        self.waiting_time = self.turnaround_time.saturating_sub(self.burst_time);
        self.handle = None;
    }

    pub fn metrics_row(&self) -> MetricsRow {
        MetricsRow {
            command: self.command.clone(),
            finished: self.state == ProcessState::Finished,
            error: self.is_errored(),
            burst_ms: self.get_burst_time(),
            turnaround_ms: self.get_turnaround_time(),
            waiting_ms: self.get_waiting_time(),
            response_ms: self.get_response_time(),
        }
    }
}
