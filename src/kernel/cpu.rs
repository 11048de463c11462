use std::thread;
use std::time::Duration;

use super::launcher::{Launcher, ProcessExit};
use super::{Clock, ProcessControlBlock};

use crate::error::SchedulerResult;
use crate::io::{ContextSwitch, Report};

/// Result of granting one time slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuantumOutcome {
    /// The process was already terminal; nothing ran.
    AlreadyDone,
    /// The process reached a terminal state during this slice.
    CompletedNow,
    /// The slice ran out and the process was suspended.
    StillRunning,
}

impl QuantumOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QuantumOutcome::StillRunning)
    }
}

/// Runs real processes on behalf of the schedulers and reports every slice
/// and every completion, in dispatch order.
pub(crate) struct Cpu<L: Launcher, R: Report> {
    clock: Clock,
    launcher: L,
    report: R,
}

impl<L: Launcher, R: Report> Cpu<L, R> {
    pub fn new(clock: Clock, launcher: L, report: R) -> Cpu<L, R> {
        Cpu {
            clock,
            launcher,
            report,
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    #[cfg(test)]
    pub fn report(&self) -> &R {
        &self.report
    }

    #[cfg(test)]
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Launches the command. Returns false when the OS refused, in which case
    /// the process is already terminal.
    pub fn spawn(&mut self, pcb: &mut ProcessControlBlock) -> bool {
        let now = self.clock.now_ms();

        match self.launcher.launch(pcb.get_command()) {
            Ok(handle) => {
                log::debug!("Spawned '{}' as pid {} at {} ms", pcb.get_command(), handle.id(), now);
                pcb.mark_started(handle, now);
                true
            }
            Err(err) => {
                log::warn!("Failed to spawn '{}': {}", pcb.get_command(), err);
                pcb.mark_spawn_failed(now);
                false
            }
        }
    }

    /// Starts the process and blocks until it exits.
    pub fn run_to_completion(&mut self, pcb: &mut ProcessControlBlock) -> SchedulerResult<()> {
        let slice_start = self.clock.now_ms();

        if pcb.is_terminal() {
            return Ok(());
        }

        if self.spawn(pcb) {
            let exit = match pcb.handle.as_mut() {
                Some(handle) => handle.wait(),
                None => Err(missing_handle()),
            };
            let now = self.clock.now_ms();
            pcb.charge_elapsed(now);
            pcb.complete(classify(pcb.get_command(), exit), now);
        }

        let slice_end = pcb.get_completion_time().unwrap_or(slice_start);
        self.report.record_completion(&pcb.metrics_row())?;
        self.record_slice(pcb, slice_start, slice_end)?;
        Ok(())
    }

    /// Grants one quantum. The full quantum is slept and charged to the burst
    /// before the process is polled.
    pub fn run_for_quantum(
        &mut self,
        pcb: &mut ProcessControlBlock,
        quantum_ms: u64,
    ) -> SchedulerResult<QuantumOutcome> {
        if pcb.is_terminal() {
            return Ok(QuantumOutcome::AlreadyDone);
        }

        let slice_start = self.clock.now_ms();

        if pcb.is_started() {
            if let Some(handle) = pcb.handle.as_mut() {
                if let Err(err) = handle.resume() {
                    log::warn!("Failed to resume '{}': {}", pcb.get_command(), err);
                }
            }
        } else if !self.spawn(pcb) {
            self.report.record_completion(&pcb.metrics_row())?;
            self.record_slice(pcb, slice_start, slice_start)?;
            return Ok(QuantumOutcome::CompletedNow);
        }

        thread::sleep(Duration::from_millis(quantum_ms));
        pcb.charge(quantum_ms);

        let polled = match pcb.handle.as_mut() {
            Some(handle) => handle.try_wait(),
            None => Err(missing_handle()),
        };

        let outcome = match polled.transpose() {
            None => {
                if let Some(handle) = pcb.handle.as_mut() {
                    if let Err(err) = handle.pause() {
                        log::warn!("Failed to suspend '{}': {}", pcb.get_command(), err);
                    }
                }
                QuantumOutcome::StillRunning
            }
            Some(exit) => {
                let now = self.clock.now_ms();
                pcb.complete(classify(pcb.get_command(), exit), now);
                self.report.record_completion(&pcb.metrics_row())?;
                QuantumOutcome::CompletedNow
            }
        };

        let slice_end = self.clock.now_ms();
        self.record_slice(pcb, slice_start, slice_end)?;
        Ok(outcome)
    }

    /// Kills a started process that will not be scheduled again.
    pub fn terminate(&mut self, pcb: &mut ProcessControlBlock) {
        if let Some(mut handle) = pcb.handle.take() {
            log::info!("Killing unfinished '{}' (pid {})", pcb.get_command(), handle.id());
            if let Err(err) = handle.kill() {
                log::warn!("Failed to kill '{}': {}", pcb.get_command(), err);
            }
        }
    }

    fn record_slice(
        &mut self,
        pcb: &ProcessControlBlock,
        start_ms: u64,
        end_ms: u64,
    ) -> SchedulerResult<()> {
        self.report.record_slice(&ContextSwitch {
            command: pcb.get_command().to_string(),
            start_ms,
            end_ms,
        })?;
        Ok(())
    }
}

fn missing_handle() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotFound, "started process has no handle")
}

/// True when the exit counts as an error. A failed reap is treated as one.
fn classify(command: &str, exit: std::io::Result<ProcessExit>) -> bool {
    match exit {
        Ok(exit) => {
            log::debug!("'{}' exited with {:?}", command, exit.code);
            exit.is_error()
        }
        Err(err) => {
            log::warn!("Failed to reap '{}': {}", command, err);
            true
        }
    }
}
