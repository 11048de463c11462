use std::io;
use std::process::{Child, Command, Stdio};

use crate::io::command;

/// How a managed process ended. `code` is `None` when it was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProcessExit {
    pub code: Option<i32>,
}

impl ProcessExit {
    /// Only exit code 1 counts as an application error. Other non-zero codes
    /// and signal terminations are reported as finished.
    pub fn is_error(&self) -> bool {
        self.code == Some(1)
    }
}

/// Control over one running OS process.
pub(crate) trait ManagedProcess {
    fn id(&self) -> u32;

    fn pause(&mut self) -> io::Result<()>;

    fn resume(&mut self) -> io::Result<()>;

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>>;

    fn wait(&mut self) -> io::Result<ProcessExit>;

    fn kill(&mut self) -> io::Result<()>;
}

pub(crate) trait Launcher {
    fn launch(&mut self, command: &str) -> io::Result<Box<dyn ManagedProcess>>;
}

/// Starts real processes.
#[derive(Debug, Default)]
pub(crate) struct OsLauncher;

impl Launcher for OsLauncher {
    fn launch(&mut self, command: &str) -> io::Result<Box<dyn ManagedProcess>> {
        let (program, args) = command::tokenize(command)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()?;

        Ok(Box::new(OsProcess { child }))
    }
}

struct OsProcess {
    child: Child,
}

impl OsProcess {
    #[cfg(unix)]
    fn signal(&self, signal: nix::sys::signal::Signal) -> io::Result<()> {
        let pid = nix::unistd::Pid::from_raw(self.child.id() as i32);
        nix::sys::signal::kill(pid, signal).map_err(io::Error::from)
    }
}

fn exit_of(status: std::process::ExitStatus) -> ProcessExit {
    ProcessExit {
        code: status.code(),
    }
}

impl ManagedProcess for OsProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    #[cfg(unix)]
    fn pause(&mut self) -> io::Result<()> {
        self.signal(nix::sys::signal::Signal::SIGSTOP)
    }

    // Without job-control signals the process keeps running between slices.
    #[cfg(not(unix))]
    fn pause(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn resume(&mut self) -> io::Result<()> {
        self.signal(nix::sys::signal::Signal::SIGCONT)
    }

    #[cfg(not(unix))]
    fn resume(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        Ok(self.child.try_wait()?.map(exit_of))
    }

    fn wait(&mut self) -> io::Result<ProcessExit> {
        self.child.wait().map(exit_of)
    }

    fn kill(&mut self) -> io::Result<()> {
        // A stopped process must be continued before SIGKILL is reaped promptly.
        let _ = self.resume();
        self.child.kill()?;
        self.child.wait().map(|_| ())
    }
}

impl Drop for OsProcess {
    fn drop(&mut self) {
        // `Child` does not kill on drop, and a stopped child would never exit.
        if let Ok(None) = self.child.try_wait() {
            log::warn!("Killing unreaped pid {} on drop", self.child.id());
            if let Err(err) = self.kill() {
                log::warn!("Failed to kill pid {}: {}", self.child.id(), err);
            }
        }
    }
}
