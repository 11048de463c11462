mod burst_history;
mod clock;
mod cpu;
mod feedback_queue;
mod launcher;
mod long_term_scheduler;
mod online_scheduler;
mod process_control_block;
mod process_table;
mod short_term_scheduler;
mod shutdown;

use clock::Clock;
use long_term_scheduler::LongTermScheduler;
use process_control_block::ProcessControlBlock;
use process_table::{ProcessId, ProcessTable};

pub use feedback_queue::MlfqConfig;
pub use shutdown::ShutdownToken;

pub mod driver;

pub use driver::{Driver, DriverConfig, Policy};
