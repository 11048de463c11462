pub mod arrival_feed;
pub mod command;
pub mod loader;
pub mod report;

pub use arrival_feed::{ArrivalFeed, LineFeed};
pub use report::{ContextSwitch, FileReport, MetricsRow, Report};

#[cfg(test)]
pub use report::{BrokenTraceReport, MemoryReport};
