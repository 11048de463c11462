use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const METRICS_HEADER: &str =
    "Command,Finished,Error,Burst Time,Turnaround Time,Waiting Time,Response Time";

/// One result row, emitted the moment a process reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsRow {
    pub command: String,
    pub finished: bool,
    pub error: bool,
    pub burst_ms: u64,
    pub turnaround_ms: u64,
    pub waiting_ms: u64,
    pub response_ms: u64,
}

/// One granted time slice (or one whole run for non-preemptive policies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSwitch {
    pub command: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Destination for everything a scheduler run reports.
pub trait Report {
    fn record_completion(&mut self, row: &MetricsRow) -> io::Result<()>;

    fn record_slice(&mut self, slice: &ContextSwitch) -> io::Result<()>;
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

pub struct CsvMetricsSink<W: Write> {
    writer: W,
}

impl<W: Write> CsvMetricsSink<W> {
    /// Writes the header immediately.
    pub fn new(mut writer: W) -> io::Result<CsvMetricsSink<W>> {
        writeln!(writer, "{}", METRICS_HEADER)?;
        writer.flush()?;
        Ok(CsvMetricsSink { writer })
    }

    pub fn write_row(&mut self, row: &MetricsRow) -> io::Result<()> {
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{}",
            row.command,
            yes_no(row.finished),
            yes_no(row.error),
            row.burst_ms,
            row.turnaround_ms,
            row.waiting_ms,
            row.response_ms,
        )?;
        self.writer.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub struct TraceWriter<W: Write> {
    writer: W,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(writer: W) -> TraceWriter<W> {
        TraceWriter { writer }
    }

    pub fn write_slice(&mut self, slice: &ContextSwitch) -> io::Result<()> {
        writeln!(self.writer, "{}|{}|{}", slice.command, slice.start_ms, slice.end_ms)?;
        self.writer.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Metrics to a CSV writer, trace lines to another writer.
pub struct FileReport<M: Write, T: Write> {
    metrics: CsvMetricsSink<M>,
    trace: TraceWriter<T>,
}

impl FileReport<BufWriter<File>, io::Stdout> {
    pub fn create(metrics_path: &Path) -> io::Result<Self> {
        let file = BufWriter::new(File::create(metrics_path)?);
        log::info!("Writing metrics to {}", metrics_path.display());
        Ok(FileReport::new(CsvMetricsSink::new(file)?, TraceWriter::new(io::stdout())))
    }
}

impl<M: Write, T: Write> FileReport<M, T> {
    pub fn new(metrics: CsvMetricsSink<M>, trace: TraceWriter<T>) -> Self {
        FileReport { metrics, trace }
    }
}

impl<M: Write, T: Write> Report for FileReport<M, T> {
    fn record_completion(&mut self, row: &MetricsRow) -> io::Result<()> {
        self.metrics.write_row(row)
    }

    fn record_slice(&mut self, slice: &ContextSwitch) -> io::Result<()> {
        self.trace.write_slice(slice)
    }
}

/// Keeps everything in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryReport {
    pub rows: Vec<MetricsRow>,
    pub slices: Vec<ContextSwitch>,
}

#[cfg(test)]
impl MemoryReport {
    pub fn dispatch_order(&self) -> Vec<&str> {
        self.slices.iter().map(|s| s.command.as_str()).collect()
    }

    pub fn row_for(&self, command: &str) -> Option<&MetricsRow> {
        self.rows.iter().find(|r| r.command == command)
    }
}

#[cfg(test)]
impl Report for MemoryReport {
    fn record_completion(&mut self, row: &MetricsRow) -> io::Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn record_slice(&mut self, slice: &ContextSwitch) -> io::Result<()> {
        self.slices.push(slice.clone());
        Ok(())
    }
}

/// Accepts metrics rows but fails every trace write, like a closed stdout.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct BrokenTraceReport {
    pub rows: Vec<MetricsRow>,
}

#[cfg(test)]
impl Report for BrokenTraceReport {
    fn record_completion(&mut self, row: &MetricsRow) -> io::Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn record_slice(&mut self, _slice: &ContextSwitch) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "trace closed"))
    }
}
