use std::path::{Path, PathBuf};
use std::time::Duration;

use super::burst_history::BurstHistory;
use super::cpu::Cpu;
use super::launcher::{Launcher, OsLauncher};
use super::online_scheduler::{OnlineAlgorithm, OnlineScheduler};
use super::short_term_scheduler::{SchedulingAlgorithm, ShortTermScheduler};
use super::{Clock, MlfqConfig, ShutdownToken};

use crate::error::{SchedulerError, SchedulerResult};
use crate::io::{loader, FileReport, LineFeed, MetricsRow, Report};

/// Which scheduler to run, with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    Fcfs { workload: PathBuf },
    RoundRobin {
        workload: PathBuf,
        quantum: u64,
    },
    Mlfq {
        workload: PathBuf,
        config: MlfqConfig,
    },
    ShortestJobFirst,
    OnlineMlfq { config: MlfqConfig },
}

impl Policy {
    pub fn metrics_file_name(&self) -> &'static str {
        match self {
            Policy::Fcfs { .. } => "result_offline_FCFS.csv",
            Policy::RoundRobin { .. } => "result_offline_RR.csv",
            Policy::Mlfq { .. } => "result_offline_MLFQ.csv",
            Policy::ShortestJobFirst => "result_online_SJF.csv",
            Policy::OnlineMlfq { .. } => "result_online_MLFQ.csv",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub policy: Policy,
    pub output_dir: PathBuf,
    pub poll_interval: Duration,
}

impl DriverConfig {
    pub fn validate(&self) -> SchedulerResult<()> {
        let quanta: &[u64] = match &self.policy {
            Policy::RoundRobin { quantum, .. } => std::slice::from_ref(quantum),
            Policy::Mlfq { config, .. } | Policy::OnlineMlfq { config } => &config.quanta,
            Policy::Fcfs { .. } | Policy::ShortestJobFirst => &[],
        };

        if quanta.contains(&0) {
            return Err(SchedulerError::InvalidConfig("quantum must be at least 1 ms".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(SchedulerError::InvalidConfig("poll interval must be non-zero".into()));
        }
        Ok(())
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.output_dir.join(self.policy.metrics_file_name())
    }
}

/// Averages over the processes of one offline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub processes: usize,
    pub errored: usize,
    pub avg_turnaround_ms: f64,
    pub avg_waiting_ms: f64,
    pub avg_response_ms: f64,
}

impl RunSummary {
    pub fn from_rows(rows: &[MetricsRow]) -> RunSummary {
        let n = rows.len().max(1) as f64;
        let avg = |field: fn(&MetricsRow) -> u64| rows.iter().map(field).sum::<u64>() as f64 / n;

        RunSummary {
            processes: rows.len(),
            errored: rows.iter().filter(|row| row.error).count(),
            avg_turnaround_ms: avg(|row| row.turnaround_ms),
            avg_waiting_ms: avg(|row| row.waiting_ms),
            avg_response_ms: avg(|row| row.response_ms),
        }
    }
}

pub struct Driver {
    config: DriverConfig,
    shutdown: ShutdownToken,
}

impl Driver {
    pub fn new(config: DriverConfig, shutdown: ShutdownToken) -> Driver {
        Driver { config, shutdown }
    }

    pub fn start(&mut self) -> SchedulerResult<Option<RunSummary>> {
        self.config.validate()?;
        log::info!("Starting the driver with {:?}", self.config.policy);

        std::fs::create_dir_all(&self.config.output_dir)?;

        let summary = match self.config.policy.clone() {
            Policy::Fcfs { workload } => {
                Some(self.run_offline(&workload, SchedulingAlgorithm::Fcfs)?)
            }
            Policy::RoundRobin { workload, quantum } => {
                Some(self.run_offline(&workload, SchedulingAlgorithm::RoundRobin { quantum })?)
            }
            Policy::Mlfq { workload, config } => {
                Some(self.run_offline(&workload, SchedulingAlgorithm::Mlfq(config))?)
            }
            Policy::ShortestJobFirst => {
                self.run_online(OnlineAlgorithm::ShortestJobFirst)?;
                None
            }
            Policy::OnlineMlfq { config } => {
                self.run_online(OnlineAlgorithm::Mlfq(config))?;
                None
            }
        };

        if let Some(summary) = &summary {
            log::info!(
                "Completed {} processes ({} errored): avg turnaround {:.2} ms, \
                 avg waiting {:.2} ms, avg response {:.2} ms",
                summary.processes,
                summary.errored,
                summary.avg_turnaround_ms,
                summary.avg_waiting_ms,
                summary.avg_response_ms
            );
        }
        log::info!("Driver finished");
        Ok(summary)
    }

    fn run_offline(
        &self,
        workload: &Path,
        algorithm: SchedulingAlgorithm,
    ) -> SchedulerResult<RunSummary> {
        let commands = loader::load_workload(workload)?;
        let report = FileReport::create(&self.config.metrics_path())?;
        let mut cpu = Cpu::new(Clock::start(), OsLauncher, report);

        run_offline_with(&mut cpu, &commands, algorithm, self.shutdown.clone())
    }

    fn run_online(&self, algorithm: OnlineAlgorithm) -> SchedulerResult<()> {
        let report = FileReport::create(&self.config.metrics_path())?;
        let mut cpu = Cpu::new(Clock::start(), OsLauncher, report);

        let mut scheduler = OnlineScheduler::new(
            LineFeed::stdin(),
            algorithm,
            BurstHistory::new(),
            self.shutdown.clone(),
            self.config.poll_interval,
            cpu.now_ms(),
        );
        scheduler.run(&mut cpu)?;

        log::info!("Burst history holds {} commands", scheduler.history().len());
        Ok(())
    }
}

fn run_offline_with<L: Launcher, R: Report>(
    cpu: &mut Cpu<L, R>,
    commands: &[String],
    algorithm: SchedulingAlgorithm,
    shutdown: ShutdownToken,
) -> SchedulerResult<RunSummary> {
    let mut sts = ShortTermScheduler::new(shutdown);
    let arrival_time = cpu.now_ms();
    for command in commands {
        sts.schedule_process(command, arrival_time);
    }

    let completed = sts.run(cpu, algorithm)?;
    Ok(RunSummary::from_rows(&completed))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::io::report::METRICS_HEADER;
    use crate::io::MemoryReport;
    use crate::kernel::launcher::fake::{FakeLauncher, Script};

    const MLFQ: MlfqConfig = MlfqConfig {
        quanta: [5, 10, 20],
        boost_time: 100,
    };

    fn config(policy: Policy, output_dir: &Path) -> DriverConfig {
        DriverConfig {
            policy,
            output_dir: output_dir.to_path_buf(),
            poll_interval: Duration::from_millis(10),
        }
    }

    fn fcfs(workload: impl Into<PathBuf>) -> Policy {
        Policy::Fcfs {
            workload: workload.into(),
        }
    }

    fn round_robin(quantum: u64) -> Policy {
        Policy::RoundRobin {
            workload: "w".into(),
            quantum,
        }
    }

    fn offline_mlfq(config: MlfqConfig) -> Policy {
        Policy::Mlfq {
            workload: "w".into(),
            config,
        }
    }

    #[test]
    fn test_driver_config_rejects_zero_quantum() {
        let dir = Path::new(".");
        let rr = config(round_robin(0), dir);
        assert!(matches!(rr.validate(), Err(SchedulerError::InvalidConfig(_))));

        let mut bad = MLFQ;
        bad.quanta[2] = 0;
        let mlfq = config(Policy::OnlineMlfq { config: bad }, dir);
        assert!(mlfq.validate().is_err());

        assert!(config(offline_mlfq(MLFQ), dir).validate().is_ok());
        assert!(config(Policy::ShortestJobFirst, dir).validate().is_ok());
    }

    #[test]
    fn test_driver_config_rejects_zero_poll_interval() {
        let mut sjf = config(Policy::ShortestJobFirst, Path::new("."));
        sjf.poll_interval = Duration::ZERO;
        assert!(sjf.validate().is_err());
    }

    #[test]
    fn test_driver_metrics_file_names() {
        let out = Path::new("out");
        assert_eq!(
            config(fcfs("w"), out).metrics_path(),
            out.join("result_offline_FCFS.csv")
        );
        assert_eq!(round_robin(1).metrics_file_name(), "result_offline_RR.csv");
        assert_eq!(offline_mlfq(MLFQ).metrics_file_name(), "result_offline_MLFQ.csv");
        assert_eq!(Policy::ShortestJobFirst.metrics_file_name(), "result_online_SJF.csv");
        assert_eq!(
            Policy::OnlineMlfq { config: MLFQ }.metrics_file_name(),
            "result_online_MLFQ.csv"
        );
    }

    #[test]
    fn test_run_summary_averages() {
        let row = |turnaround: u64, waiting: u64, error: bool| MetricsRow {
            command: "x".into(),
            finished: !error,
            error,
            burst_ms: turnaround - waiting,
            turnaround_ms: turnaround,
            waiting_ms: waiting,
            response_ms: waiting,
        };

        let summary = RunSummary::from_rows(&[row(100, 0, false), row(300, 100, true)]);

        assert_eq!(summary.processes, 2);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.avg_turnaround_ms, 200.0);
        assert_eq!(summary.avg_waiting_ms, 50.0);
    }

    #[test]
    fn test_run_summary_empty() {
        let summary = RunSummary::from_rows(&[]);
        assert_eq!(summary.processes, 0);
        assert_eq!(summary.avg_turnaround_ms, 0.0);
    }

    #[test]
    fn test_run_offline_with_every_algorithm() {
        let commands: Vec<String> = ["a", "b", "c"].iter().map(|c| c.to_string()).collect();
        let algorithms = [
            SchedulingAlgorithm::Fcfs,
            SchedulingAlgorithm::RoundRobin { quantum: 1 },
            SchedulingAlgorithm::Mlfq(MLFQ),
        ];

        for algorithm in algorithms {
            let launcher = FakeLauncher::default()
                .with("a", Script::exits_after(2, 0))
                .with("b", Script::exits_after(0, 1));
            let mut cpu = Cpu::new(Clock::start(), launcher, MemoryReport::default());

            let summary =
                run_offline_with(&mut cpu, &commands, algorithm, ShutdownToken::new()).unwrap();

            assert_eq!(summary.processes, 3, "{:?}", algorithm);
            assert_eq!(summary.errored, 1, "{:?}", algorithm);
            for row in &cpu.report().rows {
                assert_eq!(row.turnaround_ms, row.waiting_ms + row.burst_ms);
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_driver_start_offline_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let workload = dir.path().join("workload.txt");
        {
            let mut file = std::fs::File::create(&workload).unwrap();
            writeln!(file, "true").unwrap();
            writeln!(file, "false").unwrap();
            writeln!(file, "definitely-not-a-real-program-xyz").unwrap();
        }

        let out = dir.path().join("out");
        let mut driver = Driver::new(config(Policy::Fcfs { workload }, &out), ShutdownToken::new());
        let summary = driver.start().unwrap().unwrap();

        assert_eq!(summary.processes, 3);
        assert_eq!(summary.errored, 2);

        let csv = std::fs::read_to_string(out.join("result_offline_FCFS.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], METRICS_HEADER);
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("true,Yes,No,"));
        assert!(lines[2].starts_with("false,No,Yes,"));
        assert!(lines[3].starts_with("definitely-not-a-real-program-xyz,No,Yes,0,"));
    }

    #[test]
    fn test_driver_start_missing_workload() {
        let dir = tempfile::tempdir().unwrap();
        let policy = fcfs(dir.path().join("missing.txt"));
        let mut driver = Driver::new(config(policy, dir.path()), ShutdownToken::new());

        assert!(matches!(driver.start(), Err(SchedulerError::Io(_))));
    }
}
