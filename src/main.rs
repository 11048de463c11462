mod error;
mod io;
mod kernel;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use kernel::{Driver, DriverConfig, MlfqConfig, Policy, ShutdownToken};

/// Runs shell commands as real processes under a chosen CPU scheduling policy
/// and reports per-process metrics.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directory the metrics CSV is written to
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Log level, overridden by RUST_LOG when set
    #[arg(long, global = true, default_value = "info")]
    log_level: log::LevelFilter,

    /// How long the online schedulers sleep when there is nothing to run (ms)
    #[arg(long, global = true, default_value_t = 10)]
    poll_interval_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// First come first served over a workload file
    Fcfs { workload: PathBuf },
    /// Round robin over a workload file
    Rr {
        workload: PathBuf,
        #[arg(long)]
        quantum: u64,
    },
    /// Three-level feedback queue over a workload file
    Mlfq {
        workload: PathBuf,
        #[command(flatten)]
        mlfq: MlfqArgs,
    },
    /// Shortest job first over commands read from stdin
    Sjf,
    /// Feedback queue over commands read from stdin, placed by predicted burst
    MlfqOnline {
        #[command(flatten)]
        mlfq: MlfqArgs,
    },
}

#[derive(Debug, Args)]
struct MlfqArgs {
    #[arg(long)]
    quantum0: u64,
    #[arg(long)]
    quantum1: u64,
    #[arg(long)]
    quantum2: u64,
    /// Interval between priority boosts (ms)
    #[arg(long)]
    boost_time: u64,
}

impl From<MlfqArgs> for MlfqConfig {
    fn from(args: MlfqArgs) -> MlfqConfig {
        MlfqConfig {
            quanta: [args.quantum0, args.quantum1, args.quantum2],
            boost_time: args.boost_time,
        }
    }
}

impl From<Command> for Policy {
    fn from(command: Command) -> Policy {
        match command {
            Command::Fcfs { workload } => Policy::Fcfs { workload },
            Command::Rr { workload, quantum } => Policy::RoundRobin { workload, quantum },
            Command::Mlfq { workload, mlfq } => Policy::Mlfq {
                workload,
                config: mlfq.into(),
            },
            Command::Sjf => Policy::ShortestJobFirst,
            Command::MlfqOnline { mlfq } => Policy::OnlineMlfq {
                config: mlfq.into(),
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .parse_default_env()
        .init();

    let shutdown = ShutdownToken::new();
    let handler_token = shutdown.clone();
    ctrlc::set_handler(move || {
        log::warn!("Interrupt received, stopping after the current slice");
        handler_token.trigger();
    })
    .context("failed to install the interrupt handler")?;

    let config = DriverConfig {
        policy: cli.command.into(),
        output_dir: cli.output_dir,
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
    };

    let mut driver = Driver::new(config, shutdown);
    driver.start().context("scheduler run failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_offline_mlfq() {
        let cli = Cli::try_parse_from([
            "scheduler",
            "--output-dir",
            "out",
            "mlfq",
            "jobs.txt",
            "--quantum0",
            "10",
            "--quantum1",
            "20",
            "--quantum2",
            "40",
            "--boost-time",
            "500",
        ])
        .unwrap();

        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert_eq!(
            Policy::from(cli.command),
            Policy::Mlfq {
                workload: "jobs.txt".into(),
                config: MlfqConfig {
                    quanta: [10, 20, 40],
                    boost_time: 500,
                },
            }
        );
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["scheduler", "sjf"]).unwrap();

        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert_eq!(cli.log_level, log::LevelFilter::Info);
        assert_eq!(cli.poll_interval_ms, 10);
        assert_eq!(Policy::from(cli.command), Policy::ShortestJobFirst);
    }

    #[test]
    fn test_cli_rr_requires_quantum() {
        assert!(Cli::try_parse_from(["scheduler", "rr", "jobs.txt"]).is_err());

        let cli = Cli::try_parse_from(["scheduler", "rr", "jobs.txt", "--quantum", "50"]).unwrap();
        assert_eq!(
            Policy::from(cli.command),
            Policy::RoundRobin {
                workload: "jobs.txt".into(),
                quantum: 50
            }
        );
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let args = ["scheduler", "fcfs", "jobs.txt", "--poll-interval-ms", "25"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.poll_interval_ms, 25);
    }
}
