use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{SchedulerError, SchedulerResult};

/// Reads an offline workload: one command per line.
/// Blank lines and lines starting with `#` are skipped.
pub fn load_workload(path: &Path) -> SchedulerResult<Vec<String>> {
    let file = File::open(path)?;
    let commands = parse_workload(BufReader::new(file))?;

    if commands.is_empty() {
        return Err(SchedulerError::EmptyWorkload(path.to_path_buf()));
    }

    log::info!("Loaded {} commands from {}", commands.len(), path.display());
    Ok(commands)
}

pub fn parse_workload<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut commands = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        commands.push(line.to_string());
    }

    Ok(commands)
}
