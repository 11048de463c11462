use std::collections::HashMap;

/// Prediction for a command that has never been seen.
pub(crate) const SEED_BURST_MS: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BurstHistoryEntry {
    pub avg_burst_time: f64,
    pub sample_count: u64,
}

impl BurstHistoryEntry {
    fn seeded() -> BurstHistoryEntry {
        BurstHistoryEntry {
            avg_burst_time: SEED_BURST_MS,
            sample_count: 0,
        }
    }

    /// Incremental mean. The seed carries no weight once a sample exists.
    pub fn record(&mut self, observed_burst: u64) {
        let count = self.sample_count as f64;
        self.avg_burst_time = (self.avg_burst_time * count + observed_burst as f64) / (count + 1.0);
        self.sample_count += 1;
    }
}

/// Running average burst time per command text, kept for the whole run.
#[derive(Debug, Default)]
pub(crate) struct BurstHistory {
    entries: HashMap<String, BurstHistoryEntry>,
}

impl BurstHistory {
    pub fn new() -> BurstHistory {
        BurstHistory::default()
    }

    pub fn contains(&self, command: &str) -> bool {
        self.entries.contains_key(command)
    }

    pub fn lookup_or_create(&mut self, command: &str) -> &mut BurstHistoryEntry {
        if !self.entries.contains_key(command) {
            log::debug!("First sighting of '{}', seeding history", command);
        }
        self.entries
            .entry(command.to_string())
            .or_insert_with(BurstHistoryEntry::seeded)
    }

    /// Predicted burst; the seed value for unknown commands.
    pub fn predict(&self, command: &str) -> f64 {
        self.entries
            .get(command)
            .map_or(SEED_BURST_MS, |entry| entry.avg_burst_time)
    }

    pub fn record(&mut self, command: &str, observed_burst: u64) {
        let entry = self.lookup_or_create(command);
        entry.record(observed_burst);
        log::debug!(
            "History for '{}': avg {:.1} ms over {} samples",
            command,
            entry.avg_burst_time,
            entry.sample_count
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
