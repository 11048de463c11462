use super::{Clock, ProcessControlBlock, ProcessId, ProcessTable};

use crate::io::ArrivalFeed;

/// Admits requested commands into the process table as they arrive.
pub(crate) struct LongTermScheduler<F: ArrivalFeed> {
    feed: F,
    admitted: u64,
}

impl<F: ArrivalFeed> LongTermScheduler<F> {
    pub fn new(feed: F) -> LongTermScheduler<F> {
        LongTermScheduler { feed, admitted: 0 }
    }

    /// Drains whatever the feed has, stamping each arrival with the time its
    /// line was read. Returns the new ids in arrival order.
    pub fn admit(&mut self, clock: &Clock, table: &mut ProcessTable) -> Vec<ProcessId> {
        let arrivals = self.feed.poll();
        let mut process_ids = Vec::with_capacity(arrivals.len());

        for arrival in arrivals {
            let arrival_time = clock.millis_at(arrival.read_at);
            log::debug!("Admitted '{}' at {} ms", arrival.command, arrival_time);
            process_ids.push(table.insert(ProcessControlBlock::new(arrival.command, arrival_time)));
        }

        self.admitted += process_ids.len() as u64;
        process_ids
    }

    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    pub fn feed_exhausted(&self) -> bool {
        self.feed.is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::arrival_feed::ScriptedFeed;

    #[test]
    fn test_long_term_scheduler_admit_in_arrival_order() {
        let clock = Clock::start();
        let mut table = ProcessTable::new();
        let mut lts = LongTermScheduler::new(ScriptedFeed::new(vec![vec!["a", "b"], vec!["c"]]));

        let first = lts.admit(&clock, &mut table);
        let second = lts.admit(&clock, &mut table);

        assert_eq!(first.len(), 2);
        assert_eq!(table.get(first[0]).unwrap().get_command(), "a");
        assert_eq!(table.get(first[1]).unwrap().get_command(), "b");
        assert_eq!(table.get(second[0]).unwrap().get_command(), "c");
        assert_eq!(lts.admitted(), 3);
        assert!(lts.feed_exhausted());
    }

    #[test]
    fn test_long_term_scheduler_admit_nothing() {
        let clock = Clock::start();
        let mut table = ProcessTable::new();
        let mut lts = LongTermScheduler::new(ScriptedFeed::new(vec![]));

        assert!(lts.admit(&clock, &mut table).is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_long_term_scheduler_stamps_arrival_time() {
        let clock = Clock::start();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let mut table = ProcessTable::new();
        let mut lts = LongTermScheduler::new(ScriptedFeed::new(vec![vec!["a"]]));

        let ids = lts.admit(&clock, &mut table);
        assert!(table.get(ids[0]).unwrap().get_arrival_time() >= 20);
    }
}
