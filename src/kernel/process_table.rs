use std::fmt;

use super::ProcessControlBlock;

use crate::error::{SchedulerError, SchedulerResult};

/// Stable handle into the process table. Queues and pending lists hold these
/// rather than the control blocks themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ProcessId(usize);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arena of process control blocks. Freed slots are reused.
#[derive(Default)]
pub(crate) struct ProcessTable {
    slots: Vec<Option<ProcessControlBlock>>,
    free: Vec<usize>,
    live: usize,
}

impl ProcessTable {
    pub fn new() -> ProcessTable {
        ProcessTable::default()
    }

    pub fn insert(&mut self, pcb: ProcessControlBlock) -> ProcessId {
        self.live += 1;

        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(pcb);
                ProcessId(idx)
            }
            None => {
                self.slots.push(Some(pcb));
                ProcessId(self.slots.len() - 1)
            }
        }
    }

    pub fn get(&self, id: ProcessId) -> SchedulerResult<&ProcessControlBlock> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(SchedulerError::UnknownProcess(id.0))
    }

    pub fn get_mut(&mut self, id: ProcessId) -> SchedulerResult<&mut ProcessControlBlock> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SchedulerError::UnknownProcess(id.0))
    }

    pub fn remove(&mut self, id: ProcessId) -> SchedulerResult<ProcessControlBlock> {
        let pcb = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(SchedulerError::UnknownProcess(id.0))?;

        self.free.push(id.0);
        self.live -= 1;
        Ok(pcb)
    }

    /// Ids of live entries in slot order.
    pub fn ids(&self) -> Vec<ProcessId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(idx, _)| ProcessId(idx))
            .collect()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &ProcessControlBlock> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_table_insert_then_get() {
        let mut table = ProcessTable::new();
        let a = table.insert(ProcessControlBlock::new("a", 0));
        let b = table.insert(ProcessControlBlock::new("b", 0));

        assert_eq!(table.get(a).unwrap().get_command(), "a");
        assert_eq!(table.get(b).unwrap().get_command(), "b");
        assert_eq!(table.len(), 2);
        assert_eq!(table.ids(), vec![a, b]);
    }

    #[test]
    fn test_process_table_remove_then_reuse_slot() {
        let mut table = ProcessTable::new();
        let a = table.insert(ProcessControlBlock::new("a", 0));
        let _b = table.insert(ProcessControlBlock::new("b", 0));

        let removed = table.remove(a).unwrap();
        assert_eq!(removed.get_command(), "a");
        assert!(table.get(a).is_err());
        assert_eq!(table.len(), 1);

        let c = table.insert(ProcessControlBlock::new("c", 0));
        assert_eq!(c, a);
        assert_eq!(table.get(c).unwrap().get_command(), "c");
    }

    #[test]
    fn test_process_table_unknown_id() {
        let mut table = ProcessTable::new();
        let a = table.insert(ProcessControlBlock::new("a", 0));
        table.remove(a).unwrap();

        assert!(matches!(table.remove(a), Err(SchedulerError::UnknownProcess(_))));
        assert!(table.is_empty());
    }

    #[test]
    fn test_process_table_iter_skips_free_slots() {
        let mut table = ProcessTable::new();
        let a = table.insert(ProcessControlBlock::new("a", 0));
        table.insert(ProcessControlBlock::new("b", 0));
        table.remove(a).unwrap();

        let commands: Vec<&str> = table.iter().map(|p| p.get_command()).collect();
        assert_eq!(commands, vec!["b"]);
    }
}
