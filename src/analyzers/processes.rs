//! Failed-process and miner-signature change detection.
//!
//! Two independent sets are tracked per server: processes whose reported
//! status is "failed", and processes whose name matches a configured miner
//! signature. Change detection is set-of-names equality against the prior
//! sample, so additions and removals both count while reordering does not.

use std::collections::HashSet;

use crate::ProcessEntry;

#[derive(Debug, Clone, Default)]
pub struct ProcessesState {
    failed: Vec<ProcessEntry>,
    miners: Vec<ProcessEntry>,
}

/// Case-insensitive exact match against the suspect list.
pub fn is_miner(name: &str, signatures: &[String]) -> bool {
    signatures.iter().any(|sig| sig.eq_ignore_ascii_case(name))
}

fn name_set(entries: &[ProcessEntry]) -> HashSet<&str> {
    entries.iter().map(|entry| entry.name.as_str()).collect()
}

impl ProcessesState {
    pub fn failed(&self) -> &[ProcessEntry] {
        &self.failed
    }

    pub fn miners(&self) -> &[ProcessEntry] {
        &self.miners
    }

    /// Feed one merged sample from both sources. Returns whether either
    /// set's membership differs from the previous sample. An empty sample
    /// is treated as "no data" and changes nothing.
    pub fn observe(&mut self, entries: &[ProcessEntry], miner_signatures: &[String]) -> bool {
        if entries.is_empty() {
            return false;
        }

        let failed: Vec<ProcessEntry> = entries.iter().filter(|e| e.failed).cloned().collect();
        let miners: Vec<ProcessEntry> = entries
            .iter()
            .filter(|e| is_miner(&e.name, miner_signatures))
            .cloned()
            .collect();

        let mut changed = false;

        if name_set(&failed) != name_set(&self.failed) {
            self.failed = failed;
            changed = true;
        }

        if name_set(&miners) != name_set(&self.miners) {
            self.miners = miners;
            changed = true;
        }

        changed
    }
}
