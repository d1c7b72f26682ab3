//! Pending OS update change detection: set equality over package names.

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct UpdatesState {
    packages: Vec<String>,
}

impl UpdatesState {
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Returns whether the pending set differs from the previous sample.
    /// Both a newly appearing package and the set draining to empty count.
    pub fn observe(&mut self, packages: &[String]) -> bool {
        let new: HashSet<&str> = packages.iter().map(String::as_str).collect();
        let old: HashSet<&str> = self.packages.iter().map(String::as_str).collect();

        if new == old {
            return false;
        }

        self.packages = packages.to_vec();
        true
    }
}
