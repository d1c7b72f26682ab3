//! Website up/down edge detection, one flag per URL.
//!
//! A URL with no prior observation notifies only if it is down; afterwards
//! only the up→down and down→up edges notify. Steady repeats are silent.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteTransition {
    WentDown,
    Recovered,
    Steady,
}

impl SiteTransition {
    pub fn should_notify(self) -> bool {
        !matches!(self, SiteTransition::Steady)
    }
}

#[derive(Debug, Default)]
pub struct SiteStates {
    last_known_up: HashMap<String, bool>,
}

impl SiteStates {
    pub fn observe(&mut self, url: &str, is_up: bool) -> SiteTransition {
        let previous = self.last_known_up.insert(url.to_string(), is_up);

        match (previous, is_up) {
            (None, false) => SiteTransition::WentDown,
            (Some(true), false) => SiteTransition::WentDown,
            (Some(false), true) => SiteTransition::Recovered,
            _ => SiteTransition::Steady,
        }
    }

    pub fn is_up(&self, url: &str) -> Option<bool> {
        self.last_known_up.get(url).copied()
    }
}
