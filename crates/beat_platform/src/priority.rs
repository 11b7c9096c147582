//! Scheduling-priority hint.
//!
//! Boosting is a best-effort request and never affects correctness. The hint
//! tracks the requested state and logs transitions.

pub struct PriorityHint {
    enabled: bool,
    boosted: bool,
}

impl PriorityHint {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            boosted: false,
        }
    }

    pub fn boost(&mut self) {
        self.apply(true);
    }

    pub fn restore(&mut self) {
        self.apply(false);
    }

    pub fn is_boosted(&self) -> bool {
        self.boosted
    }

    fn apply(&mut self, boosted: bool) {
        if !self.enabled || self.boosted == boosted {
            return;
        }
        self.boosted = boosted;
        log::debug!(
            "Process priority {}",
            if boosted { "boosted" } else { "restored" }
        );
    }
}
