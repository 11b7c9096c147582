//! Bounded per-controller history of first-pressed game buttons, used by
//! screens to detect button sequences (menu codes, unlock cheats).

use std::collections::VecDeque;

use crate::mapping::{GameButton, GameController, GameInput};

pub const HISTORY_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Remembered {
    button: GameButton,
    at: f64,
}

pub struct InputQueue {
    history: [VecDeque<Remembered>; 2],
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            history: [
                VecDeque::with_capacity(HISTORY_CAPACITY),
                VecDeque::with_capacity(HISTORY_CAPACITY),
            ],
        }
    }

    /// Appends a first press; the oldest entry is evicted at capacity.
    pub fn remember(&mut self, input: GameInput, at: f64) {
        let history = &mut self.history[input.controller.index()];
        if history.len() == HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(Remembered {
            button: input.button,
            at,
        });
    }

    pub fn len(&self, controller: GameController) -> usize {
        self.history[controller.index()].len()
    }

    pub fn is_empty(&self, controller: GameController) -> bool {
        self.history[controller.index()].is_empty()
    }

    /// True when the most recent presses for `controller` are exactly
    /// `sequence`, and the whole sequence was entered within `max_span` seconds.
    pub fn matches_sequence(
        &self,
        controller: GameController,
        sequence: &[GameButton],
        max_span: f64,
    ) -> bool {
        let history = &self.history[controller.index()];
        if sequence.is_empty() || sequence.len() > history.len() {
            return false;
        }
        let tail = history.iter().skip(history.len() - sequence.len());
        let mut first_at = None;
        let mut last_at = 0.0;
        for (entry, &wanted) in tail.zip(sequence) {
            if entry.button != wanted {
                return false;
            }
            first_at.get_or_insert(entry.at);
            last_at = entry.at;
        }
        first_at.is_some_and(|first| last_at - first <= max_span)
    }

    pub fn clear(&mut self, controller: GameController) {
        self.history[controller.index()].clear();
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
