//! Press-and-hold stepping for the arrow buttons next to a numeric field.
//!
//! A press fires one step at once; while the pointer stays down over the
//! button further steps fall due every repeat interval. The caller drives
//! [`ArrowRepeat::tick`] from its event loop at [`ArrowRepeat::next_deadline`].

use std::time::{Duration, Instant};

use aqua_env::InteractionConfig;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct ArrowRepeat {
    interval: Duration,
    disabled: bool,
    next_fire: Option<Instant>,
}

impl ArrowRepeat {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            disabled: false,
            next_fire: None,
        }
    }

    pub fn from_config(interaction: &InteractionConfig) -> Self {
        Self::new(interaction.repeat_interval())
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_repeating(&self) -> bool {
        self.next_fire.is_some()
    }

    /// Disabling also stops a repeat in progress.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.next_fire = None;
        }
    }

    /// Pointer down. Returns whether the immediate step fires.
    pub fn press(&mut self, now: Instant) -> bool {
        if self.disabled {
            return false;
        }
        self.next_fire = Some(now + self.interval);
        true
    }

    /// Number of repeat steps that fell due up to `now`.
    pub fn tick(&mut self, now: Instant) -> u32 {
        let Some(mut next) = self.next_fire else {
            return 0;
        };
        let mut due = 0;
        while next <= now {
            due += 1;
            next += self.interval;
        }
        self.next_fire = Some(next);
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_fire
    }

    /// Pointer up.
    pub fn release(&mut self) {
        self.next_fire = None;
    }

    /// Pointer left the button while held.
    pub fn leave(&mut self) {
        self.next_fire = None;
    }

    /// Enter/Space on a focused button: exactly one step, never a repeat.
    pub fn activate_key(&self) -> bool {
        !self.disabled
    }
}
