// ----------------------------------------------------------------------
// Range / slider input
// ----------------------------------------------------------------------
//
// The handle follows every input event (preview); writes to the store are
// throttled while a drag is in progress and flushed once on release.

use std::time::{Duration, Instant};

use aqua_env::{FieldSpec, InteractionConfig, round_to_precision};

use crate::numeric_input::{StepDirection, StepKind};
use crate::throttle::Throttle;

/// Outcome of one slider event: the value to show, and the value to write, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeUpdate {
    pub preview: f64,
    pub commit: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct RangeInput {
    spec: FieldSpec,
    display_precision: u32,
    wheel_multiplier: f64,
    value: f64,
    live: f64,
    dragging: bool,
    throttle: Throttle<f64>,
}

impl RangeInput {
    pub fn new(spec: FieldSpec, value: f64, throttle_interval: Duration) -> Self {
        Self {
            spec,
            display_precision: spec.precision,
            wheel_multiplier: 10.0,
            value,
            live: value,
            dragging: false,
            throttle: Throttle::new(throttle_interval),
        }
    }

    pub fn from_config(spec: FieldSpec, value: f64, interaction: &InteractionConfig) -> Self {
        Self::new(spec, value, interaction.throttle_interval())
            .with_wheel_multiplier(interaction.wheel_multiplier)
    }

    pub fn with_display_precision(mut self, display_precision: u32) -> Self {
        self.display_precision = display_precision;
        self
    }

    pub fn with_wheel_multiplier(mut self, wheel_multiplier: f64) -> Self {
        self.wheel_multiplier = wheel_multiplier;
        self
    }

    /// Last committed (or externally set) value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value under the handle, committed or not
    pub fn live_value(&self) -> f64 {
        self.live
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Handle position snapped to the display precision.
    pub fn handle_position(&self) -> f64 {
        round_to_precision(self.live, self.display_precision)
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
        self.throttle.reset();
    }

    /// Raw value from the slider. Outside a drag every input commits.
    pub fn input(&mut self, raw: f64, now: Instant) -> RangeUpdate {
        let value = self.spec.clamp(round_to_precision(raw, self.spec.precision));
        self.live = value;
        let commit = if self.dragging {
            self.throttle.offer(value, now)
        } else {
            Some(value)
        };
        if let Some(committed) = commit {
            self.value = committed;
        }
        RangeUpdate {
            preview: value,
            commit,
        }
    }

    /// Trailing commit of a drag that went quiet; call at [`RangeInput::next_deadline`].
    pub fn poll(&mut self, now: Instant) -> Option<f64> {
        let committed = self.throttle.poll(now)?;
        self.value = committed;
        Some(committed)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.next_deadline()
    }

    /// End of a drag: always commits the value under the handle.
    pub fn release(&mut self) -> Option<f64> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        self.throttle.reset();
        self.value = self.live;
        log::debug!("slider released at {}", self.live);
        Some(self.live)
    }

    /// Arrow or wheel step from the live value, previewed and committed together.
    pub fn step(&mut self, direction: StepDirection, kind: StepKind) -> RangeUpdate {
        let units = match kind {
            StepKind::Arrow => 1.0,
            StepKind::Wheel => self.wheel_multiplier,
        };
        let next = self.live + direction.sign() * units * self.spec.increment();
        let value = self.spec.clamp(round_to_precision(next, self.spec.precision));
        self.live = value;
        self.value = value;
        RangeUpdate {
            preview: value,
            commit: Some(value),
        }
    }

    /// Value pushed from outside; a drag in progress keeps its own position.
    pub fn set_value(&mut self, value: f64) {
        if self.dragging {
            return;
        }
        self.value = value;
        self.live = value;
    }
}
