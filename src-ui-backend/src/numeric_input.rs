// ----------------------------------------------------------------------
// Numeric text input
// ----------------------------------------------------------------------
//
// A text field bound to one number. Keystrokes edit a draft that is only
// accepted when it stays a plausible prefix of a valid number; Enter or blur
// turns the draft into a rounded, clamped value handed back to the caller.

use std::sync::LazyLock;

use aqua_env::{FieldSpec, format_number, round_to_precision};
use regex::Regex;

static INTEGER_ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?0+$").expect("integer zero pattern"));
static FLOAT_ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?0*\.?0*$").expect("float zero pattern"));
static FLOAT_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)$").expect("float literal pattern"));

/// Direction of an arrow key, wheel notch or repeat-button step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

impl StepDirection {
    pub fn sign(self) -> f64 {
        match self {
            StepDirection::Up => 1.0,
            StepDirection::Down => -1.0,
        }
    }

    /// Scrolling away from the user (negative delta) steps up.
    pub fn from_wheel_delta(delta: f64) -> Option<Self> {
        if delta < 0.0 {
            Some(StepDirection::Up)
        } else if delta > 0.0 {
            Some(StepDirection::Down)
        } else {
            None
        }
    }
}

/// Size of a step: one unit of the last decimal, or `wheel_multiplier` units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Arrow,
    Wheel,
}

/// Keyboard events understood by [`NumericInput::handle_key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    Char(char),
    Backspace,
    Enter,
    Escape,
    ArrowUp,
    ArrowDown,
}

/// Whether `proposed` may replace `current` as the draft of a field bounded by `spec`.
pub fn validate_draft(current: &str, proposed: &str, spec: &FieldSpec) -> bool {
    if proposed == current {
        return true;
    }

    match proposed {
        "" => return true,
        "-" => return spec.allows_negative(),
        "." => return spec.is_float(),
        _ => {}
    }

    if proposed.contains(['e', 'E']) {
        return false;
    }

    let minus = proposed.matches('-').count();
    if minus > 1 || (minus == 1 && (!proposed.starts_with('-') || !spec.allows_negative())) {
        return false;
    }

    let dots = proposed.matches('.').count();
    if dots > 1 {
        return false;
    }

    let len = proposed.chars().filter(|&c| c != '.').count();
    if len > spec.max_draft_len() {
        return false;
    }

    if spec.is_float() {
        FLOAT_ZERO.is_match(proposed) || FLOAT_LITERAL.is_match(proposed)
    } else {
        match proposed.parse::<i64>() {
            Ok(0) => INTEGER_ZERO.is_match(proposed),
            Ok(n) => n.to_string() == proposed,
            Err(_) => false,
        }
    }
}

/// Round a parsed number the way a commit does, before clamping.
fn round_for_commit(num: f64, spec: &FieldSpec) -> f64 {
    if spec.is_float() && spec.round_to_half {
        let factor = 10.0_f64.powi(spec.precision as i32);
        let scaled = (num * factor).round();
        ((scaled / 5.0).round() * 5.0) / factor
    } else {
        round_to_precision(num, spec.precision)
    }
}

/// Text shown for `value`, rounded to the field's precision so it always
/// parses back under the field's grammar.
fn display_text(value: f64, spec: &FieldSpec) -> String {
    format_number(round_to_precision(value, spec.precision))
}

/// Draft/value state of one numeric text field.
#[derive(Debug, Clone)]
pub struct NumericInput {
    spec: FieldSpec,
    wheel_multiplier: f64,
    value: f64,
    draft: String,
    dirty: bool,
}

impl NumericInput {
    pub fn new(spec: FieldSpec, value: f64) -> Self {
        Self {
            spec,
            wheel_multiplier: 10.0,
            value,
            draft: display_text(value, &spec),
            dirty: false,
        }
    }

    pub fn with_wheel_multiplier(mut self, wheel_multiplier: f64) -> Self {
        self.wheel_multiplier = wheel_multiplier;
        self
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the whole draft. Returns `false` and keeps the old draft when rejected.
    pub fn edit(&mut self, proposed: &str) -> bool {
        if !validate_draft(&self.draft, proposed, &self.spec) {
            log::trace!("rejected draft {:?}", proposed);
            return false;
        }
        self.draft = proposed.to_string();
        self.dirty = self.draft != display_text(self.value, &self.spec);
        true
    }

    /// Append one typed character to the draft.
    pub fn insert(&mut self, ch: char) -> bool {
        let mut proposed = self.draft.clone();
        proposed.push(ch);
        self.edit(&proposed)
    }

    pub fn backspace(&mut self) -> bool {
        let mut proposed = self.draft.clone();
        if proposed.pop().is_none() {
            return false;
        }
        self.edit(&proposed)
    }

    fn revert(&mut self) {
        self.draft = display_text(self.value, &self.spec);
        self.dirty = false;
    }

    fn accept(&mut self, value: f64) -> f64 {
        self.value = value;
        self.revert();
        value
    }

    /// Turn the draft into a committed value (Enter or blur).
    ///
    /// Transient drafts (`""`, `"-"`, `"."` and the like) revert to the last
    /// value and commit nothing.
    pub fn commit(&mut self) -> Option<f64> {
        let parsed = match self.draft.as_str() {
            "" | "-" | "." => None,
            draft => draft.parse::<f64>().ok(),
        };
        match parsed {
            Some(num) => {
                let value = self.spec.clamp(round_for_commit(num, &self.spec));
                log::debug!("commit {:?} -> {}", self.draft, value);
                Some(self.accept(value))
            }
            None => {
                self.revert();
                None
            }
        }
    }

    pub fn blur(&mut self) -> Option<f64> {
        self.commit()
    }

    /// Escape: drop the draft without committing.
    pub fn cancel(&mut self) {
        self.revert();
    }

    /// Step the committed value and commit the result right away.
    pub fn step(&mut self, direction: StepDirection, kind: StepKind) -> f64 {
        let units = match kind {
            StepKind::Arrow => 1.0,
            StepKind::Wheel => self.wheel_multiplier,
        };
        let next = self.value + direction.sign() * units * self.spec.increment();
        let value = self.spec.clamp(round_to_precision(next, self.spec.precision));
        self.accept(value)
    }

    pub fn wheel(&mut self, delta: f64) -> Option<f64> {
        StepDirection::from_wheel_delta(delta).map(|direction| self.step(direction, StepKind::Wheel))
    }

    /// Dispatch a key event; returns the committed value, if any.
    pub fn handle_key(&mut self, key: InputKey) -> Option<f64> {
        match key {
            InputKey::Char(ch) => {
                self.insert(ch);
                None
            }
            InputKey::Backspace => {
                self.backspace();
                None
            }
            InputKey::Enter => self.commit(),
            InputKey::Escape => {
                self.cancel();
                None
            }
            InputKey::ArrowUp => Some(self.step(StepDirection::Up, StepKind::Arrow)),
            InputKey::ArrowDown => Some(self.step(StepDirection::Down, StepKind::Arrow)),
        }
    }

    /// Value pushed from outside. Shown only when no edit is in progress.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        if !self.dirty {
            self.draft = display_text(value, &self.spec);
        }
    }
}
