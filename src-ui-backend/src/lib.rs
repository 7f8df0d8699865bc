//! Interaction core of the aqua parametric equalizer: text and slider
//! controls, arrow-repeat buttons, the value store seam, the controller that
//! ties them to the band list, and the response curve view.

pub mod arrow_repeat;
pub use arrow_repeat::ArrowRepeat;

pub mod controller;
pub use controller::{ControllerError, ControllerResult, EqualizerController};

pub mod curve_view;
pub use curve_view::{CurveCache, PathPoint, Viewport, svg_path, to_path};

pub mod logging;
pub use logging::init_logging;

pub mod numeric_input;
pub use numeric_input::{InputKey, NumericInput, StepDirection, StepKind, validate_draft};

pub mod range_input;
pub use range_input::{RangeInput, RangeUpdate};

pub mod store;
pub use store::{MemoryStore, ParamKey, StoreError, StoreResult, StoreWrite, ValueStore};

pub mod throttle;
pub use throttle::Throttle;

// Re-export the engine types so front-ends depend on one crate
pub use aqua_env::{EqualizerConfig, FieldSpec};
pub use aqua_iir::{CurvePoint, EqualizerState, FilterId, FilterSpec, FilterType, SampledCurve};
