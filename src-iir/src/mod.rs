#![doc = include_str!("../README.md")]

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

pub mod curve;

pub use curve::{
    CurvePoint, SampledCurve, aggregate_response, compute_avg_freq, compute_curve,
    compute_markers, sample_frequencies,
};

/// Smallest squared magnitude reported by the engine (-200 dB)
const MIN_MAGNITUDE_SQUARED: f64 = 1.0e-20;

/// Smallest quality used when computing coefficients
const MIN_Q: f64 = 1.0e-3;

/// Filter types a band can hold
///
/// Only `Peak`, `LowShelf` and `HighShelf` have a transfer function. The other
/// variants are kept as data and contribute a flat 0 dB response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    /// Peaking filter
    Peak,
    /// Low-shelf filter
    LowShelf,
    /// High-shelf filter
    HighShelf,
    /// Notch filter
    Notch,
    /// Low-pass filter with variable Q
    LowPassQ,
    /// High-pass filter with variable Q
    HighPassQ,
    /// Band-pass filter
    BandPass,
    /// Low-pass filter
    LowPass,
    /// High-pass filter
    HighPass,
    /// All-pass filter
    AllPass,
}

impl FilterType {
    pub const ALL: [FilterType; 10] = [
        FilterType::Peak,
        FilterType::LowShelf,
        FilterType::HighShelf,
        FilterType::Notch,
        FilterType::LowPassQ,
        FilterType::HighPassQ,
        FilterType::BandPass,
        FilterType::LowPass,
        FilterType::HighPass,
        FilterType::AllPass,
    ];

    /// Returns the short code of the filter type (e.g., "PK").
    pub fn short_name(&self) -> &'static str {
        match self {
            FilterType::Peak => "PK",
            FilterType::LowShelf => "LSC",
            FilterType::HighShelf => "HSC",
            FilterType::Notch => "NO",
            FilterType::LowPassQ => "LPQ",
            FilterType::HighPassQ => "HPQ",
            FilterType::BandPass => "BP",
            FilterType::LowPass => "LP",
            FilterType::HighPass => "HP",
            FilterType::AllPass => "AP",
        }
    }

    /// Returns the long name of the filter type (e.g., "LowShelf").
    pub fn long_name(&self) -> &'static str {
        match self {
            FilterType::Peak => "Peak",
            FilterType::LowShelf => "LowShelf",
            FilterType::HighShelf => "HighShelf",
            FilterType::Notch => "Notch",
            FilterType::LowPassQ => "LowPassQ",
            FilterType::HighPassQ => "HighPassQ",
            FilterType::BandPass => "BandPass",
            FilterType::LowPass => "LowPass",
            FilterType::HighPass => "HighPass",
            FilterType::AllPass => "AllPass",
        }
    }

    /// Whether the engine computes a transfer function for this type.
    pub fn has_response(&self) -> bool {
        matches!(
            self,
            FilterType::Peak | FilterType::LowShelf | FilterType::HighShelf
        )
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter type: {0}")]
pub struct UnknownFilterType(pub String);

impl FromStr for FilterType {
    type Err = UnknownFilterType;

    /// Accepts the short code or the long name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterType::ALL
            .into_iter()
            .find(|t| t.short_name().eq_ignore_ascii_case(s) || t.long_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownFilterType(s.to_string()))
    }
}

/// Stable identifier of a band, never reused after deletion
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(pub String);

impl FilterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FilterId {
    fn from(s: &str) -> Self {
        FilterId(s.to_string())
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One equalizer band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub id: FilterId,
    /// Center or corner frequency in Hz
    pub frequency: f64,
    /// Gain in dB
    pub gain: f64,
    /// Q factor
    pub quality: f64,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
}

impl FilterSpec {
    pub fn new(id: impl Into<FilterId>, filter_type: FilterType, frequency: f64, gain: f64, quality: f64) -> Self {
        Self {
            id: id.into(),
            frequency,
            gain,
            quality,
            filter_type,
        }
    }

    /// Same transfer function as `other`, ignoring the id.
    pub fn same_response(&self, other: &FilterSpec) -> bool {
        self.filter_type == other.filter_type
            && self.frequency == other.frequency
            && self.gain == other.gain
            && self.quality == other.quality
    }
}

/// Band collection plus pre-amp, as held by the external equalizer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqualizerState {
    pub filters: Vec<FilterSpec>,
    /// Pre-amp gain in dB
    #[serde(default)]
    pub preamp: f64,
}

impl EqualizerState {
    pub fn new(filters: Vec<FilterSpec>, preamp: f64) -> Self {
        let mut state = Self { filters, preamp };
        state.sort_by_frequency();
        state
    }

    /// Stable sort by ascending frequency; equal frequencies keep their order.
    pub fn sort_by_frequency(&mut self) {
        self.filters.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    }

    pub fn is_sorted(&self) -> bool {
        self.filters.windows(2).all(|w| w[0].frequency <= w[1].frequency)
    }

    pub fn position(&self, id: &FilterId) -> Option<usize> {
        self.filters.iter().position(|f| &f.id == id)
    }

    pub fn find(&self, id: &FilterId) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| &f.id == id)
    }

    pub fn find_mut(&mut self, id: &FilterId) -> Option<&mut FilterSpec> {
        self.filters.iter_mut().find(|f| &f.id == id)
    }
}

/// Transfer function of a single band, normalized so that `a0 = 1`.
#[derive(Debug, Clone)]
pub struct Biquad {
    /// The type of filter
    pub filter_type: FilterType,
    /// Center frequency in Hz
    pub freq: f64,
    /// Sample rate in Hz
    pub srate: f64,
    /// Q factor (quality factor)
    pub q: f64,
    /// Gain in dB (for peaking and shelving filters)
    pub db_gain: f64,
    /// Filter coefficients
    a1: f64,
    a2: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    /// Pre-computed polynomial terms in phi for the magnitude response
    r_up0: f64,
    r_up1: f64,
    r_up2: f64,
    r_dw0: f64,
    r_dw1: f64,
    r_dw2: f64,
}

impl Biquad {
    /// Creates a biquad and derives its coefficients.
    pub fn new(filter_type: FilterType, freq: f64, srate: f64, q: f64, db_gain: f64) -> Self {
        let mut biquad = Biquad {
            filter_type,
            freq,
            srate,
            q,
            db_gain,
            a1: 0.0,
            a2: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            r_up0: 0.0,
            r_up1: 0.0,
            r_up2: 0.0,
            r_dw0: 0.0,
            r_dw1: 0.0,
            r_dw2: 0.0,
        };

        // alpha divides by q
        if !(biquad.q > 0.0) {
            biquad.q = MIN_Q;
        }

        biquad.compute_coeffs();
        biquad
    }

    /// Biquad of a band at the given sample rate.
    pub fn from_spec(spec: &FilterSpec, srate: f64) -> Self {
        Self::new(spec.filter_type, spec.frequency, srate, spec.quality, spec.gain)
    }

    fn compute_coeffs(&mut self) {
        let a = 10.0_f64.powf(self.db_gain / 40.0);
        let omega = 2.0 * PI * self.freq / self.srate;
        let sn = omega.sin();
        let cs = omega.cos();

        let (b0, b1, b2, a0, a1, a2);

        match self.filter_type {
            FilterType::Peak => {
                let alpha = sn / (2.0 * self.q);
                b0 = 1.0 + (alpha * a);
                b1 = -2.0 * cs;
                b2 = 1.0 - (alpha * a);
                a0 = 1.0 + (alpha / a);
                a1 = -2.0 * cs;
                a2 = 1.0 - (alpha / a);
            }
            FilterType::LowShelf => {
                // Shelves use half the band quality
                let alpha = sn / (2.0 * (self.q / 2.0));
                let beta = 2.0 * a.sqrt() * alpha;
                b0 = a * ((a + 1.0) - (a - 1.0) * cs + beta);
                b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cs);
                b2 = a * ((a + 1.0) - (a - 1.0) * cs - beta);
                a0 = (a + 1.0) + (a - 1.0) * cs + beta;
                a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cs);
                a2 = (a + 1.0) + (a - 1.0) * cs - beta;
            }
            FilterType::HighShelf => {
                let alpha = sn / (2.0 * (self.q / 2.0));
                let beta = 2.0 * a.sqrt() * alpha;
                b0 = a * ((a + 1.0) + (a - 1.0) * cs + beta);
                b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cs);
                b2 = a * ((a + 1.0) + (a - 1.0) * cs - beta);
                a0 = (a + 1.0) - (a - 1.0) * cs + beta;
                a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cs);
                a2 = (a + 1.0) - (a - 1.0) * cs - beta;
            }
            FilterType::Notch
            | FilterType::LowPassQ
            | FilterType::HighPassQ
            | FilterType::BandPass
            | FilterType::LowPass
            | FilterType::HighPass
            | FilterType::AllPass => {
                // no transfer function yet: unity
                b0 = 1.0;
                b1 = 0.0;
                b2 = 0.0;
                a0 = 1.0;
                a1 = 0.0;
                a2 = 0.0;
            }
        }

        // Normalize coefficients
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;

        // Pre-compute for gain_at_frequency()
        self.r_up0 = (self.b0 + self.b1 + self.b2).powi(2);
        self.r_up1 = -4.0 * (self.b0 * self.b1 + 4.0 * self.b0 * self.b2 + self.b1 * self.b2);
        self.r_up2 = 16.0 * self.b0 * self.b2;
        self.r_dw0 = (1.0 + self.a1 + self.a2).powi(2);
        self.r_dw1 = -4.0 * (self.a1 + 4.0 * self.a2 + self.a1 * self.a2);
        self.r_dw2 = 16.0 * self.a2;
    }

    /// Gain in dB of the filter at frequency `f`.
    pub fn gain_at_frequency(&self, f: f64) -> f64 {
        let phi = (PI * f / self.srate).sin().powi(2);
        let phi2 = phi * phi;

        let numerator = self.r_up0 + self.r_up1 * phi + self.r_up2 * phi2;
        let denominator = self.r_dw0 + self.r_dw1 * phi + self.r_dw2 * phi2;

        10.0 * (numerator / denominator).max(MIN_MAGNITUDE_SQUARED).log10()
    }

    /// Vectorized [`Biquad::gain_at_frequency`] over a frequency grid.
    pub fn response_db(&self, freq: &Array1<f64>) -> Array1<f64> {
        let coeff = PI / self.srate;
        let phi = freq.mapv(|f| (f * coeff).sin().powi(2));
        let phi2 = &phi * &phi;

        let r_up = self.r_up0 + self.r_up1 * &phi + self.r_up2 * &phi2;
        let r_dw = self.r_dw0 + self.r_dw1 * &phi + self.r_dw2 * &phi2;
        let r = r_up / r_dw;

        r.mapv(|val| 10.0 * val.max(MIN_MAGNITUDE_SQUARED).log10())
    }

    /// Returns the normalized coefficients as `(b0, b1, b2, a1, a2)`.
    pub fn constants(&self) -> (f64, f64, f64, f64, f64) {
        (self.b0, self.b1, self.b2, self.a1, self.a2)
    }
}

impl fmt::Display for Biquad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type:{},Freq:{:.1},Rate:{:.1},Q:{:.3},Gain:{:.2}",
            self.filter_type.short_name(),
            self.freq,
            self.srate,
            self.q,
            self.db_gain
        )
    }
}
