// ----------------------------------------------------------------------
// Aggregate response sampling
// ----------------------------------------------------------------------

use aqua_env::{EqualizerConfig, GraphConfig, round_to_precision};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{Biquad, FilterSpec};

/// One sampled point of a response curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Frequency in Hz
    pub frequency: f64,
    /// Aggregate gain in dB
    pub gain: f64,
}

/// Aggregate response sampled on the graph sweep, ordered by frequency
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampledCurve {
    pub points: Vec<CurvePoint>,
}

impl SampledCurve {
    pub fn from_arrays(freqs: &Array1<f64>, gains: &Array1<f64>) -> Self {
        let points = freqs
            .iter()
            .zip(gains.iter())
            .map(|(&frequency, &gain)| CurvePoint { frequency, gain })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highest gain on the curve, `None` when empty
    pub fn max_gain(&self) -> Option<f64> {
        self.points.iter().map(|p| p.gain).reduce(f64::max)
    }
}

/// Frequencies of the graph sweep: `num_steps + 1` points,
/// `10^(log10(start) + i * step)` with `step = (log10(end) - log10(start)) / num_steps`.
pub fn sample_frequencies(graph: &GraphConfig) -> Array1<f64> {
    let log_start = graph.start.log10();
    let step = (graph.end.log10() - log_start) / graph.num_steps as f64;
    Array1::from_shape_fn(graph.num_steps + 1, |i| {
        10.0_f64.powf(log_start + i as f64 * step)
    })
}

/// `preamp + sum of every biquad's gain` at each frequency.
pub fn aggregate_response(biquads: &[Biquad], preamp: f64, freqs: &Array1<f64>) -> Array1<f64> {
    let mut response = Array1::from_elem(freqs.len(), preamp);
    for biquad in biquads {
        response += &biquad.response_db(freqs);
    }
    response
}

fn biquads_for(filters: &[FilterSpec], config: &EqualizerConfig) -> Vec<Biquad> {
    filters
        .iter()
        .map(|spec| Biquad::from_spec(spec, config.sample_rate))
        .collect()
}

/// Sample the aggregate response of `filters` plus `preamp` on the graph sweep.
pub fn compute_curve(filters: &[FilterSpec], preamp: f64, config: &EqualizerConfig) -> SampledCurve {
    let freqs = sample_frequencies(&config.graph);
    let gains = aggregate_response(&biquads_for(filters, config), preamp, &freqs);
    SampledCurve::from_arrays(&freqs, &gains)
}

/// Aggregate response at each band's own frequency, in band order.
pub fn compute_markers(filters: &[FilterSpec], preamp: f64, config: &EqualizerConfig) -> Vec<CurvePoint> {
    let freqs: Array1<f64> = filters.iter().map(|f| f.frequency).collect();
    let gains = aggregate_response(&biquads_for(filters, config), preamp, &freqs);
    SampledCurve::from_arrays(&freqs, &gains).points
}

/// Default frequency of a band inserted at `insert_index` in a frequency-sorted list.
///
/// Arithmetic mean of the neighbours, with the configured frequency bounds
/// standing in for the missing neighbour at either end, rounded to 0.1 Hz.
pub fn compute_avg_freq(filters: &[FilterSpec], insert_index: usize, config: &EqualizerConfig) -> f64 {
    let index = insert_index.min(filters.len());
    let lower = match index {
        0 => config.frequency.min,
        i => filters[i - 1].frequency,
    };
    let upper = filters
        .get(index)
        .map_or(config.frequency.max, |f| f.frequency);
    round_to_precision((lower + upper) / 2.0, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterType;

    fn bands() -> Vec<FilterSpec> {
        vec![
            FilterSpec::new("1", FilterType::LowShelf, 105.0, 4.0, 0.7),
            FilterSpec::new("2", FilterType::Peak, 1_000.0, -3.0, 1.41),
            FilterSpec::new("3", FilterType::HighShelf, 8_000.0, 2.5, 0.7),
        ]
    }

    #[test]
    fn test_sample_frequencies_log_spacing() {
        let graph = GraphConfig {
            start: 10.0,
            end: 10_000.0,
            num_steps: 3,
        };
        let freqs = sample_frequencies(&graph);
        assert_eq!(freqs.len(), 4);
        for (got, want) in freqs.iter().zip([10.0, 100.0, 1_000.0, 10_000.0]) {
            assert!((got - want).abs() / want < 1e-12, "{} != {}", got, want);
        }
    }

    #[test]
    fn test_empty_filters_curve_is_preamp() {
        let config = EqualizerConfig::default();
        let curve = compute_curve(&[], -7.25, &config);
        assert_eq!(curve.len(), config.graph.num_steps + 1);
        assert!(curve.points.iter().all(|p| p.gain == -7.25));
    }

    #[test]
    fn test_flat_peak_curve_is_zero() {
        let config = EqualizerConfig::default();
        let filters = vec![FilterSpec::new("1", FilterType::Peak, 500.0, 0.0, 2.0)];
        let curve = compute_curve(&filters, 0.0, &config);
        assert!(curve.points.iter().all(|p| p.gain.abs() < 1e-12));
    }

    #[test]
    fn test_curve_sums_filters_and_preamp() {
        let config = EqualizerConfig::default();
        let filters = bands();
        let curve = compute_curve(&filters, -2.0, &config);
        let biquads = biquads_for(&filters, &config);
        for p in curve.points.iter().step_by(50) {
            let expected = -2.0 + biquads.iter().map(|b| b.gain_at_frequency(p.frequency)).sum::<f64>();
            assert!((p.gain - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unsupported_filter_does_not_change_curve() {
        let config = EqualizerConfig::default();
        let mut filters = bands();
        let reference = compute_curve(&filters, 0.0, &config);
        filters.push(FilterSpec::new("4", FilterType::Notch, 3_000.0, 10.0, 8.0));
        let with_notch = compute_curve(&filters, 0.0, &config);
        assert!(with_notch.points.iter().all(|p| p.gain.is_finite()));
        assert_eq!(reference, with_notch);
    }

    #[test]
    fn test_markers_sit_on_band_frequencies() {
        let config = EqualizerConfig::default();
        let filters = bands();
        let markers = compute_markers(&filters, 1.0, &config);
        assert_eq!(markers.len(), 3);
        for (m, f) in markers.iter().zip(filters.iter()) {
            assert_eq!(m.frequency, f.frequency);
        }
        // the cut band dominates at its own frequency
        assert!(markers[1].gain < 0.0);
    }

    #[test]
    fn test_compute_avg_freq() {
        let config = EqualizerConfig::default();
        let filters = bands();

        assert_eq!(compute_avg_freq(&filters, 0, &config), 57.5);
        assert_eq!(compute_avg_freq(&filters, 1, &config), 552.5);
        assert_eq!(compute_avg_freq(&filters, 2, &config), 4_500.0);
        assert_eq!(compute_avg_freq(&filters, 3, &config), 14_000.0);
        // past-the-end indices insert at the end
        assert_eq!(compute_avg_freq(&filters, 10, &config), 14_000.0);
        assert_eq!(compute_avg_freq(&[], 0, &config), 10_005.0);
    }

    #[test]
    fn test_compute_avg_freq_rounds_to_one_decimal() {
        let config = EqualizerConfig::default();
        let filters = vec![
            FilterSpec::new("1", FilterType::Peak, 100.33, 0.0, 1.0),
            FilterSpec::new("2", FilterType::Peak, 200.0, 0.0, 1.0),
        ];
        assert_eq!(compute_avg_freq(&filters, 1, &config), 150.2);
    }
}
