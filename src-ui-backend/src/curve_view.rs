// ----------------------------------------------------------------------
// Curve view
// ----------------------------------------------------------------------
//
// Keeps the sampled response of each band between edits so that moving one
// band only re-evaluates that band, and maps the aggregate curve to pixels.

use std::collections::HashMap;
use std::fmt::Write as _;

use aqua_env::{EqualizerConfig, clamp};
use aqua_iir::{Biquad, CurvePoint, EqualizerState, FilterId, FilterSpec, SampledCurve, sample_frequencies};
use ndarray::Array1;

#[derive(Debug, Clone)]
struct CachedResponse {
    spec: FilterSpec,
    response: Array1<f64>,
}

/// Per-band responses on the graph sweep plus their sum.
#[derive(Debug, Clone)]
pub struct CurveCache {
    sample_rate: f64,
    freqs: Array1<f64>,
    entries: Vec<CachedResponse>,
    preamp: f64,
    curve: SampledCurve,
    valid: bool,
    resampled: usize,
}

impl CurveCache {
    pub fn new(config: &EqualizerConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            freqs: sample_frequencies(&config.graph),
            entries: Vec::new(),
            preamp: 0.0,
            curve: SampledCurve::default(),
            valid: false,
            resampled: 0,
        }
    }

    /// Bring the cache in line with `state` and return the aggregate curve.
    ///
    /// Only bands whose transfer function changed are re-evaluated; the sum
    /// is rebuilt in band order whenever anything changed.
    pub fn update(&mut self, state: &EqualizerState) -> &SampledCurve {
        let reordered = self.entries.len() != state.filters.len()
            || self
                .entries
                .iter()
                .zip(state.filters.iter())
                .any(|(entry, spec)| entry.spec.id != spec.id);
        let mut changed = !self.valid || reordered || self.preamp != state.preamp;

        let mut previous: HashMap<FilterId, CachedResponse> = self
            .entries
            .drain(..)
            .map(|entry| (entry.spec.id.clone(), entry))
            .collect();

        let mut entries = Vec::with_capacity(state.filters.len());
        for spec in &state.filters {
            match previous.remove(&spec.id) {
                Some(entry) if entry.spec.same_response(spec) => entries.push(entry),
                _ => {
                    changed = true;
                    self.resampled += 1;
                    let response = Biquad::from_spec(spec, self.sample_rate).response_db(&self.freqs);
                    entries.push(CachedResponse {
                        spec: spec.clone(),
                        response,
                    });
                }
            }
        }

        if changed {
            let mut gains = Array1::from_elem(self.freqs.len(), state.preamp);
            for entry in &entries {
                gains += &entry.response;
            }
            self.curve = SampledCurve::from_arrays(&self.freqs, &gains);
            log::trace!("curve rebuilt from {} bands", entries.len());
        }

        self.entries = entries;
        self.preamp = state.preamp;
        self.valid = true;
        &self.curve
    }

    /// Curve as of the last [`CurveCache::update`].
    pub fn curve(&self) -> &SampledCurve {
        &self.curve
    }

    /// Drop every cached response; the next update re-evaluates all bands.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.valid = false;
    }

    /// Number of single-band evaluations performed so far.
    pub fn resample_count(&self) -> usize {
        self.resampled
    }
}

/// Pixel area of the response plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub min_db: f64,
    pub max_db: f64,
    pub min_freq: f64,
    pub max_freq: f64,
}

impl Viewport {
    /// Full graph sweep horizontally, the gain bounds vertically.
    pub fn new(width: f64, height: f64, config: &EqualizerConfig) -> Self {
        Self {
            width,
            height,
            min_db: config.gain.min,
            max_db: config.gain.max,
            min_freq: config.graph.start,
            max_freq: config.graph.end,
        }
    }

    pub fn x_for(&self, frequency: f64) -> f64 {
        let log_min = self.min_freq.log10();
        let log_max = self.max_freq.log10();
        let log_freq = clamp(frequency, self.min_freq, self.max_freq).log10();
        (log_freq - log_min) / (log_max - log_min) * self.width
    }

    /// Inverse of [`Viewport::x_for`], for pointer positions.
    pub fn frequency_at(&self, x: f64) -> f64 {
        let log_min = self.min_freq.log10();
        let log_max = self.max_freq.log10();
        let pos = clamp(x / self.width, 0.0, 1.0);
        10.0_f64.powf(log_min + pos * (log_max - log_min))
    }

    /// Top of the viewport is `max_db`; gains outside the range stick to the edge.
    pub fn y_for(&self, gain: f64) -> f64 {
        let gain = clamp(gain, self.min_db, self.max_db);
        (self.max_db - gain) / (self.max_db - self.min_db) * self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

pub fn to_path(points: &[CurvePoint], viewport: &Viewport) -> Vec<PathPoint> {
    points
        .iter()
        .map(|p| PathPoint {
            x: viewport.x_for(p.frequency),
            y: viewport.y_for(p.gain),
        })
        .collect()
}

/// SVG path data (`M x,y L x,y ...`) with two decimals.
pub fn svg_path(points: &[PathPoint]) -> String {
    let mut path = String::with_capacity(points.len() * 16);
    for (i, p) in points.iter().enumerate() {
        let command = if i == 0 { 'M' } else { 'L' };
        if i > 0 {
            path.push(' ');
        }
        let _ = write!(path, "{}{:.2},{:.2}", command, p.x, p.y);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqua_iir::{FilterType, compute_curve};

    fn state() -> EqualizerState {
        EqualizerState::new(
            vec![
                FilterSpec::new("1", FilterType::LowShelf, 120.0, 3.0, 0.7),
                FilterSpec::new("2", FilterType::Peak, 900.0, -4.0, 2.0),
                FilterSpec::new("3", FilterType::HighShelf, 9_000.0, 1.5, 0.7),
            ],
            -1.0,
        )
    }

    #[test]
    fn test_cache_matches_direct_computation() {
        let config = EqualizerConfig::default();
        let state = state();
        let mut cache = CurveCache::new(&config);
        let expected = compute_curve(&state.filters, state.preamp, &config);
        assert_eq!(cache.update(&state), &expected);
        assert_eq!(cache.resample_count(), 3);
    }

    #[test]
    fn test_only_changed_bands_are_resampled() {
        let config = EqualizerConfig::default();
        let mut state = state();
        let mut cache = CurveCache::new(&config);
        cache.update(&state);

        cache.update(&state);
        assert_eq!(cache.resample_count(), 3);

        state.filters[1].gain = 2.0;
        let curve = cache.update(&state).clone();
        assert_eq!(cache.resample_count(), 4);
        assert_eq!(curve, compute_curve(&state.filters, state.preamp, &config));

        // a pre-amp change re-sums without touching the bands
        state.preamp = 0.5;
        let curve = cache.update(&state).clone();
        assert_eq!(cache.resample_count(), 4);
        assert_eq!(curve, compute_curve(&state.filters, state.preamp, &config));
    }

    #[test]
    fn test_removed_band_leaves_the_sum() {
        let config = EqualizerConfig::default();
        let mut state = state();
        let mut cache = CurveCache::new(&config);
        cache.update(&state);

        state.filters.remove(0);
        let curve = cache.update(&state).clone();
        assert_eq!(cache.resample_count(), 3);
        assert_eq!(curve, compute_curve(&state.filters, state.preamp, &config));
    }

    #[test]
    fn test_invalidate_resamples_everything() {
        let config = EqualizerConfig::default();
        let state = state();
        let mut cache = CurveCache::new(&config);
        cache.update(&state);
        cache.invalidate();
        cache.update(&state);
        assert_eq!(cache.resample_count(), 6);
    }

    #[test]
    fn test_empty_state_is_flat_preamp() {
        let config = EqualizerConfig::default();
        let mut cache = CurveCache::new(&config);
        let curve = cache.update(&EqualizerState::new(Vec::new(), 2.5));
        assert_eq!(curve.len(), config.graph.num_steps + 1);
        assert!(curve.points.iter().all(|p| p.gain == 2.5));
    }

    #[test]
    fn test_viewport_mapping() {
        let config = EqualizerConfig::default();
        let viewport = Viewport::new(600.0, 300.0, &config);
        assert_eq!(viewport.x_for(10.0), 0.0);
        assert!((viewport.x_for(20_000.0) - 600.0).abs() < 1e-9);
        assert_eq!(viewport.x_for(1.0), 0.0);
        assert_eq!(viewport.y_for(30.0), 0.0);
        assert_eq!(viewport.y_for(0.0), 150.0);
        assert_eq!(viewport.y_for(-45.0), 300.0);

        let f = viewport.frequency_at(viewport.x_for(1_000.0));
        assert!((f - 1_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_svg_path() {
        let points = [
            PathPoint { x: 0.0, y: 150.0 },
            PathPoint { x: 10.5, y: 149.126 },
            PathPoint { x: 20.0, y: 0.0 },
        ];
        assert_eq!(svg_path(&points), "M0.00,150.00 L10.50,149.13 L20.00,0.00");
        assert_eq!(svg_path(&[]), "");
    }

    #[test]
    fn test_to_path_follows_curve() {
        let config = EqualizerConfig::default();
        let viewport = Viewport::new(500.0, 200.0, &config);
        let curve = compute_curve(&[], -15.0, &config);
        let path = to_path(&curve.points, &viewport);
        assert_eq!(path.len(), curve.len());
        assert!(path.windows(2).all(|w| w[0].x < w[1].x));
        assert!(path.iter().all(|p| p.y == 150.0));
    }
}
