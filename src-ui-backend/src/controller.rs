// ----------------------------------------------------------------------
// Equalizer controller
// ----------------------------------------------------------------------
//
// Owns the local copy of the band list. Every mutation is clamped, written
// to the store first and applied locally only once the write succeeded, so a
// failing store never leaves the view ahead of the equalizer.

use std::collections::HashSet;

use aqua_env::{EqualizerConfig, FieldSpec};
use aqua_iir::{
    CurvePoint, EqualizerState, FilterId, FilterSpec, FilterType, SampledCurve, compute_avg_freq,
    compute_markers,
};

use crate::curve_view::CurveCache;
use crate::store::{ParamKey, StoreError, ValueStore};

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("filter index {index} out of range ({len} filters)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot hold more than {0} filters")]
    TooManyFilters(usize),

    #[error("at least {0} filters must remain")]
    TooFewFilters(usize),
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Which band field a scalar edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BandField {
    Frequency,
    Gain,
    Quality,
}

/// Counter value of an id handed out by [`EqualizerController::add_filter`].
fn generated_suffix(id: &FilterId) -> Option<u64> {
    id.as_str().strip_prefix("filter-")?.parse().ok()
}

pub struct EqualizerController<S> {
    store: S,
    config: EqualizerConfig,
    state: EqualizerState,
    next_id: u64,
    retired: HashSet<FilterId>,
    curve: CurveCache,
}

impl<S: ValueStore> EqualizerController<S> {
    /// Controller with an empty band list; call [`EqualizerController::load`] to sync.
    pub fn new(store: S, config: EqualizerConfig) -> Self {
        let curve = CurveCache::new(&config);
        Self {
            store,
            config,
            state: EqualizerState::default(),
            next_id: 1,
            retired: HashSet::new(),
            curve,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EqualizerConfig {
        &self.config
    }

    /// Band list as last applied, sorted by frequency.
    pub fn state(&self) -> &EqualizerState {
        &self.state
    }

    pub fn filters(&self) -> &[FilterSpec] {
        &self.state.filters
    }

    pub fn preamp(&self) -> f64 {
        self.state.preamp
    }

    /// Replace the local state with the store's.
    pub async fn load(&mut self) -> ControllerResult<()> {
        let mut state = self.store.fetch_state().await.inspect_err(|e| {
            log::warn!("failed to load equalizer state: {}", e);
        })?;
        state.sort_by_frequency();
        log::info!(
            "loaded {} filters, preamp {} dB",
            state.filters.len(),
            state.preamp
        );
        if let Some(highest) = state.filters.iter().filter_map(|f| generated_suffix(&f.id)).max() {
            self.next_id = self.next_id.max(highest + 1);
        }
        self.state = state;
        self.curve.invalidate();
        Ok(())
    }

    fn check_index(&self, index: usize) -> ControllerResult<()> {
        let len = self.state.filters.len();
        if index < len {
            Ok(())
        } else {
            Err(ControllerError::IndexOutOfRange { index, len })
        }
    }

    async fn write(&self, key: &ParamKey, value: f64) -> ControllerResult<()> {
        self.store.set_value(key, value).await.inspect_err(|e| {
            log::warn!("write {} = {} failed: {}", key, value, e);
        })?;
        log::debug!("wrote {} = {}", key, value);
        Ok(())
    }

    async fn set_band_field(&mut self, index: usize, field: BandField, value: f64) -> ControllerResult<f64> {
        self.check_index(index)?;
        let id = self.state.filters[index].id.clone();
        let (key, spec): (ParamKey, FieldSpec) = match field {
            BandField::Frequency => (ParamKey::Frequency(id), self.config.frequency),
            BandField::Gain => (ParamKey::Gain(id), self.config.gain),
            BandField::Quality => (ParamKey::Quality(id), self.config.quality),
        };
        let value = spec.clamp(value);
        self.write(&key, value).await?;

        let filter = &mut self.state.filters[index];
        match field {
            BandField::Frequency => filter.frequency = value,
            BandField::Gain => filter.gain = value,
            BandField::Quality => filter.quality = value,
        }
        if field == BandField::Frequency {
            self.state.sort_by_frequency();
        }
        Ok(value)
    }

    /// Move band `index`; the list is re-sorted so the band may change position.
    pub async fn set_frequency(&mut self, index: usize, value: f64) -> ControllerResult<f64> {
        self.set_band_field(index, BandField::Frequency, value).await
    }

    pub async fn set_gain(&mut self, index: usize, value: f64) -> ControllerResult<f64> {
        self.set_band_field(index, BandField::Gain, value).await
    }

    pub async fn set_quality(&mut self, index: usize, value: f64) -> ControllerResult<f64> {
        self.set_band_field(index, BandField::Quality, value).await
    }

    pub async fn set_type(&mut self, index: usize, filter_type: FilterType) -> ControllerResult<()> {
        self.check_index(index)?;
        let id = self.state.filters[index].id.clone();
        self.store
            .set_filter_type(&id, filter_type)
            .await
            .inspect_err(|e| log::warn!("set type of {} failed: {}", id, e))?;
        self.state.filters[index].filter_type = filter_type;
        log::debug!("filter {} is now {}", id, filter_type);
        Ok(())
    }

    pub async fn set_preamp(&mut self, value: f64) -> ControllerResult<f64> {
        let value = self.config.preamp.clamp(value);
        self.write(&ParamKey::Preamp, value).await?;
        self.state.preamp = value;
        Ok(value)
    }

    fn fresh_id(&mut self) -> FilterId {
        loop {
            let id = FilterId(format!("filter-{}", self.next_id));
            self.next_id += 1;
            if self.state.find(&id).is_none() && !self.retired.contains(&id) {
                return id;
            }
        }
    }

    /// Insert a flat peak band between the neighbours at `insert_index`.
    ///
    /// Indices past the end append. Returns the id of the new band.
    pub async fn add_filter(&mut self, insert_index: usize) -> ControllerResult<FilterId> {
        let max = self.config.filters.max_count;
        if self.state.filters.len() >= max {
            return Err(ControllerError::TooManyFilters(max));
        }
        let index = insert_index.min(self.state.filters.len());
        let frequency = compute_avg_freq(&self.state.filters, index, &self.config);
        let quality = self.config.quality.clamp(self.config.filters.default_quality);
        let filter = FilterSpec::new(self.fresh_id(), FilterType::Peak, frequency, 0.0, quality);

        self.store
            .insert_filter(index, &filter)
            .await
            .inspect_err(|e| log::warn!("insert of {} failed: {}", filter.id, e))?;
        log::debug!("inserted {} at {} ({} Hz)", filter.id, index, frequency);

        let id = filter.id.clone();
        self.state.filters.insert(index, filter);
        self.state.sort_by_frequency();
        Ok(id)
    }

    pub async fn remove_filter(&mut self, index: usize) -> ControllerResult<FilterSpec> {
        self.check_index(index)?;
        let min = self.config.filters.min_count;
        if self.state.filters.len() <= min {
            return Err(ControllerError::TooFewFilters(min));
        }
        let id = self.state.filters[index].id.clone();
        self.store
            .remove_filter(&id)
            .await
            .inspect_err(|e| log::warn!("removal of {} failed: {}", id, e))?;
        log::debug!("removed {}", id);
        self.retired.insert(id);
        Ok(self.state.filters.remove(index))
    }

    /// Aggregate response of the current bands, re-sampling only what changed.
    pub fn curve(&mut self) -> &SampledCurve {
        self.curve.update(&self.state)
    }

    /// Aggregate gain at each band's own frequency.
    pub fn markers(&self) -> Vec<CurvePoint> {
        compute_markers(&self.state.filters, self.state.preamp, &self.config)
    }
}
