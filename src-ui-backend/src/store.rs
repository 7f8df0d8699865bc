// ----------------------------------------------------------------------
// Value store
// ----------------------------------------------------------------------
//
// The external equalizer the controls write into. Every mutation is a single
// awaited call; failures come back typed and are never retried here.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use aqua_iir::{EqualizerState, FilterId, FilterSpec, FilterType};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Address of one scalar parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "param", content = "id", rename_all = "camelCase")]
pub enum ParamKey {
    Preamp,
    Frequency(FilterId),
    Gain(FilterId),
    Quality(FilterId),
}

impl ParamKey {
    pub fn filter_id(&self) -> Option<&FilterId> {
        match self {
            ParamKey::Preamp => None,
            ParamKey::Frequency(id) | ParamKey::Gain(id) | ParamKey::Quality(id) => Some(id),
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Preamp => write!(f, "preamp"),
            ParamKey::Frequency(id) => write!(f, "frequency[{}]", id),
            ParamKey::Gain(id) => write!(f, "gain[{}]", id),
            ParamKey::Quality(id) => write!(f, "quality[{}]", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("equalizer unavailable: {0}")]
    Unavailable(String),

    #[error("unknown filter: {0}")]
    UnknownFilter(FilterId),

    #[error("{key} rejected: {reason}")]
    Rejected { key: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Asynchronous access to the equalizer parameters.
#[allow(async_fn_in_trait)]
pub trait ValueStore {
    async fn fetch_state(&self) -> StoreResult<EqualizerState>;

    async fn get_value(&self, key: &ParamKey) -> StoreResult<f64>;

    async fn set_value(&self, key: &ParamKey, value: f64) -> StoreResult<()>;

    async fn set_filter_type(&self, id: &FilterId, filter_type: FilterType) -> StoreResult<()>;

    async fn insert_filter(&self, index: usize, filter: &FilterSpec) -> StoreResult<()>;

    async fn remove_filter(&self, id: &FilterId) -> StoreResult<()>;
}

/// One mutation received by a [`MemoryStore`], in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    Value(ParamKey, f64),
    FilterType(FilterId, FilterType),
    Insert(usize, FilterId),
    Remove(FilterId),
}

/// In-process store, used headless and in tests.
///
/// Keeps the filters in insertion order; sorting is the controller's job.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<EqualizerState>,
    writes: Mutex<Vec<StoreWrite>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new(state: EqualizerState) -> Self {
        Self {
            state: Mutex::new(state),
            writes: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// While offline every call fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> EqualizerState {
        self.state.lock().await.clone()
    }

    pub async fn writes(&self) -> Vec<StoreWrite> {
        self.writes.lock().await.clone()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    async fn record(&self, write: StoreWrite) {
        self.writes.lock().await.push(write);
    }
}

fn filter_mut<'a>(state: &'a mut EqualizerState, id: &FilterId) -> StoreResult<&'a mut FilterSpec> {
    state
        .find_mut(id)
        .ok_or_else(|| StoreError::UnknownFilter(id.clone()))
}

impl ValueStore for MemoryStore {
    async fn fetch_state(&self) -> StoreResult<EqualizerState> {
        self.check_online()?;
        Ok(self.snapshot().await)
    }

    async fn get_value(&self, key: &ParamKey) -> StoreResult<f64> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        match key {
            ParamKey::Preamp => Ok(state.preamp),
            ParamKey::Frequency(id) => filter_mut(&mut state, id).map(|f| f.frequency),
            ParamKey::Gain(id) => filter_mut(&mut state, id).map(|f| f.gain),
            ParamKey::Quality(id) => filter_mut(&mut state, id).map(|f| f.quality),
        }
    }

    async fn set_value(&self, key: &ParamKey, value: f64) -> StoreResult<()> {
        self.check_online()?;
        if !value.is_finite() {
            return Err(StoreError::Rejected {
                key: key.to_string(),
                reason: format!("{} is not a finite number", value),
            });
        }
        {
            let mut state = self.state.lock().await;
            match key {
                ParamKey::Preamp => state.preamp = value,
                ParamKey::Frequency(id) => filter_mut(&mut state, id)?.frequency = value,
                ParamKey::Gain(id) => filter_mut(&mut state, id)?.gain = value,
                ParamKey::Quality(id) => filter_mut(&mut state, id)?.quality = value,
            }
        }
        self.record(StoreWrite::Value(key.clone(), value)).await;
        Ok(())
    }

    async fn set_filter_type(&self, id: &FilterId, filter_type: FilterType) -> StoreResult<()> {
        self.check_online()?;
        filter_mut(&mut *self.state.lock().await, id)?.filter_type = filter_type;
        self.record(StoreWrite::FilterType(id.clone(), filter_type)).await;
        Ok(())
    }

    async fn insert_filter(&self, index: usize, filter: &FilterSpec) -> StoreResult<()> {
        self.check_online()?;
        {
            let mut state = self.state.lock().await;
            if state.find(&filter.id).is_some() {
                return Err(StoreError::Rejected {
                    key: filter.id.to_string(),
                    reason: "duplicate filter id".to_string(),
                });
            }
            let index = index.min(state.filters.len());
            state.filters.insert(index, filter.clone());
        }
        self.record(StoreWrite::Insert(index, filter.id.clone())).await;
        Ok(())
    }

    async fn remove_filter(&self, id: &FilterId) -> StoreResult<()> {
        self.check_online()?;
        {
            let mut state = self.state.lock().await;
            let index = state
                .position(id)
                .ok_or_else(|| StoreError::UnknownFilter(id.clone()))?;
            state.filters.remove(index);
        }
        self.record(StoreWrite::Remove(id.clone())).await;
        Ok(())
    }
}
