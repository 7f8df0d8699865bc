// End-to-end flows: controls produce commits, the controller writes them to a
// store and the curve follows.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use aqua_backend::{
    ControllerError, EqualizerConfig, EqualizerController, EqualizerState, FilterId, FilterSpec,
    FilterType, InputKey, MemoryStore, NumericInput, ParamKey, RangeInput, StoreError,
    StoreResult, StoreWrite, ValueStore,
};
use aqua_iir::compute_curve;

fn demo_state() -> EqualizerState {
    EqualizerState::new(
        vec![
            FilterSpec::new("a", FilterType::LowShelf, 80.0, 3.0, 0.7),
            FilterSpec::new("b", FilterType::Peak, 2_500.0, -2.0, 1.0),
        ],
        0.0,
    )
}

async fn controller() -> EqualizerController<MemoryStore> {
    let mut controller =
        EqualizerController::new(MemoryStore::new(demo_state()), EqualizerConfig::default());
    controller.load().await.expect("memory store loads");
    controller
}

#[tokio::test]
async fn test_typed_gain_reaches_store_and_curve() {
    let mut controller = controller().await;
    let config = controller.config().clone();
    let mut field = NumericInput::new(config.gain, controller.filters()[1].gain);

    field.edit("");
    for ch in "-6.257".chars() {
        field.handle_key(InputKey::Char(ch));
    }
    let committed = field.handle_key(InputKey::Enter).expect("valid draft commits");
    assert_eq!(committed, -6.26);

    controller.set_gain(1, committed).await.unwrap();
    assert_eq!(
        controller
            .store()
            .get_value(&ParamKey::Gain(FilterId::from("b")))
            .await
            .unwrap(),
        -6.26
    );

    let state = controller.state().clone();
    let expected = compute_curve(&state.filters, state.preamp, &config);
    assert_eq!(controller.curve(), &expected);
}

#[tokio::test]
async fn test_frequency_drag_is_throttled_and_sorted() {
    let mut controller = controller().await;
    let config = controller.config().clone();
    let mut slider = RangeInput::from_config(config.frequency, 80.0, &config.interaction);
    let t0 = Instant::now();

    slider.begin_drag();
    let mut writes = 0;
    for (i, freq) in [200.0, 900.0, 1_800.0, 3_000.0, 4_200.0].into_iter().enumerate() {
        let update = slider.input(freq, t0 + Duration::from_millis(i as u64 * 30));
        if let Some(v) = update.commit {
            let index = controller.state().position(&FilterId::from("a")).unwrap();
            controller.set_frequency(index, v).await.unwrap();
            writes += 1;
        }
    }
    let index = controller.state().position(&FilterId::from("a")).unwrap();
    let last = slider.release().unwrap();
    controller.set_frequency(index, last).await.unwrap();
    writes += 1;

    // leading edge, the 120 ms event, then the release
    assert_eq!(writes, 3);
    let values: Vec<f64> = controller
        .store()
        .writes()
        .await
        .into_iter()
        .filter_map(|w| match w {
            StoreWrite::Value(ParamKey::Frequency(_), v) => Some(v),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec![200.0, 4_200.0, 4_200.0]);

    let order: Vec<&str> = controller.filters().iter().map(|f| f.id.as_str()).collect();
    assert_eq!(order, vec!["b", "a"]);
}

#[tokio::test]
async fn test_band_lifecycle() {
    let mut controller = controller().await;
    let id = controller.add_filter(1).await.unwrap();
    assert_eq!(controller.state().find(&id).unwrap().frequency, 1_290.0);

    let index = controller.state().position(&id).unwrap();
    controller.set_type(index, FilterType::HighShelf).await.unwrap();
    let removed = controller.remove_filter(index).await.unwrap();
    assert_eq!(removed.id, id);
    assert_eq!(removed.filter_type, FilterType::HighShelf);

    let writes = controller.store().writes().await;
    assert_eq!(
        writes,
        vec![
            StoreWrite::Insert(1, id.clone()),
            StoreWrite::FilterType(id.clone(), FilterType::HighShelf),
            StoreWrite::Remove(id),
        ]
    );
}

/// Store that refuses every frequency below a floor, the way a device with a
/// narrower range than the UI would.
struct FloorStore {
    inner: MemoryStore,
    floor: f64,
    refused: RefCell<u32>,
}

impl ValueStore for FloorStore {
    async fn fetch_state(&self) -> StoreResult<EqualizerState> {
        self.inner.fetch_state().await
    }

    async fn get_value(&self, key: &ParamKey) -> StoreResult<f64> {
        self.inner.get_value(key).await
    }

    async fn set_value(&self, key: &ParamKey, value: f64) -> StoreResult<()> {
        if matches!(key, ParamKey::Frequency(_)) && value < self.floor {
            *self.refused.borrow_mut() += 1;
            return Err(StoreError::Rejected {
                key: key.to_string(),
                reason: format!("below {} Hz", self.floor),
            });
        }
        self.inner.set_value(key, value).await
    }

    async fn set_filter_type(&self, id: &FilterId, filter_type: FilterType) -> StoreResult<()> {
        self.inner.set_filter_type(id, filter_type).await
    }

    async fn insert_filter(&self, index: usize, filter: &FilterSpec) -> StoreResult<()> {
        self.inner.insert_filter(index, filter).await
    }

    async fn remove_filter(&self, id: &FilterId) -> StoreResult<()> {
        self.inner.remove_filter(id).await
    }
}

#[tokio::test]
async fn test_rejected_write_is_reported_and_not_applied() {
    let store = FloorStore {
        inner: MemoryStore::new(demo_state()),
        floor: 20.0,
        refused: RefCell::new(0),
    };
    let mut controller = EqualizerController::new(store, EqualizerConfig::default());
    controller.load().await.unwrap();

    let err = controller.set_frequency(0, 12.0).await.unwrap_err();
    assert!(matches!(err, ControllerError::Store(StoreError::Rejected { .. })));
    assert_eq!(*controller.store().refused.borrow(), 1);
    assert_eq!(controller.filters()[0].frequency, 80.0);

    assert_eq!(controller.set_frequency(0, 25.0).await.unwrap(), 25.0);
    assert_eq!(controller.filters()[0].frequency, 25.0);
}
