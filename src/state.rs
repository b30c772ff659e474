use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::rate_limit::{AdmissionGate, GateConfig};
use crate::store::StockStore;

// app's shared state
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AdmissionGate>, // per-key quota
    pub clock: Arc<dyn Clock>, // time source for quota decisions
    pub store: Arc<StockStore>, // read-only stock data
    pub api_key: Arc<str>, // the accepted key
    pub allowed_origins: Arc<[String]>, // CORS origins, empty = no CORS
}

impl AppState {
    pub fn new(store: StockStore, api_key: impl Into<Arc<str>>, gate: GateConfig) -> Self {
        Self::with_clock(store, api_key, gate, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: StockStore,
        api_key: impl Into<Arc<str>>,
        gate: GateConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gate: Arc::new(AdmissionGate::new(gate)),
            clock,
            store: Arc::new(store),
            api_key: api_key.into(),
            allowed_origins: Arc::from(Vec::new()),
        }
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins.into();
        self
    }
}
