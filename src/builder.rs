use std::sync::Arc;

use anyhow::Result;

use sm_app::{CaptureMood, FlowOrchestrator};
use sm_core::config::FlowConfig;
use sm_core::ports::{
    AccountLookupPort, FlowSignalPort, MoodEntryPort, ProgressStorePort, ResultSyncPort,
};
use sm_core::quiz::{ScoringEngine, WeightedScoring};
use sm_infra::{app_dirs, AccountApiConfig, FileMoodStore, FileProgressStore, HttpAccountClient};

/// The assembled application core.
pub struct Stillmind {
    pub flow: Arc<FlowOrchestrator>,
    pub mood: CaptureMood,
}

/// Assembles the flow orchestrator and mood capture from injected parts.
///
/// Every port can be overridden (tests inject in-memory fakes); missing
/// ports fail `build`, except the scoring engine and config which default
/// to [`WeightedScoring`] and [`FlowConfig::default`].
pub struct AppBuilder {
    config: Option<FlowConfig>,
    store: Option<Arc<dyn ProgressStorePort>>,
    engine: Option<Arc<dyn ScoringEngine>>,
    accounts: Option<Arc<dyn AccountLookupPort>>,
    result_sync: Option<Arc<dyn ResultSyncPort>>,
    signals: Option<Arc<dyn FlowSignalPort>>,
    mood_store: Option<Arc<dyn MoodEntryPort>>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            engine: None,
            accounts: None,
            result_sync: None,
            signals: None,
            mood_store: None,
        }
    }

    /// Wire the default production adapters: file repositories under the
    /// platform data directory and the HTTP account client.
    pub fn with_default_adapters(self, api: AccountApiConfig) -> Result<Self> {
        let client = Arc::new(HttpAccountClient::new(api)?);
        Ok(self
            .set_store(Arc::new(FileProgressStore::new(app_dirs::flow_dir()?)))
            .set_mood_store(Arc::new(FileMoodStore::new(app_dirs::mood_dir()?)))
            .set_accounts(client.clone())
            .set_result_sync(client))
    }

    pub fn set_config(mut self, config: FlowConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn set_store(mut self, store: Arc<dyn ProgressStorePort>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn set_engine(mut self, engine: Arc<dyn ScoringEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn set_accounts(mut self, accounts: Arc<dyn AccountLookupPort>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    pub fn set_result_sync(mut self, result_sync: Arc<dyn ResultSyncPort>) -> Self {
        self.result_sync = Some(result_sync);
        self
    }

    pub fn set_signals(mut self, signals: Arc<dyn FlowSignalPort>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn set_mood_store(mut self, mood_store: Arc<dyn MoodEntryPort>) -> Self {
        self.mood_store = Some(mood_store);
        self
    }

    pub fn build(self) -> Result<Stillmind> {
        let store = self
            .store
            .ok_or_else(|| anyhow::anyhow!("No progress store set"))?;
        let accounts = self
            .accounts
            .ok_or_else(|| anyhow::anyhow!("No account lookup set"))?;
        let result_sync = self
            .result_sync
            .ok_or_else(|| anyhow::anyhow!("No result sync set"))?;
        let signals = self
            .signals
            .ok_or_else(|| anyhow::anyhow!("No signal port set"))?;
        let mood_store = self
            .mood_store
            .ok_or_else(|| anyhow::anyhow!("No mood store set"))?;

        let config = self.config.unwrap_or_default();
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(WeightedScoring));

        let flow = Arc::new(FlowOrchestrator::new(
            config,
            store,
            engine,
            accounts,
            result_sync,
            signals,
        ));
        let mood = CaptureMood::new(mood_store);

        Ok(Stillmind { flow, mood })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
