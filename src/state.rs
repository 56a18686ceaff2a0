use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::punch::PunchClock;
use crate::engine::revenue::{RevenueLedger, DEFAULT_THRESHOLD};
use crate::engine::safety::duty_hours;
use crate::engine::scoring::Uno;
use crate::error::AppError;
use crate::models::decision::Decision;
use crate::models::expense::{Expense, MileageEntry};
use crate::models::job::{Job, JobStatus};
use crate::models::preferences::AutomationPreferences;
use crate::models::safety::{DutyHours, SafetySettings};
use crate::notify::BroadcastNotifier;
use crate::observability::metrics::Metrics;
use crate::storage::{
    load_json, KeyValueStore, MemoryStore, PREFERENCES_KEY, SAFETY_SETTINGS_KEY,
};

pub struct AppState {
    pub jobs: DashMap<Uuid, Job>,
    /// Latest engine decision per job.
    pub decisions: DashMap<Uuid, Decision>,
    pub expenses: DashMap<Uuid, Expense>,
    pub mileage: DashMap<Uuid, MileageEntry>,
    pub uno: RwLock<Uno>,
    pub ledger: Mutex<RevenueLedger>,
    pub punch: Mutex<PunchClock>,
    pub safety: RwLock<SafetySettings>,
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: BroadcastNotifier,
    pub job_tx: mpsc::Sender<Job>,
    pub metrics: Metrics,
    /// Delay between consecutive automated decisions.
    pub batch_pacing: Duration,
}

/// Driver data read back from the store at startup.
#[derive(Default)]
struct Restored {
    preferences: AutomationPreferences,
    punch: PunchClock,
    safety: SafetySettings,
}

impl AppState {
    /// Builds state over `store`, restoring persisted preferences and punch
    /// sessions.
    pub fn new(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<(Self, mpsc::Receiver<Job>), AppError> {
        let preferences: AutomationPreferences =
            load_json(store.as_ref(), PREFERENCES_KEY)?.unwrap_or_default();
        let punch = PunchClock::load(store.as_ref())?;
        let safety: SafetySettings =
            load_json(store.as_ref(), SAFETY_SETTINGS_KEY)?.unwrap_or_default();

        let restored = Restored {
            preferences,
            punch,
            safety,
        };

        Ok(Self::build(
            config.job_queue_size,
            config.event_buffer_size,
            config.revenue_threshold,
            config.batch_pacing,
            store,
            restored,
        ))
    }

    /// Fresh state over an empty in-memory store with the default revenue
    /// threshold and no pacing delay.
    pub fn in_memory(
        job_queue_size: usize,
        event_buffer_size: usize,
    ) -> (Self, mpsc::Receiver<Job>) {
        Self::build(
            job_queue_size,
            event_buffer_size,
            DEFAULT_THRESHOLD,
            Duration::ZERO,
            Arc::new(MemoryStore::new()),
            Restored::default(),
        )
    }

    fn build(
        job_queue_size: usize,
        event_buffer_size: usize,
        revenue_threshold: f64,
        batch_pacing: Duration,
        store: Arc<dyn KeyValueStore>,
        restored: Restored,
    ) -> (Self, mpsc::Receiver<Job>) {
        let (job_tx, job_rx) = mpsc::channel(job_queue_size);

        (
            Self {
                jobs: DashMap::new(),
                decisions: DashMap::new(),
                expenses: DashMap::new(),
                mileage: DashMap::new(),
                uno: RwLock::new(Uno::new(restored.preferences)),
                ledger: Mutex::new(RevenueLedger::new(revenue_threshold, Utc::now())),
                punch: Mutex::new(restored.punch),
                safety: RwLock::new(restored.safety),
                store,
                notifier: BroadcastNotifier::new(event_buffer_size),
                job_tx,
                metrics: Metrics::new(),
                batch_pacing,
            },
            job_rx,
        )
    }

    /// Today's worked hours from punch sessions and completed trips.
    pub async fn duty_hours(&self, now: DateTime<Utc>) -> DutyHours {
        let completed: Vec<Job> = self
            .jobs
            .iter()
            .filter(|entry| entry.value().status == JobStatus::Completed)
            .map(|entry| entry.value().clone())
            .collect();
        let clock = self.punch.lock().await;
        duty_hours(&clock, &completed, now)
    }
}
