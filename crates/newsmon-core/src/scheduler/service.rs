use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Semaphore};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::model::CollectionResult;
use crate::Result;

/// The work a scheduled tick performs.
///
/// The production runner is the collection orchestrator; tests substitute
/// counting or gated stubs.
#[async_trait::async_trait]
pub trait CollectRunner: Send + Sync {
    async fn run_collection(&self) -> Result<CollectionResult>;
}

#[async_trait::async_trait]
impl CollectRunner for crate::collect::Orchestrator {
    async fn run_collection(&self) -> Result<CollectionResult> {
        self.collect_all().await
    }
}

/// Snapshot of the scheduler state for status displays
#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval_minutes: Option<u64>,
    pub next_run: Option<DateTime<Utc>>,
}

struct Job {
    shutdown: watch::Sender<bool>,
    interval_minutes: u64,
    next_run: Arc<Mutex<Option<DateTime<Utc>>>>,
}

/// Drives periodic collection runs.
///
/// Two states: stopped (no timer task) and running (one timer task). At
/// most one collection executes at a time; a tick or manual trigger that
/// arrives while a run is in flight is skipped, never queued. The first
/// scheduled run fires one full interval after start.
pub struct Scheduler {
    runner: Arc<dyn CollectRunner>,
    // Single permit shared by the timer task and run_now
    in_flight: Arc<Semaphore>,
    job: Mutex<Option<Job>>,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn CollectRunner>) -> Self {
        Self {
            runner,
            in_flight: Arc::new(Semaphore::new(1)),
            job: Mutex::new(None),
        }
    }

    /// Start the timer, replacing any previous one
    pub fn start(&self, interval_minutes: u64) {
        if interval_minutes == 0 {
            warn!("Refusing to start scheduler with a zero interval");
            return;
        }

        self.stop();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let next_run = Arc::new(Mutex::new(None));

        tokio::spawn(timer_loop(
            self.runner.clone(),
            self.in_flight.clone(),
            shutdown_rx,
            interval_minutes,
            next_run.clone(),
        ));

        *self.job.lock().unwrap() = Some(Job {
            shutdown: shutdown_tx,
            interval_minutes,
            next_run,
        });

        info!("Scheduler started with {} minute interval", interval_minutes);
    }

    pub fn stop(&self) {
        if let Some(job) = self.job.lock().unwrap().take() {
            let _ = job.shutdown.send(true);
            info!("Scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.job.lock().unwrap().is_some()
    }

    /// Change the interval of a running timer; a no-op when stopped
    pub fn update_interval(&self, interval_minutes: u64) {
        if !self.is_running() {
            warn!("Scheduler is not running, interval not updated");
            return;
        }
        self.start(interval_minutes);
        info!("Scheduler interval updated to {} minutes", interval_minutes);
    }

    pub fn next_run_time(&self) -> Option<DateTime<Utc>> {
        self.job
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|job| *job.next_run.lock().unwrap())
    }

    pub fn status(&self) -> SchedulerStatus {
        let job = self.job.lock().unwrap();
        SchedulerStatus {
            running: job.is_some(),
            interval_minutes: job.as_ref().map(|j| j.interval_minutes),
            next_run: job.as_ref().and_then(|j| *j.next_run.lock().unwrap()),
        }
    }

    /// Trigger a collection immediately, regardless of timer state.
    ///
    /// Returns `None` when another run is already in flight.
    pub async fn run_now(&self) -> Result<Option<CollectionResult>> {
        let Ok(_permit) = self.in_flight.clone().try_acquire_owned() else {
            info!("Collection already in progress, skipping manual run");
            return Ok(None);
        };

        let result = self.runner.run_collection().await?;
        Ok(Some(result))
    }
}

async fn timer_loop(
    runner: Arc<dyn CollectRunner>,
    in_flight: Arc<Semaphore>,
    mut shutdown: watch::Receiver<bool>,
    interval_minutes: u64,
    next_run: Arc<Mutex<Option<DateTime<Utc>>>>,
) {
    let mut timer = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
    // Missed ticks are dropped, not replayed in a burst
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; the first run belongs one interval out
    timer.tick().await;

    loop {
        *next_run.lock().unwrap() =
            Some(Utc::now() + chrono::Duration::minutes(interval_minutes as i64));

        tokio::select! {
            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    break;
                }
            }

            _ = timer.tick() => {
                match in_flight.clone().try_acquire_owned() {
                    Ok(_permit) => {
                        info!("Running scheduled collection");
                        match runner.run_collection().await {
                            Ok(result) => info!(
                                "Scheduled collection completed: {} new articles",
                                result.total_collected
                            ),
                            Err(e) => error!("Scheduled collection failed: {}", e),
                        }
                    }
                    Err(_) => {
                        info!("Previous collection still running, skipping this tick");
                    }
                }
            }
        }
    }
}
