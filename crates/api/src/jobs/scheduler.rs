//! Background job scheduling.
//!
//! Each registered job gets its own tokio task ticking at the job's
//! frequency. A shared watch channel signals shutdown; tasks finish the
//! in-flight pass before exiting.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How often a job runs.
#[derive(Debug, Clone, Copy)]
pub enum JobFrequency {
    /// Every N seconds, for tests.
    Seconds(u64),
    /// Every N minutes.
    Minutes(u64),
    Hourly,
    Daily,
}

impl JobFrequency {
    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs(*secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(*mins * 60),
            JobFrequency::Hourly => Duration::from_secs(3600),
            JobFrequency::Daily => Duration::from_secs(86400),
        }
    }
}

/// A recurring background task.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn frequency(&self) -> JobFrequency;

    /// Runs one pass. The error message is logged, not propagated.
    async fn execute(&self) -> Result<(), String>;
}

/// Owns the job tasks and the shutdown channel.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Spawns one task per registered job.
    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");

        for job in &self.jobs {
            let handle = tokio::spawn(run_job(Arc::clone(job), self.shutdown_rx.clone()));
            self.handles.push(handle);
        }
    }

    /// Signals shutdown without waiting.
    pub fn shutdown(&self) {
        info!("Stopping job scheduler");
        let _ = self.shutdown_tx.send(true);
    }

    /// Waits for all job tasks to exit, up to `timeout`.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let drain = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Job task panicked");
                }
            }
        };

        match tokio::time::timeout(timeout, drain).await {
            Ok(()) => info!("All jobs stopped"),
            Err(_) => warn!(timeout = ?timeout, "Job shutdown timed out"),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_job(job: Arc<dyn Job>, mut shutdown_rx: watch::Receiver<bool>) {
    let name = job.name();
    let mut interval = tokio::time::interval(job.frequency().duration());

    // The first tick fires immediately; skip it so startup stays quiet.
    interval.tick().await;

    info!(job = name, frequency = ?job.frequency(), "Job scheduled");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let start = std::time::Instant::now();
                match job.execute().await {
                    Ok(()) => info!(
                        job = name,
                        elapsed_ms = start.elapsed().as_millis(),
                        "Job pass completed"
                    ),
                    Err(e) => error!(
                        job = name,
                        elapsed_ms = start.elapsed().as_millis(),
                        error = %e,
                        "Job pass failed"
                    ),
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!(job = name, "Job stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn frequency(&self) -> JobFrequency {
            JobFrequency::Seconds(1)
        }

        async fn execute(&self) -> Result<(), String> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_frequency_durations() {
        assert_eq!(JobFrequency::Seconds(30).duration(), Duration::from_secs(30));
        assert_eq!(JobFrequency::Minutes(5).duration(), Duration::from_secs(300));
        assert_eq!(JobFrequency::Hourly.duration(), Duration::from_secs(3600));
        assert_eq!(JobFrequency::Daily.duration(), Duration::from_secs(86400));
    }

    #[test]
    fn test_register() {
        let mut scheduler = JobScheduler::new();
        assert!(scheduler.jobs.is_empty());
        scheduler.register(CountingJob {
            runs: Arc::new(AtomicUsize::new(0)),
        });
        assert_eq!(scheduler.jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_before_first_tick() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.register(CountingJob {
            runs: Arc::clone(&runs),
        });
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        // First tick is skipped, so nothing ran yet.
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
