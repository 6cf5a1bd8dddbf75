//! Crawl controller - the retry state machine
//!
//! The controller walks the target queue one film at a time:
//! - Acquire a circuit
//! - Fetch and parse the current film under that circuit
//! - Persist a titled record right away and move on under the same circuit
//! - On a timeout, connection error or untitled (blocked) page, drop the
//!   circuit and retry the same film under a fresh one
//!
//! A film is never passed over because of a failure unless an attempt cap is
//! configured; by default it is retried until it succeeds or the process is
//! stopped.

use crate::circuit::{Circuit, CircuitProvider, TorCircuitManager};
use crate::config::{Config, RetryConfig};
use crate::crawler::queue::{build_queue, load_targets, Dataset, TargetQueue};
use crate::extract::parse_record;
use crate::record::MovieRecord;
use crate::storage::{open_storage, RunStatus, Storage};
use crate::ReelError;
use std::path::Path;
use std::time::{Duration, Instant};

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Fetch attempts, successful or not
    pub attempts: u64,

    /// Circuits acquired, including the first one
    pub circuits_acquired: u64,

    /// Circuits abandoned after a failure
    pub rotations: u64,

    /// Timeouts and connection failures
    pub transient_failures: u64,

    /// Pages that came back without a title
    pub soft_bans: u64,

    /// Records written to the dataset
    pub persisted: u64,

    /// Films given up on after hitting the attempt cap
    pub skipped: u64,
}

/// Controller states
enum CrawlState {
    AcquireCircuit,
    FetchAndParse(Box<dyn Circuit>),
    Persist(Box<dyn Circuit>, MovieRecord),
    Done,
}

/// Main controller structure
pub struct Controller<P: CircuitProvider> {
    provider: P,
    storage: Box<dyn Storage>,
    queue: TargetQueue,
    retry: RetryConfig,
    config_hash: String,
    stats: CrawlStats,
}

impl<P: CircuitProvider> Controller<P> {
    /// Creates a controller over an opened dataset
    ///
    /// Loads the dataset, drops untitled and duplicate rows (rewriting the
    /// dataset if any were found) and builds the queue of films still to
    /// fetch.
    ///
    /// # Arguments
    ///
    /// * `provider` - Source of circuits
    /// * `storage` - The dataset to resume from and append to
    /// * `candidates` - All film identifiers, in crawl order
    /// * `retry` - Attempt cap and rotation delay
    pub fn new(
        provider: P,
        mut storage: Box<dyn Storage>,
        candidates: &[String],
        retry: RetryConfig,
    ) -> Result<Self, ReelError> {
        let rows = storage.load_records()?;
        let row_count = rows.len();
        let dataset = Dataset::from_rows(rows);

        if dataset.len() != row_count {
            tracing::info!(
                "Pruning {} untitled or duplicate rows from the dataset",
                row_count - dataset.len()
            );
            storage.rewrite(dataset.records())?;
        }

        let queue = TargetQueue::new(build_queue(candidates, &dataset));
        tracing::info!(
            "{} films already scraped, {} of {} candidates left",
            dataset.len(),
            queue.len(),
            candidates.len()
        );

        Ok(Self {
            provider,
            storage,
            queue,
            retry,
            config_hash: String::new(),
            stats: CrawlStats::default(),
        })
    }

    /// Sets the configuration hash recorded with the run
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    /// The target queue
    pub fn queue(&self) -> &TargetQueue {
        &self.queue
    }

    /// Counters so far
    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Runs until the queue is exhausted
    ///
    /// Returns `Err` only for failures that cannot be fixed by rotating the
    /// circuit: dataset I/O errors and circuit setup errors.
    pub async fn run(&mut self) -> Result<CrawlStats, ReelError> {
        let run_id = self.storage.begin_run(&self.config_hash)?;

        let result = self.drive().await;

        if let Some(run_id) = run_id {
            let status = if result.is_ok() {
                RunStatus::Completed
            } else {
                RunStatus::Failed
            };
            if let Err(e) = self.storage.finish_run(run_id, status) {
                tracing::error!("Failed to record end of run {}: {}", run_id, e);
            }
        }

        result.map(|()| self.stats.clone())
    }

    async fn drive(&mut self) -> Result<(), ReelError> {
        let start_time = Instant::now();
        let mut failed_attempts: u32 = 0;

        let mut state = if self.queue.current().is_some() {
            CrawlState::AcquireCircuit
        } else {
            CrawlState::Done
        };

        loop {
            state = match state {
                CrawlState::AcquireCircuit => {
                    let circuit = self.provider.acquire().await?;
                    self.stats.circuits_acquired += 1;
                    tracing::info!(circuit = circuit.id(), "Using new circuit");
                    CrawlState::FetchAndParse(circuit)
                }

                CrawlState::FetchAndParse(circuit) => {
                    let Some(target) = self.queue.current().map(str::to_string) else {
                        break;
                    };
                    self.stats.attempts += 1;

                    match circuit.fetch(&target).await {
                        Ok(body) => {
                            let record = parse_record(&body, &target);
                            if record.is_titled() {
                                CrawlState::Persist(circuit, record)
                            } else {
                                self.stats.soft_bans += 1;
                                tracing::warn!(
                                    circuit = circuit.id(),
                                    "No title for film {}, circuit looks banned",
                                    target
                                );
                                drop(circuit);
                                failed_attempts += 1;
                                self.after_failure(&target, &mut failed_attempts).await
                            }
                        }
                        Err(e) => {
                            self.stats.transient_failures += 1;
                            tracing::warn!(circuit = circuit.id(), "{}", e);
                            drop(circuit);
                            failed_attempts += 1;
                            self.after_failure(&target, &mut failed_attempts).await
                        }
                    }
                }

                CrawlState::Persist(circuit, record) => {
                    self.storage.append_record(&record)?;
                    self.stats.persisted += 1;
                    failed_attempts = 0;
                    tracing::info!(
                        circuit = circuit.id(),
                        "Saved film {}: {}",
                        record.id,
                        record.title_ru.as_deref().unwrap_or_default()
                    );

                    if self.stats.persisted % 10 == 0 {
                        let rate = self.stats.persisted as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} saved, {} left, {:.2} films/sec",
                            self.stats.persisted,
                            self.queue.remaining() - 1,
                            rate
                        );
                    }

                    if self.queue.advance().is_some() {
                        CrawlState::FetchAndParse(circuit)
                    } else {
                        CrawlState::Done
                    }
                }

                CrawlState::Done => break,
            };
        }

        tracing::info!(
            "All targets done: {} saved, {} skipped, {} circuits in {:?}",
            self.stats.persisted,
            self.stats.skipped,
            self.stats.circuits_acquired,
            start_time.elapsed()
        );

        Ok(())
    }

    /// Decides where to go after a failed attempt on `target`
    ///
    /// The circuit has already been dropped. Normally the same film is
    /// retried under a new circuit; with an attempt cap the film may be
    /// skipped instead.
    async fn after_failure(&mut self, target: &str, failed_attempts: &mut u32) -> CrawlState {
        if let Some(limit) = self.retry.attempt_limit() {
            if *failed_attempts >= limit {
                tracing::warn!(
                    "Skipping film {} after {} failed attempts",
                    target,
                    failed_attempts
                );
                self.stats.skipped += 1;
                *failed_attempts = 0;
                if self.queue.advance().is_none() {
                    return CrawlState::Done;
                }
            }
        }

        self.stats.rotations += 1;
        if self.retry.rotation_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.retry.rotation_delay_ms)).await;
        }
        CrawlState::AcquireCircuit
    }
}

/// Runs a complete crawl from configuration
///
/// Loads the target list, opens the dataset and the Tor circuit manager,
/// and drives the controller until every film is scraped.
///
/// # Example
///
/// ```no_run
/// use reelmine::config::load_config_with_hash;
/// use reelmine::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("reelmine.toml"))?;
/// let stats = run_crawl(config, &hash).await?;
/// println!("Saved {} films", stats.persisted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: &str) -> Result<CrawlStats, ReelError> {
    let candidates = load_targets(Path::new(&config.target.ids_path))?;
    let storage = open_storage(&config.output)?;
    let provider = TorCircuitManager::from_config(&config)?;

    let mut controller = Controller::new(provider, storage, &candidates, config.retry.clone())?
        .with_config_hash(config_hash);
    controller.run().await
}
