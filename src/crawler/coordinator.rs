//! Crawl coordinator - runs conditional fetches across the full URL set
//!
//! This module contains the run loop that ties the other components together:
//! - Deriving validators for each URL from the metadata store
//! - Running fetches under a bounded concurrency limit
//! - Persisting fresh content and recording new metadata
//! - Flushing the metadata store exactly once after every fetch has settled

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_url};
use crate::crawler::outcome::{FailureReason, FetchOutcome, UrlOutcome};
use crate::state::{DocumentRecord, Validators};
use crate::storage::{verify_content, ContentWriter, MetadataStore};
use crate::transform::TextSink;
use crate::{parse_seed_url, IngestError};
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Orchestrates one or more fetch runs
///
/// A coordinator holds no process-wide state; several can run side by side
/// against different output directories.
pub struct Coordinator {
    client: Client,
    writer: ContentWriter,
    metadata_path: PathBuf,
    max_concurrent_fetches: usize,
    text_sink: Option<TextSink>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The ingestor configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(IngestError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, IngestError> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;

        let text_sink = config
            .transform
            .enabled
            .then(|| TextSink::with_default_transform(config.transform.text_dir.clone()));

        Ok(Self {
            client,
            writer: ContentWriter::new(config.crawler.output_dir.clone()),
            metadata_path: config.crawler.metadata_path.clone(),
            max_concurrent_fetches: config.crawler.max_concurrent_fetches.max(1) as usize,
            text_sink,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the text sink used for freshly fetched documents
    pub fn with_text_sink(mut self, sink: TextSink) -> Self {
        self.text_sink = Some(sink);
        self
    }

    /// Token that stops the run when cancelled
    ///
    /// After cancellation no new fetches start, in-flight fetches resolve as
    /// [`FailureReason::Cancelled`], and the metadata is still flushed.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the fetch loop over `seed_urls`
    ///
    /// The URL source is consumed lazily, so it may be a streaming producer.
    /// Once the run is cancelled, every further URL is reported as cancelled
    /// without being fetched; a streaming producer should stop yielding when
    /// [`Self::cancellation_token`] fires.
    ///
    /// Duplicate URLs are fetched once and the same result is reported at
    /// every position they occur. Results are returned in input order.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<UrlOutcome>)` - One entry per consumed input URL
    /// * `Err(IngestError)` - The metadata flush failed
    pub async fn run<I, S>(
        &self,
        seed_urls: I,
        store: &mut MetadataStore,
    ) -> Result<Vec<UrlOutcome>, IngestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        tracing::info!(
            "Starting run with up to {} concurrent fetches ({} known records)",
            self.max_concurrent_fetches,
            store.len()
        );
        let start_time = std::time::Instant::now();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_fetches));
        let mut tasks: JoinSet<UrlOutcome> = JoinSet::new();
        let mut order: Vec<String> = Vec::new();
        let mut settled: HashMap<String, Result<DocumentRecord, FailureReason>> = HashMap::new();
        let mut in_flight: HashSet<String> = HashSet::new();

        for url in seed_urls {
            let url: String = url.into();
            order.push(url.clone());

            if settled.contains_key(&url) || in_flight.contains(&url) {
                tracing::debug!("Duplicate URL {} collapsed into one fetch", url);
                continue;
            }

            while let Some(joined) = tasks.try_join_next() {
                settle(joined, store, &mut settled, &mut in_flight);
            }

            if self.cancel.is_cancelled() {
                tracing::debug!("Run cancelled, not fetching {}", url);
                settled.insert(url, Err(FailureReason::Cancelled));
                continue;
            }

            if let Err(e) = parse_seed_url(&url) {
                tracing::warn!("Skipping invalid URL {}: {}", url, e);
                settled.insert(url, Err(FailureReason::InvalidUrl(e.to_string())));
                continue;
            }

            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => Some(
                    permit.map_err(|_| IngestError::Task("fetch semaphore closed".to_string()))?,
                ),
            };
            let Some(permit) = permit else {
                tracing::info!("Run cancelled while waiting to fetch {}", url);
                settled.insert(url, Err(FailureReason::Cancelled));
                continue;
            };

            let job = FetchJob {
                prior: store.get(&url).cloned(),
                url: url.clone(),
                client: self.client.clone(),
                writer: self.writer.clone(),
                text_sink: self.text_sink.clone(),
                cancel: self.cancel.clone(),
            };
            in_flight.insert(url);
            tasks.spawn(async move {
                // Permit is dropped when the fetch completes
                let _permit = permit;
                job.run().await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            settle(joined, store, &mut settled, &mut in_flight);
        }

        abort_unsettled(&mut in_flight, &mut settled);

        store.flush(&self.metadata_path).await?;

        let results: Vec<UrlOutcome> = order
            .into_iter()
            .map(|url| {
                let result = settled.get(&url).cloned().unwrap_or_else(|| {
                    Err(FailureReason::TaskAborted("no result recorded".to_string()))
                });
                UrlOutcome { url, result }
            })
            .collect();

        let fetched = settled
            .values()
            .filter(|r| matches!(r, Ok(rec) if rec.status.is_fetched()))
            .count();
        let skipped = settled
            .values()
            .filter(|r| matches!(r, Ok(rec) if rec.status.is_skipped()))
            .count();
        let failed = settled.values().filter(|r| r.is_err()).count();
        tracing::info!(
            "Run completed in {:?}: {} fetched, {} skipped, {} failed",
            start_time.elapsed(),
            fetched,
            skipped,
            failed
        );

        Ok(results)
    }
}

/// Records one finished fetch; the only place the store is mutated
fn settle(
    joined: Result<UrlOutcome, JoinError>,
    store: &mut MetadataStore,
    settled: &mut HashMap<String, Result<DocumentRecord, FailureReason>>,
    in_flight: &mut HashSet<String>,
) {
    let outcome = match joined {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Fetch task failed: {}", e);
            return;
        }
    };

    in_flight.remove(&outcome.url);
    match &outcome.result {
        Ok(record) if record.status.is_fetched() => {
            store.put(record.clone());
        }
        Ok(_) => {}
        Err(FailureReason::WriteFailed(message)) => {
            tracing::error!("Content for {} was lost: {}", outcome.url, message);
        }
        Err(reason) => {
            tracing::warn!("Fetch failed for {}: {}", outcome.url, reason);
        }
    }
    settled.insert(outcome.url, outcome.result);
}

/// Reports every spawned fetch that never produced an outcome as aborted
fn abort_unsettled(
    in_flight: &mut HashSet<String>,
    settled: &mut HashMap<String, Result<DocumentRecord, FailureReason>>,
) {
    for url in in_flight.drain() {
        tracing::error!("Fetch task for {} ended without a result", url);
        settled.insert(
            url,
            Err(FailureReason::TaskAborted(
                "fetch task ended without a result".to_string(),
            )),
        );
    }
}

/// Everything one fetch needs, passed explicitly to the task
struct FetchJob {
    url: String,
    prior: Option<DocumentRecord>,
    client: Client,
    writer: ContentWriter,
    text_sink: Option<TextSink>,
    cancel: CancellationToken,
}

impl FetchJob {
    async fn run(self) -> UrlOutcome {
        let result = self.resolve().await;
        UrlOutcome {
            url: self.url,
            result,
        }
    }

    async fn resolve(&self) -> Result<DocumentRecord, FailureReason> {
        let validators = self
            .prior
            .as_ref()
            .map(|prior| prior.validators.clone())
            .unwrap_or_default();
        if !validators.is_empty() {
            tracing::debug!("Conditional GET for {} with {:?}", self.url, validators);
        }

        match self.fetch(&validators).await {
            FetchOutcome::Fresh { bytes, validators } => self.store_fresh(bytes, validators).await,
            FetchOutcome::NotModified => self.reuse_prior().await,
            FetchOutcome::Failed(reason) => Err(reason),
        }
    }

    /// Handles a 304: reuse the prior record if the filesystem still backs it
    async fn reuse_prior(&self) -> Result<DocumentRecord, FailureReason> {
        let Some(prior) = &self.prior else {
            tracing::warn!(
                "{} answered 304 Not Modified but there is no prior record",
                self.url
            );
            return Err(FailureReason::UnexpectedNotModified);
        };

        let integrity = verify_content(prior).await;
        if integrity.is_intact() {
            tracing::info!("{} not modified, keeping {}", self.url, prior.storage_path.display());
            return Ok(prior.to_skipped());
        }

        tracing::warn!(
            "Stored copy of {} does not match its record ({:?}), fetching unconditionally",
            self.url,
            integrity
        );
        match self.fetch(&Validators::default()).await {
            FetchOutcome::Fresh { bytes, validators } => self.store_fresh(bytes, validators).await,
            FetchOutcome::NotModified => Err(FailureReason::UnexpectedNotModified),
            FetchOutcome::Failed(reason) => Err(reason),
        }
    }

    async fn store_fresh(
        &self,
        bytes: Vec<u8>,
        validators: Validators,
    ) -> Result<DocumentRecord, FailureReason> {
        let stored = self
            .writer
            .write(&self.url, &bytes)
            .await
            .map_err(|e| FailureReason::WriteFailed(e.to_string()))?;

        tracing::info!("Fetched {} ({} bytes)", self.url, stored.len);
        let record = DocumentRecord::fetched(
            self.url.clone(),
            stored.storage_path,
            stored.content_hash,
            validators,
        );

        if let Some(sink) = &self.text_sink {
            if let Err(e) = sink.process(&record, bytes).await {
                tracing::warn!("Text extraction failed for {}: {}", self.url, e);
            }
        }

        Ok(record)
    }

    /// Races the network call against run cancellation
    async fn fetch(&self, validators: &Validators) -> FetchOutcome {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => FetchOutcome::Failed(FailureReason::Cancelled),
            outcome = fetch_url(&self.client, &self.url, validators) => outcome,
        }
    }
}

/// Runs a complete fetch operation from configuration
///
/// Loads the metadata store, fetches every configured seed, and flushes the
/// store.
///
/// # Example
///
/// ```no_run
/// use document_ingestor::config::load_config;
/// use document_ingestor::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("ingest.toml"))?;
/// let results = run_crawl(&config).await?;
/// println!("{} URLs processed", results.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<Vec<UrlOutcome>, IngestError> {
    let mut store = MetadataStore::load(&config.crawler.metadata_path).await?;
    let coordinator = Coordinator::new(config)?;
    coordinator
        .run(config.crawler.seed_urls.iter().cloned(), &mut store)
        .await
}
