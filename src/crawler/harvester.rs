//! Parallel detail-page harvesting
//!
//! Post identifiers are split into contiguous batches, one tokio task per
//! batch. Workers share nothing but the fetcher, the extractor and the
//! sending half of a channel; a single collector drains the channel into the
//! final outcome. A failing post is logged and recorded, never fatal.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::retry::{fetch_with_retry, RetryPolicy};
use crate::extract::Extractor;
use crate::model::{DateRange, FieldSchema, PostIdentifier, PostRecord};
use crate::ItemError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// A post that could not be harvested
#[derive(Debug)]
pub struct ItemFailure {
    pub url: PostIdentifier,
    pub error: ItemError,
}

/// Everything a harvest produced
///
/// Records arrive in completion order, not feed order.
#[derive(Debug, Default)]
pub struct HarvestOutcome {
    pub records: Vec<PostRecord>,
    pub failures: Vec<ItemFailure>,
    /// Posts extracted fine but published outside the date range
    pub out_of_range: usize,
}

/// What a worker reports for one post
enum BatchEvent {
    Record(PostRecord),
    OutOfRange,
    Failed(ItemFailure),
}

/// Splits `items` into at most `workers` contiguous batches
///
/// Batch sizes differ by at most one and no batch is empty. Concatenating the
/// batches gives back `items`.
pub fn partition<T>(items: &[T], workers: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }

    let batches = workers.clamp(1, items.len());
    let base = items.len() / batches;
    let extra = items.len() % batches;

    let mut result = Vec::with_capacity(batches);
    let mut start = 0;
    for i in 0..batches {
        let len = base + usize::from(i < extra);
        result.push(&items[start..start + len]);
        start += len;
    }
    result
}

/// Fans detail-page extraction out over parallel workers
#[derive(Clone)]
pub struct Harvester {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<Extractor>,
    retry: RetryPolicy,
}

impl Harvester {
    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: Arc<Extractor>, retry: RetryPolicy) -> Self {
        Self {
            fetcher,
            extractor,
            retry,
        }
    }

    /// Harvests every post in `identifiers` and keeps those inside `range`
    ///
    /// Returns once every batch has finished.
    pub async fn harvest(
        &self,
        identifiers: &[PostIdentifier],
        range: DateRange,
        schema: &Arc<FieldSchema>,
        concurrency: usize,
    ) -> HarvestOutcome {
        let batches = partition(identifiers, concurrency);
        tracing::info!(
            "Collecting post data ({} posts, {} concurrent workers)",
            identifiers.len(),
            batches.len()
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();

        for (index, batch) in batches.into_iter().enumerate() {
            let batch = batch.to_vec();
            let worker = self.clone();
            let schema = Arc::clone(schema);
            let tx = tx.clone();
            workers.spawn(async move {
                worker.run_batch(index, batch, range, schema, tx).await;
            });
        }
        drop(tx);

        let mut outcome = HarvestOutcome::default();
        while let Some(event) = rx.recv().await {
            match event {
                BatchEvent::Record(record) => outcome.records.push(record),
                BatchEvent::OutOfRange => outcome.out_of_range += 1,
                BatchEvent::Failed(failure) => outcome.failures.push(failure),
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Harvest worker died: {}", e);
            }
        }

        tracing::info!(
            "Harvested {} posts ({} failed, {} outside {})",
            outcome.records.len(),
            outcome.failures.len(),
            outcome.out_of_range,
            range
        );
        outcome
    }

    async fn run_batch(
        &self,
        index: usize,
        batch: Vec<PostIdentifier>,
        range: DateRange,
        schema: Arc<FieldSchema>,
        tx: mpsc::UnboundedSender<BatchEvent>,
    ) {
        let mut rng = StdRng::from_os_rng();
        tracing::debug!("Worker {} starting on {} posts", index, batch.len());

        for url in batch {
            tracing::debug!("Scraping {}", url);
            let event = match self.harvest_one(&url, &schema, &mut rng).await {
                Ok(record) if range.contains(record.publish_date.date_naive()) => {
                    BatchEvent::Record(record)
                }
                Ok(_) => BatchEvent::OutOfRange,
                Err(error) => {
                    tracing::warn!(
                        url = %url,
                        stage = error.stage(),
                        "Error retrieving post data: {}",
                        error
                    );
                    BatchEvent::Failed(ItemFailure { url, error })
                }
            };

            if tx.send(event).is_err() {
                tracing::warn!("Harvest collector is gone, worker {} stopping", index);
                return;
            }
        }
    }

    async fn harvest_one(
        &self,
        url: &PostIdentifier,
        schema: &Arc<FieldSchema>,
        rng: &mut StdRng,
    ) -> Result<PostRecord, ItemError> {
        let page = fetch_with_retry(self.fetcher.as_ref(), url.as_str(), &self.retry, rng).await?;
        Ok(self.extractor.extract(&page, url.as_str(), schema)?)
    }
}
