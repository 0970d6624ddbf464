//! Bounded-concurrency fan-out over an [`ItemSource`].
//!
//! [`BoundedFetcher::fetch_many`] dispatches one task per id, gated by a
//! semaphore owned by the fetcher instance, and streams back one
//! [`FetchOutcome`] per id in completion order.
//!
//! # Cancellation
//!
//! The dispatcher checks the [`Context`] before every dispatch. Once the
//! context is done, every id not yet dispatched is reported with the
//! context's error (`Cancelled` or `DeadlineExceeded`) and no call is made
//! for it. Calls already in flight are left to finish or hit their own
//! request timeout; if nobody is listening any more their outcome is
//! discarded.
//!
//! # Ordering
//!
//! Nothing about dispatch or completion order is guaranteed. Callers restore
//! order themselves (see [`CachedItemRepository`](crate::CachedItemRepository)).

use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use futures_util::Stream;
use tokio::sync::{Semaphore, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::context::Context;
use crate::providers::ItemSource;
use crate::telemetry;
use crate::types::{Item, ItemId};
use crate::{HuginnError, Result};

/// Default number of concurrent outbound calls per fetcher.
pub const DEFAULT_MAX_CONCURRENT: usize = 32;

/// Configuration for [`BoundedFetcher`].
///
/// ```rust
/// # use huginn::FetcherConfig;
/// let config = FetcherConfig::new().max_concurrent(8);
/// assert_eq!(config.max_concurrent, 8);
/// ```
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Maximum in-flight upstream calls. Default: 32. Values below 1 are
    /// treated as 1.
    pub max_concurrent: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl FetcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of in-flight upstream calls.
    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }
}

/// Result of resolving a single id.
#[derive(Debug)]
pub struct FetchOutcome {
    pub id: ItemId,
    pub result: Result<Item>,
}

/// Stream of per-id outcomes, in completion order.
pub type FetchStream = Pin<Box<dyn Stream<Item = FetchOutcome> + Send>>;

/// Resolves batches of ids against an [`ItemSource`] with at most
/// `max_concurrent` calls in flight.
///
/// Cloning shares the limiter: clones together never exceed the limit.
#[derive(Clone)]
pub struct BoundedFetcher {
    source: Arc<dyn ItemSource>,
    limiter: Arc<Semaphore>,
    max_concurrent: usize,
}

impl BoundedFetcher {
    pub fn new(source: Arc<dyn ItemSource>, config: &FetcherConfig) -> Self {
        let max_concurrent = config.max_concurrent.max(1);
        Self {
            source,
            limiter: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Capacity of the limiter.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Slots currently free.
    pub fn available_permits(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Resolve `ids`, one upstream call per id.
    ///
    /// The returned stream yields exactly one outcome per id unless it is
    /// dropped early. Must be called within a tokio runtime.
    pub fn fetch_many(&self, ctx: &Context, ids: Vec<ItemId>) -> FetchStream {
        // Room for every outcome: senders never wait on a slow reader.
        let (tx, rx) = mpsc::channel(ids.len().max(1));

        tokio::spawn(dispatch(
            ctx.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.limiter),
            ids,
            tx,
        ));

        Box::pin(ReceiverStream::new(rx))
    }
}

async fn dispatch(
    ctx: Context,
    source: Arc<dyn ItemSource>,
    limiter: Arc<Semaphore>,
    ids: Vec<ItemId>,
    tx: mpsc::Sender<FetchOutcome>,
) {
    let mut pending = ids.into_iter();
    while let Some(id) = pending.next() {
        let permit = tokio::select! {
            biased;
            _ = ctx.done() => None,
            permit = Arc::clone(&limiter).acquire_owned() => permit.ok(),
        };

        let Some(permit) = permit.filter(|_| !ctx.is_done()) else {
            let remaining: Vec<ItemId> = std::iter::once(id).chain(pending).collect();
            short_circuit(&ctx, remaining, &tx).await;
            return;
        };

        if tx.is_closed() {
            debug!("fetch receiver dropped, stopping dispatch");
            return;
        }

        let source = Arc::clone(&source);
        let tx = tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let result = {
                let _permit = permit;
                source.fetch_item(id).await
            };
            metrics::histogram!(telemetry::FETCH_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());
            let status = if result.is_ok() { "ok" } else { "error" };
            metrics::counter!(telemetry::FETCHES_TOTAL, "status" => status).increment(1);
            if tx.send(FetchOutcome { id, result }).await.is_err() {
                debug!(id, "fetch outcome discarded, receiver dropped");
            }
        });
    }
}

/// Report the context error for every id that will not be dispatched.
async fn short_circuit(ctx: &Context, ids: Vec<ItemId>, tx: &mpsc::Sender<FetchOutcome>) {
    metrics::counter!(telemetry::FETCHES_TOTAL, "status" => "cancelled")
        .increment(ids.len() as u64);
    let reason = ctx.err().unwrap_or(HuginnError::Cancelled);
    debug!(skipped = ids.len(), error = %reason, "context done, skipping remaining fetches");

    for id in ids {
        let err = ctx.err().unwrap_or(HuginnError::Cancelled);
        if tx.send(FetchOutcome { id, result: Err(err) }).await.is_err() {
            return;
        }
    }
}
