use crate::timeline::Post;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::builder::ItemBuilder;
use super::item::FeedItem;
use super::unit::{expand_units, WorkUnit};

/// Errors that abort a whole dispatch.
///
/// Individual fetch failures never show up here; they degrade the one item.
/// Everything except the two concurrency variants means the collector could
/// not account for every launched unit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("invalid concurrency limit {0}, must be at least 1")]
    InvalidConcurrency(usize),

    #[error("invalid concurrency limit {requested}, must be at most {max}")]
    ConcurrencyTooHigh { requested: usize, max: usize },

    #[error("report channel closed after {received} of {expected} results")]
    ChannelClosed { expected: usize, received: usize },

    #[error("position {0} reported more than once")]
    DuplicatePosition(usize),

    #[error("position {position} out of range for {expected} work units")]
    PositionOutOfRange { position: usize, expected: usize },
}

/// Fan-out/fan-in over work units with a bounded number of builds in flight.
///
/// Each call gets its own admission pool, so concurrent dispatches on the
/// same `Dispatcher` never share slots.
pub struct Dispatcher {
    builder: Arc<ItemBuilder>,
    max_concurrency: usize,
    admitted: Arc<AtomicUsize>,
}

impl Dispatcher {
    pub fn new(builder: Arc<ItemBuilder>, max_concurrency: usize) -> Self {
        Self {
            builder,
            max_concurrency,
            admitted: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Units that have been granted a slot, over the dispatcher's lifetime.
    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::Relaxed)
    }

    /// Expands `posts` into work units and dispatches them.
    pub async fn itemize(
        &self,
        posts: Vec<Post>,
        limit: usize,
    ) -> Result<Vec<FeedItem>, DispatchError> {
        self.dispatch(expand_units(posts), limit).await
    }

    /// Builds one item per unit and returns them ordered by position.
    ///
    /// One task is spawned per unit; at most `limit` of them are building at
    /// any moment. Results are placed by `position`, never by completion
    /// order, so the output is identical for every valid `limit`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::InvalidConcurrency`] / [`DispatchError::ConcurrencyTooHigh`]
    ///   if `limit` is outside `1..=max_concurrency` (nothing is launched)
    /// - [`DispatchError::ChannelClosed`] if a task ended without reporting
    /// - [`DispatchError::DuplicatePosition`] / [`DispatchError::PositionOutOfRange`]
    ///   if the units' positions are not `0..units.len()`
    ///
    /// On error the remaining tasks are aborted and no partial result is returned.
    pub async fn dispatch(
        &self,
        units: Vec<WorkUnit>,
        limit: usize,
    ) -> Result<Vec<FeedItem>, DispatchError> {
        self.check_limit(limit)?;

        let expected = units.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        tracing::debug!(units = expected, limit, "Dispatching work units");

        let admission = Arc::new(Semaphore::new(limit));
        // Capacity covers every report, so a finished task never waits on the collector
        let (report_tx, mut report_rx) = mpsc::channel::<(usize, FeedItem)>(expected);
        let mut tasks = JoinSet::new();

        for unit in units {
            let admission = Arc::clone(&admission);
            let builder = Arc::clone(&self.builder);
            let admitted = Arc::clone(&self.admitted);
            let report_tx = report_tx.clone();

            tasks.spawn(async move {
                let permit = match admission.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        tracing::error!(position = unit.position, error = %e, "Admission pool closed");
                        return;
                    }
                };
                admitted.fetch_add(1, Ordering::Relaxed);
                let item = builder.build(&unit).await;
                drop(permit);

                if let Err(e) = report_tx.send((unit.position, item)).await {
                    tracing::debug!(position = unit.position, error = %e, "Collector gone, result dropped");
                }
            });
        }
        // Only the tasks hold senders now; the channel closes once they are all gone
        drop(report_tx);

        let mut slots: Vec<Option<FeedItem>> = vec![None; expected];
        let mut received = 0;
        while received < expected {
            let Some((position, item)) = report_rx.recv().await else {
                reap(&mut tasks).await;
                tracing::error!(expected, received, "Work unit exited without reporting");
                return Err(DispatchError::ChannelClosed { expected, received });
            };

            let slot = slots
                .get_mut(position)
                .ok_or(DispatchError::PositionOutOfRange { position, expected })?;
            if slot.is_some() {
                return Err(DispatchError::DuplicatePosition(position));
            }
            *slot = Some(item);
            received += 1;
        }

        reap(&mut tasks).await;

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(DispatchError::ChannelClosed { expected, received })
    }

    fn check_limit(&self, limit: usize) -> Result<(), DispatchError> {
        if limit == 0 {
            return Err(DispatchError::InvalidConcurrency(limit));
        }
        if limit > self.max_concurrency {
            return Err(DispatchError::ConcurrencyTooHigh {
                requested: limit,
                max: self.max_concurrency,
            });
        }
        Ok(())
    }
}

/// Waits for every task to finish, logging any that panicked.
async fn reap(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                tracing::error!(error = %e, "Work unit task panicked");
            }
        }
    }
}
