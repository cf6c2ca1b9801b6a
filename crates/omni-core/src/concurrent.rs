//! Bounded-fan-out parallel map.
//!
//! Every item gets its own tokio task, but at most `limit` of them run their
//! body at once. Results come back in input order, one slot per item, so
//! duplicate items are fine and a failing item never hides another's result.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::TaskError;

/// Run `f` over `items` with at most `limit` bodies in flight.
///
/// `f` receives the item's index alongside the item. A task that panics or is
/// cancelled fills its own slot with [`TaskError::Failed`]; the remaining
/// slots are unaffected. A `limit` of zero is treated as one.
///
/// Must be called from within a tokio runtime.
pub async fn map_concurrent<I, R, F, Fut>(
    items: Vec<I>,
    limit: usize,
    f: F,
) -> Vec<Result<R, TaskError>>
where
    I: Send + 'static,
    R: Send + 'static,
    F: Fn(usize, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let limit = limit.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));
    let f = Arc::new(f);

    debug!(items = items.len(), limit, "map_concurrent: spawning tasks");

    let handles: Vec<_> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let semaphore = Arc::clone(&semaphore);
            let f = Arc::clone(&f);
            tokio::spawn(async move {
                // The semaphore is never closed, so a missing permit cannot happen.
                let _permit = semaphore.acquire_owned().await.ok();
                f(index, item).await
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(value) => results.push(Ok(value)),
            Err(e) => {
                warn!(index, error = %e, "map_concurrent: task failed");
                results.push(Err(TaskError::Failed {
                    index,
                    reason: e.to_string(),
                }));
            }
        }
    }
    results
}
