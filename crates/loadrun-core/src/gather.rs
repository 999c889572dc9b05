// Ordered concurrent gathering
//
// Runs a list of independent fetch operations concurrently inside the
// caller's task and reassembles their outputs by input position.
//
// Invariants:
// - output[i] is the output of ops[i], whatever the completion order
// - the error returned is the one of the lowest-index failing operation
// - when ops[k] fails, every operation after k is cancelled; operations
//   before k keep running since one of them may fail with a lower index
// - nothing outlives the call: when it returns, every operation has either
//   completed or been dropped

use futures::future::{AbortHandle, Abortable, BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use crate::error::Result;

/// A boxed, independently runnable fetch operation
pub type Fetch<'a, T> = BoxFuture<'a, Result<T>>;

/// Run `ops` concurrently, returning their outputs in input order.
pub async fn gather_ordered<T>(ops: Vec<Fetch<'_, T>>) -> Result<Vec<T>> {
    let total = ops.len();
    let mut handles = Vec::with_capacity(total);
    let mut pending = FuturesUnordered::new();

    for (slot, op) in ops.into_iter().enumerate() {
        let (handle, registration) = AbortHandle::new_pair();
        handles.push(handle);
        pending.push(Abortable::new(op, registration).map(move |outcome| (slot, outcome)));
    }

    let mut outcomes: Vec<Option<Result<T>>> = (0..total).map(|_| None).collect();
    let mut first_failed: Option<usize> = None;
    let mut cancelled = 0usize;

    while let Some((slot, outcome)) = pending.next().await {
        let Ok(outcome) = outcome else {
            cancelled += 1;
            continue;
        };

        if outcome.is_err() && first_failed.map_or(true, |failed| slot < failed) {
            for handle in &handles[slot + 1..] {
                handle.abort();
            }
            first_failed = Some(slot);
        }
        outcomes[slot] = Some(outcome);
    }

    if let Some(slot) = first_failed {
        debug!(slot, total, cancelled, "gather aborted by failed fetch");
    }

    // Cancelled slots hold no outcome; they only exist after a failure,
    // which the in-order scan reaches first.
    outcomes.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SummaryError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    fn after<'a, T: Send + 'a>(millis: u64, outcome: Result<T>) -> Fetch<'a, T> {
        async move {
            sleep(Duration::from_millis(millis)).await;
            outcome
        }
        .boxed()
    }

    /// Sets its flag when dropped, i.e. when the owning future is cancelled or done
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_outputs_follow_input_order() {
        let ops = vec![
            after(30, Ok("first")),
            after(10, Ok("second")),
            after(20, Ok("third")),
        ];

        let values = gather_ordered(ops).await.unwrap();
        assert_eq!(values, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let values: Vec<u32> = gather_ordered(Vec::new()).await.unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lowest_index_failure_wins() {
        let ops = vec![
            after(20, Err::<u32, _>(SummaryError::remote("slot 0"))),
            after(5, Err(SummaryError::remote("slot 1"))),
        ];

        let err = gather_ordered(ops).await.unwrap_err();
        assert!(matches!(err, SummaryError::RemoteFetch(msg) if msg == "slot 0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_slots_are_awaited_after_failure() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();
        let slow_success = async move {
            sleep(Duration::from_millis(50)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, SummaryError>(1)
        }
        .boxed();

        let ops = vec![slow_success, after(10, Err(SummaryError::remote("boom")))];

        let err = gather_ordered(ops).await.unwrap_err();
        assert!(matches!(err, SummaryError::RemoteFetch(msg) if msg == "boom"));
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_slots_are_cancelled_before_return() {
        let dropped = Arc::new(AtomicBool::new(false));
        let completed = Arc::new(AtomicBool::new(false));

        let flag = DropFlag(dropped.clone());
        let done = completed.clone();
        let never_needed = async move {
            let _flag = flag;
            sleep(Duration::from_secs(3600)).await;
            done.store(true, Ordering::SeqCst);
            Ok::<u32, SummaryError>(2)
        }
        .boxed();

        let ops = vec![
            after(5, Ok(0u32)),
            after(10, Err(SummaryError::remote("failed"))),
            never_needed,
        ];

        let started = tokio::time::Instant::now();
        let result = gather_ordered(ops).await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(dropped.load(Ordering::SeqCst), "pending fetch must be dropped");
        assert!(!completed.load(Ordering::SeqCst));
    }
}
