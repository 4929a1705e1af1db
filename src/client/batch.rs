use futures::future::join_all;
use std::future::Future;
use tracing::warn;

use super::error::ApiError;

/// One slot per request, in input order
pub type BatchResult<T> = Vec<Result<T, ApiError>>;

/// Drive every request concurrently and collect each outcome in its slot.
///
/// A failing request neither aborts nor delays the others; total latency is
/// bounded by the slowest request.
pub async fn batch<T, Fut, I>(requests: I) -> BatchResult<T>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let results = join_all(requests).await;

    for (index, result) in results.iter().enumerate() {
        if let Err(e) = result {
            warn!(index, error = %e, "Batch request failed");
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::{Instant, sleep};

    async fn after(ms: u64, outcome: Result<u32, ApiError>) -> Result<u32, ApiError> {
        sleep(Duration::from_millis(ms)).await;
        outcome
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_and_independence() {
        let server_error = ApiError::Http {
            status: 500,
            message: "Internal server error".into(),
        };

        let results = batch(vec![
            after(300, Ok(1)),
            after(10, Err(server_error.clone())),
            after(100, Ok(3)),
        ])
        .await;

        assert_eq!(results, vec![Ok(1), Err(server_error), Ok(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_concurrently() {
        let start = Instant::now();
        let results = batch((0..5).map(|i| after(200, Ok(i)))).await;

        assert_eq!(results.len(), 5);
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results: BatchResult<u32> = batch(Vec::<std::future::Ready<Result<u32, ApiError>>>::new()).await;
        assert!(results.is_empty());
    }
}
