//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::DbChatError;

/// Run `future`, failing with [`DbChatError::Timeout`] once `duration` elapses.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, DbChatError>>,
) -> Result<T, DbChatError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(DbChatError::Timeout(duration.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_future_times_out() {
        let result: Result<(), DbChatError> = with_timeout(Duration::from_secs(30), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(DbChatError::Timeout(30_000))));
    }

    #[tokio::test]
    async fn inner_error_is_passed_through() {
        let result: Result<(), DbChatError> = with_timeout(Duration::from_secs(1), async {
            Err(DbChatError::Connectivity("refused".into()))
        })
        .await;

        assert!(matches!(result, Err(DbChatError::Connectivity(_))));
    }
}
