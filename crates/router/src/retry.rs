use {model::Error, std::time::Duration};

/// Retries a fallible bridge `send` with exponential backoff, up to `cap`
/// attempts total, then surfaces the last error (§4.4 "BridgeFailure").
pub async fn with_backoff<F, Fut, T>(cap: u32, base_delay: Duration, mut attempt: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, Error>>,
{
    let mut last_err = None;
    for n in 0..cap.max(1) {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::warn!(attempt = n + 1, cap, error = %err, "bridge send attempt failed");
                last_err = Some(err);
                if n + 1 < cap {
                    tokio::time::sleep(base_delay * 2u32.pow(n)).await;
                }
            }
        }
    }
    Err(last_err.unwrap_or(Error::BridgeFailure("no attempts made".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn stops_retrying_once_an_attempt_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_backoff(5, Duration::from_millis(1), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(Error::BridgeFailure("transient".to_string()))
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_last_error_after_cap_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), Error> = with_backoff(3, Duration::from_millis(1), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::BridgeFailure("permanent".to_string()))
        })
        .await;
        assert!(matches!(result.unwrap_err(), Error::BridgeFailure(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
