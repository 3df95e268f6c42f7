use std::future::Future;

use tokio::time::sleep;

use crate::config::RetryPolicy;

/// Run `f` until it succeeds, fails with a non-retryable error, or the policy gives up.
///
/// Only safe for operations whose repetition after a lost acknowledgement
/// is harmless, e.g. reads and guarded ledger writes.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &'static str,
    mut f: F,
) -> crate::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::Result<T>>,
{
    let mut retry = 0;
    loop {
        match f().await {
            Err(err) if err.is_retryable() && retry < policy.max_retries => {
                let backoff = policy.backoff(retry);
                retry += 1;
                tracing::warn!(%err, what, retry, ?backoff, "store error, retrying");
                sleep(backoff).await;
            }
            res => return res,
        }
    }
}
