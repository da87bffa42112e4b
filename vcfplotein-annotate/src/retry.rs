use std::thread::sleep;
use std::time::Duration;

use log::warn;

use crate::config::RetryPolicy;
use crate::consts::MAX_BACKOFF_MS;
use crate::errors::Result;

///
/// Run `operation` until it succeeds or the policy's attempts are used up,
/// sleeping with exponential backoff in between. The wait never exceeds
/// [MAX_BACKOFF_MS]. The error of the last attempt is returned.
///
/// # Arguments
/// - policy: attempt limit and initial backoff
/// - label: what is being attempted, for log messages
/// - operation: the request; must be safe to replay
pub fn with_retry<T, F>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 1;
    let mut backoff = policy.initial_backoff.min(max_backoff());

    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                warn!(
                    "{label} failed (attempt {attempt}/{}): {e}; retrying in {:?}",
                    policy.max_attempts, backoff
                );
                sleep(backoff);
                backoff = next_backoff(backoff);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn max_backoff() -> Duration {
    Duration::from_millis(MAX_BACKOFF_MS)
}

fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2).min(max_backoff())
}
