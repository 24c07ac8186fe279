//! Cancellable retry loops.
//!
//! An attempt reports [`Attempt::Success`], [`Attempt::RetryAfter`] or [`Attempt::Fatal`]; the loop
//! sleeps between attempts and gives up as soon as shutdown is signalled. Dropping the shutdown
//! sender counts as a shutdown signal.

use std::{future::Future, time::Duration};
use tokio::sync::watch;

/// Outcome of one attempt
#[derive(Debug)]
pub enum Attempt<T, E> {
	Success(T),
	/// Transient failure; try again after the delay
	RetryAfter(Duration),
	Fatal(E),
}

/// Why a retry loop stopped without a value
#[derive(Debug)]
pub enum RetryError<E> {
	Cancelled,
	Exhausted { attempts: u32 },
	Fatal(E),
}

/// Limits for a retry loop
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
	/// `None` retries until success or shutdown
	pub max_attempts: Option<u32>,
}

impl RetryPolicy {
	pub fn unbounded() -> Self {
		Self { max_attempts: None }
	}

	pub fn bounded(max_attempts: u32) -> Self {
		Self {
			max_attempts: Some(max_attempts),
		}
	}
}

/// Resolves once shutdown is signalled or the sender is gone
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
	let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Runs `fut` unless shutdown comes first, in which case `None` is returned and `fut` is dropped
pub async fn cancellable<F: Future>(
	fut: F,
	shutdown: &mut watch::Receiver<bool>,
) -> Option<F::Output> {
	tokio::select! {
		biased;
		_ = wait_for_shutdown(shutdown) => None,
		output = fut => Some(output),
	}
}

/// Sleeps for `duration`. Returns `false` if shutdown interrupted the sleep.
pub async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
	cancellable(tokio::time::sleep(duration), shutdown)
		.await
		.is_some()
}

/// Calls `attempt` until it succeeds, fails fatally, runs out of attempts or shutdown is signalled
pub async fn retry<T, E, F, Fut>(
	policy: RetryPolicy,
	shutdown: &mut watch::Receiver<bool>,
	mut attempt: F,
) -> Result<T, RetryError<E>>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Attempt<T, E>>,
{
	let mut attempts = 0u32;
	loop {
		attempts += 1;
		let outcome = cancellable(attempt(), shutdown)
			.await
			.ok_or(RetryError::Cancelled)?;

		match outcome {
			Attempt::Success(value) => return Ok(value),
			Attempt::Fatal(err) => return Err(RetryError::Fatal(err)),
			Attempt::RetryAfter(delay) => {
				if policy.max_attempts.is_some_and(|max| attempts >= max) {
					return Err(RetryError::Exhausted { attempts });
				}
				if !sleep_or_shutdown(delay, shutdown).await {
					return Err(RetryError::Cancelled);
				}
			}
		}
	}
}
