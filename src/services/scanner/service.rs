//! Shard chain scanner.
//!
//! Each cycle polls the masterchain head, picks the tracked shard's block from the head's shard
//! list and walks parent links back to the watermark, emitting every block on the way. Blocks of a
//! batch are emitted newest first. The watermark moves to the batch head only once the walk reaches
//! the previous watermark, so an aborted batch is replayed in full by a later cycle.

use std::{future::Future, sync::Arc, time::Duration};
use tokio::{sync::watch, time::Instant};
use tracing::instrument;

use crate::{
	models::{BlockRef, MasterchainHead, ScannerConfig},
	services::{
		blockchain::{ChainHeadClient, TonClientError},
		bus::EventSink,
		scanner::{
			error::ScannerError,
			retry::{cancellable, retry, sleep_or_shutdown, Attempt, RetryError, RetryPolicy},
			shard::select_shard_block,
			storage::WatermarkStore,
			tracker::EmissionTracker,
		},
	},
	utils::{
		metrics::{
			record_batch_failure, record_master_head, record_watermark, BATCHES_COMPLETED,
			BLOCKS_EMITTED, NOT_APPLIED_RETRIES, WATERMARK_SAVE_FAILURES,
		},
		parsing::format_shard_id,
	},
};

/// Scanner parameters taken from the configuration
#[derive(Debug, Clone)]
pub struct ScannerSettings {
	pub slug: String,
	pub workchain: i32,
	pub shard_selector: u8,
	pub master_poll_interval: Duration,
	pub not_applied_backoff: Duration,
	pub error_backoff: Duration,
	/// Limit for not-applied retries of a single fetch
	pub retry_policy: RetryPolicy,
}

impl Default for ScannerSettings {
	fn default() -> Self {
		Self {
			slug: "ton".to_string(),
			workchain: 0,
			shard_selector: 0,
			master_poll_interval: Duration::from_secs(30),
			not_applied_backoff: Duration::from_secs(1),
			error_backoff: Duration::from_secs(1),
			retry_policy: RetryPolicy::unbounded(),
		}
	}
}

impl From<&ScannerConfig> for ScannerSettings {
	fn from(config: &ScannerConfig) -> Self {
		Self {
			slug: config.slug.clone(),
			workchain: config.workchain,
			shard_selector: config.shard_selector,
			master_poll_interval: config.master_poll_interval(),
			not_applied_backoff: config.not_applied_backoff(),
			error_backoff: config.error_backoff(),
			retry_policy: RetryPolicy::unbounded(),
		}
	}
}

/// Result of one scan cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
	/// The masterchain head has not moved since the last cycle
	HeadUnchanged { master_seqno: u32 },
	/// The master block lists no block for the tracked shard
	ShardNotFound { master_seqno: u32 },
	/// First run: the watermark was set to the current shard head without a walk
	Initialized { watermark: BlockRef },
	/// The walk reached the previous watermark
	CaughtUp { head: BlockRef, emitted: usize },
}

/// Walks one shard chain and emits its blocks
pub struct ShardScanner<C, W: ?Sized, S: ?Sized> {
	client: C,
	store: Arc<W>,
	sink: Arc<S>,
	settings: ScannerSettings,
	last_master: Option<MasterchainHead>,
	watermark: Option<BlockRef>,
	tracker: EmissionTracker,
}

impl<C, W, S> ShardScanner<C, W, S>
where
	C: ChainHeadClient,
	W: WatermarkStore + ?Sized,
	S: EventSink + ?Sized,
{
	/// Creates a scanner starting from `watermark`, `None` meaning first run
	pub fn new(
		client: C,
		store: Arc<W>,
		sink: Arc<S>,
		settings: ScannerSettings,
		watermark: Option<BlockRef>,
	) -> Self {
		if let Some(block) = &watermark {
			record_watermark(block.seqno);
		}
		Self {
			client,
			store,
			sink,
			settings,
			last_master: None,
			watermark,
			tracker: EmissionTracker::default(),
		}
	}

	/// Creates a scanner starting from the watermark persisted in `store`
	pub async fn resume(
		client: C,
		store: Arc<W>,
		sink: Arc<S>,
		settings: ScannerSettings,
	) -> Result<Self, ScannerError> {
		let watermark = store
			.load_watermark(&settings.slug)
			.await
			.map_err(|e| {
				ScannerError::storage_error(
					format!("Failed to load watermark for '{}'", settings.slug),
					Some(e.into()),
					None,
				)
			})?;

		match &watermark {
			Some(block) => tracing::info!("Resuming '{}' from watermark {}", settings.slug, block),
			None => tracing::info!(
				"No watermark stored for '{}', starting at the current shard head",
				settings.slug
			),
		}

		Ok(Self::new(client, store, sink, settings, watermark))
	}

	/// Last fully processed shard block
	pub fn last_known_shard_block(&self) -> Option<&BlockRef> {
		self.watermark.as_ref()
	}

	/// Last masterchain head seen by a cycle
	pub fn last_master_block(&self) -> Option<&MasterchainHead> {
		self.last_master.as_ref()
	}

	pub fn settings(&self) -> &ScannerSettings {
		&self.settings
	}

	pub fn tracker(&self) -> &EmissionTracker {
		&self.tracker
	}

	/// Runs cycles until shutdown is signalled
	///
	/// Sleeps `master_poll_interval` when the head has not moved and `error_backoff` after a failed
	/// cycle.
	pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
		tracing::info!(
			"Starting shard scanner '{}' for workchain {} shard selector {:#04x}",
			self.settings.slug,
			self.settings.workchain,
			self.settings.shard_selector
		);

		loop {
			let pause = match self.run_cycle(&mut shutdown).await {
				Ok(CycleOutcome::HeadUnchanged { .. }) => Some(self.settings.master_poll_interval),
				Ok(_) => None,
				Err(ScannerError::Cancelled) => break,
				Err(e) => {
					record_batch_failure(e.stage());
					tracing::warn!(
						"Scan cycle for '{}' aborted, retrying in {:?}: {}",
						self.settings.slug,
						self.settings.error_backoff,
						e
					);
					Some(self.settings.error_backoff)
				}
			};

			match pause {
				Some(pause) => {
					if !sleep_or_shutdown(pause, &mut shutdown).await {
						break;
					}
				}
				None => {
					if *shutdown.borrow() {
						break;
					}
				}
			}
		}

		match &self.watermark {
			Some(block) => tracing::info!("Shard scanner stopped at {}", block),
			None => tracing::info!("Shard scanner stopped before the first batch"),
		}
	}

	/// Runs one cycle: poll the head, locate the shard block and catch up to it
	#[instrument(skip_all, fields(scanner = %self.settings.slug))]
	pub async fn run_cycle(
		&mut self,
		shutdown: &mut watch::Receiver<bool>,
	) -> Result<CycleOutcome, ScannerError> {
		let head = cancellable(self.client.get_current_head(), shutdown)
			.await
			.ok_or(ScannerError::Cancelled)?
			.map_err(|e| {
				ScannerError::network_error("Failed to poll masterchain head", Some(e.into()), None)
			})?;
		record_master_head(head.seqno());

		if self
			.last_master
			.as_ref()
			.is_some_and(|last| last.seqno() == head.seqno())
		{
			tracing::debug!("Masterchain head {} unchanged", head.seqno());
			return Ok(CycleOutcome::HeadUnchanged {
				master_seqno: head.seqno(),
			});
		}
		// Kept even if the rest of the cycle fails: a master block's shard set never changes
		self.last_master = Some(head.clone());

		let shard_refs = self
			.fetch(shutdown, "shard list", || {
				self.client.get_shard_block_refs(&head)
			})
			.await?;

		let workchain = self.settings.workchain;
		let Some(shard_head) = select_shard_block(
			shard_refs.iter().filter(|block| block.workchain == workchain),
			self.settings.shard_selector,
		) else {
			tracing::warn!(
				"Master block {} has no block for workchain {} shard selector {:#04x}",
				head.seqno(),
				workchain,
				self.settings.shard_selector
			);
			return Ok(CycleOutcome::ShardNotFound {
				master_seqno: head.seqno(),
			});
		};

		let Some(watermark) = self.watermark.clone() else {
			tracing::info!("Initial watermark set to {}", shard_head);
			self.advance_watermark(&shard_head).await;
			return Ok(CycleOutcome::Initialized {
				watermark: shard_head,
			});
		};

		let emitted = self.catch_up(&shard_head, &watermark, shutdown).await?;
		self.advance_watermark(&shard_head).await;
		BATCHES_COMPLETED.inc();

		Ok(CycleOutcome::CaughtUp {
			head: shard_head,
			emitted,
		})
	}

	/// Walks from `head` back to `watermark`, emitting every block except the watermark itself
	#[instrument(skip_all, fields(shard = %format_shard_id(head.shard), head = head.seqno, watermark = watermark.seqno))]
	async fn catch_up(
		&mut self,
		head: &BlockRef,
		watermark: &BlockRef,
		shutdown: &mut watch::Receiver<bool>,
	) -> Result<usize, ScannerError> {
		tracing::info!(
			"Seqno diff: {}",
			i64::from(head.seqno) - i64::from(watermark.seqno)
		);
		let started = Instant::now();
		let mut emitted = 0;
		let mut current = head.clone();

		while current != *watermark {
			if current.seqno <= watermark.seqno {
				return Err(ScannerError::processing_error(
					format!(
						"Shard chain passed watermark {} at {} without reaching it",
						watermark, current
					),
					None,
					None,
				));
			}

			let info = self
				.fetch(shutdown, "block header", || {
					self.client.get_block_header(&current)
				})
				.await?;
			let parent = select_shard_block(&info.parents, self.settings.shard_selector);
			let header = info.into_header(parent.clone());

			self.sink.emit_block_found(header).map_err(|e| {
				ScannerError::sink_error(
					format!("Failed to emit block {}", current),
					Some(Box::new(e)),
					None,
				)
			})?;
			emitted += 1;
			BLOCKS_EMITTED.inc();
			self.tracker.record(&current);

			current = parent.ok_or_else(|| {
				ScannerError::processing_error(
					format!("Block {} has no parent in the tracked shard", current),
					None,
					None,
				)
			})?;
		}

		tracing::info!(
			"Blocks processed: {}, Elapsed time: {:?}",
			emitted,
			started.elapsed()
		);
		Ok(emitted)
	}

	/// Moves the watermark to `block` and persists it
	///
	/// A failed save is counted and logged only; the in-memory watermark still advances.
	async fn advance_watermark(&mut self, block: &BlockRef) {
		self.watermark = Some(block.clone());
		record_watermark(block.seqno);

		if let Err(e) = self.store.save_watermark(&self.settings.slug, block).await {
			WATERMARK_SAVE_FAILURES.inc();
			tracing::error!("Failed to persist watermark {}: {:#}", block, e);
		}
	}

	/// Calls `op` until it succeeds, retrying while the node reports a block as not applied
	async fn fetch<T, F, Fut>(
		&self,
		shutdown: &mut watch::Receiver<bool>,
		what: &str,
		mut op: F,
	) -> Result<T, ScannerError>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, anyhow::Error>>,
	{
		let backoff = self.settings.not_applied_backoff;
		let outcome = retry(self.settings.retry_policy, shutdown, || {
			let attempt = op();
			async move {
				match attempt.await {
					Ok(value) => Attempt::Success(value),
					Err(e) if TonClientError::is_not_applied_error(&e) => {
						NOT_APPLIED_RETRIES.inc();
						tracing::debug!("{} not applied yet, retrying in {:?}", what, backoff);
						Attempt::RetryAfter(backoff)
					}
					Err(e) => Attempt::Fatal(e),
				}
			}
		})
		.await;

		outcome.map_err(|e| match e {
			RetryError::Cancelled => ScannerError::Cancelled,
			RetryError::Exhausted { attempts } => ScannerError::network_error(
				format!("{} still not applied after {} attempts", what, attempts),
				None,
				None,
			),
			RetryError::Fatal(e) => ScannerError::network_error(
				format!("Failed to fetch {}", what),
				Some(e.into()),
				None,
			),
		})
	}
}
