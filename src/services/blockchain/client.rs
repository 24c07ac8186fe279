//! Chain-head client interface.
//!
//! The scanner reads the chain only through this trait so the data source can be swapped for a
//! fake in tests.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::models::{BlockRef, MasterchainHead, ShardBlockInfo};

/// Read access to the masterchain head and shard block headers
///
/// Implementations report a block that the node knows about but has not applied yet as a
/// [`TonClientError::NotApplied`](crate::services::blockchain::TonClientError::NotApplied) somewhere
/// in the returned error chain. Callers retry those; every other error is a hard failure.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainHeadClient: Send + Sync {
	/// Retrieves the latest masterchain block
	///
	/// # Returns
	/// * `Result<MasterchainHead, anyhow::Error>` - The current masterchain head or an error
	async fn get_current_head(&self) -> Result<MasterchainHead, anyhow::Error>;

	/// Retrieves the shard block references contained in a masterchain block
	///
	/// # Arguments
	/// * `head` - The masterchain block whose shard list is requested
	async fn get_shard_block_refs(
		&self,
		head: &MasterchainHead,
	) -> Result<Vec<BlockRef>, anyhow::Error>;

	/// Retrieves the header of a shard block with all of its parent candidates
	///
	/// # Arguments
	/// * `block` - Full reference of the block, hashes included
	async fn get_block_header(&self, block: &BlockRef) -> Result<ShardBlockInfo, anyhow::Error>;
}
