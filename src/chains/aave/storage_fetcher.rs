use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{enricher::proposal_events, AaveApi, AaveEntityKind, AaveEventData};
use crate::{
    error::ApiError,
    interfaces::StorageFetcher,
    types::{normalize_range, ChainEvent, DisconnectedRange},
};

/// Reconstructs proposal lifecycles from governance storage.
///
/// Walks proposal ids newest-first so the halt conditions bound the work:
/// the walk stops at the first proposal originating before the range, and,
/// unless `fetch_all_completed` is set, right after the first completed
/// (canceled or executed) proposal inside it.
pub struct AaveStorageFetcher {
    api: Arc<dyn AaveApi>,
}

impl AaveStorageFetcher {
    pub fn new(api: Arc<dyn AaveApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl StorageFetcher for AaveStorageFetcher {
    type Data = AaveEventData;

    async fn fetch(
        &self,
        range: Option<DisconnectedRange>,
        fetch_all_completed: bool,
    ) -> Result<Vec<ChainEvent<AaveEventData>>, ApiError> {
        let head = self.api.current_block().await?;
        let Some(range) = normalize_range(range, head) else {
            return Ok(Vec::new());
        };

        let count = self.api.proposal_count().await?;
        let mut events = Vec::new();
        for id in (0..count).rev() {
            let Some(proposal) = self.api.proposal_by_id(id).await? else {
                debug!(proposal = id, "no storage record for proposal, skipping");
                continue;
            };
            if proposal.start_block > *range.end() {
                continue;
            }
            if proposal.start_block < *range.start() {
                debug!(
                    proposal = id,
                    start_block = proposal.start_block,
                    "proposal predates the range, stopping walk"
                );
                break;
            }
            let completed = proposal.canceled || proposal.executed;
            events.extend(proposal_events(&proposal));
            if completed && !fetch_all_completed {
                info!(proposal = id, "reached a completed proposal, stopping walk");
                break;
            }
        }

        events.sort_by_key(|event| event.block_number);
        info!(head, count = events.len(), "storage fetch complete");
        Ok(events)
    }

    /// Ids are proposal ids, so the entity hint is not needed and ignored.
    async fn fetch_one(
        &self,
        id: &str,
        _entity: Option<AaveEntityKind>,
    ) -> Result<Vec<ChainEvent<AaveEventData>>, ApiError> {
        let id: u32 = id.parse().map_err(|_| {
            ApiError::invalid_argument(format!("expected a numeric proposal id, got {id:?}"))
        })?;
        let Some(proposal) = self.api.proposal_by_id(id).await? else {
            return Ok(Vec::new());
        };
        Ok(proposal_events(&proposal))
    }
}
