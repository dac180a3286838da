use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{SubstrateApi, SubstrateEntityKind, SubstrateEventData, COLLECTIVES};
use crate::{
    error::ApiError,
    interfaces::StorageFetcher,
    types::{normalize_range, ChainEvent, DisconnectedRange},
};

/// Reconstructs governance events from current chain storage.
///
/// Storage only records live state, so synthesized events are dated at the
/// current head, except preimages which keep their recorded noting block.
/// The fetch runs in phases because later phases need ids collected by
/// earlier ones: proposal and referendum hashes feed the preimage lookups.
pub struct SubstrateStorageFetcher {
    api: Arc<dyn SubstrateApi>,
}

impl SubstrateStorageFetcher {
    pub fn new(api: Arc<dyn SubstrateApi>) -> Self {
        Self { api }
    }

    /// Democracy public proposals, plus their hashes for the preimage phase.
    async fn fetch_democracy_proposals(
        &self,
        head: u64,
        only_index: Option<u32>,
    ) -> Result<(Vec<ChainEvent<SubstrateEventData>>, Vec<String>), ApiError> {
        let mut events = Vec::new();
        let mut hashes = Vec::new();
        for prop in self.api.public_props().await? {
            if only_index.is_some_and(|index| index != prop.index) {
                continue;
            }
            let Some(deposit) = self.api.deposit_of(prop.index).await? else {
                debug!(proposal = prop.index, "public proposal has no deposit, skipping");
                continue;
            };
            hashes.push(prop.hash.clone());
            events.push(
                ChainEvent::new(
                    head,
                    SubstrateEventData::DemocracyProposed {
                        proposal_index: prop.index,
                        proposal_hash: prop.hash,
                        deposit: deposit.balance.to_string(),
                        proposer: prop.proposer.clone(),
                    },
                )
                .excluding(vec![prop.proposer]),
            );
        }
        Ok((events, hashes))
    }

    /// Active referenda plus queued (passed) ones, with their hashes.
    async fn fetch_democracy_referenda(
        &self,
        head: u64,
        only_index: Option<u32>,
    ) -> Result<(Vec<ChainEvent<SubstrateEventData>>, Vec<String>), ApiError> {
        let mut events = Vec::new();
        let mut hashes = Vec::new();
        for referendum in self.api.active_referenda().await? {
            if only_index.is_some_and(|index| index != referendum.index) {
                continue;
            }
            hashes.push(referendum.proposal_hash.clone());
            events.push(ChainEvent::new(
                head,
                SubstrateEventData::DemocracyStarted {
                    referendum_index: referendum.index,
                    proposal_hash: referendum.proposal_hash,
                    vote_threshold: referendum.vote_threshold,
                    end_block: referendum.end_block,
                },
            ));
        }
        for entry in self.api.dispatch_queue().await? {
            if only_index.is_some_and(|index| index != entry.referendum_index) {
                continue;
            }
            hashes.push(entry.proposal_hash.clone());
            // storage no longer records the original voting parameters
            events.push(ChainEvent::new(
                head,
                SubstrateEventData::DemocracyStarted {
                    referendum_index: entry.referendum_index,
                    proposal_hash: entry.proposal_hash,
                    vote_threshold: String::new(),
                    end_block: 0,
                },
            ));
            events.push(ChainEvent::new(
                head,
                SubstrateEventData::DemocracyPassed {
                    referendum_index: entry.referendum_index,
                    dispatch_block: Some(entry.dispatch_block),
                },
            ));
        }
        Ok((events, hashes))
    }

    /// Preimages for hashes surfaced by the proposal and referendum phases.
    /// These keep the block they were noted at.
    async fn fetch_democracy_preimages(
        &self,
        hashes: &[String],
    ) -> Result<Vec<ChainEvent<SubstrateEventData>>, ApiError> {
        let mut events = Vec::new();
        for hash in hashes {
            let Some(record) = self.api.preimage(hash).await? else {
                continue;
            };
            events.push(
                ChainEvent::new(
                    record.at_block,
                    SubstrateEventData::PreimageNoted {
                        proposal_hash: hash.clone(),
                        noter: record.noter.clone(),
                        preimage: record.call,
                    },
                )
                .excluding(vec![record.noter]),
            );
        }
        Ok(events)
    }

    /// All treasury proposals not yet approved for payout.
    async fn fetch_treasury_proposals(
        &self,
        head: u64,
        only_index: Option<u32>,
    ) -> Result<Vec<ChainEvent<SubstrateEventData>>, ApiError> {
        let count = self.api.treasury_proposal_count().await?;
        let approvals = self.api.treasury_approvals().await?;
        let mut events = Vec::new();
        for index in 0..count {
            if only_index.is_some_and(|only| only != index) {
                continue;
            }
            if approvals.contains(&index) {
                continue;
            }
            let Some(record) = self.api.treasury_proposal(index).await? else {
                continue;
            };
            events.push(
                ChainEvent::new(
                    head,
                    SubstrateEventData::TreasuryProposed {
                        proposal_index: index,
                        proposer: record.proposer.clone(),
                        value: record.value.to_string(),
                        beneficiary: record.beneficiary,
                        bond: record.bond.to_string(),
                    },
                )
                .excluding(vec![record.proposer]),
            );
        }
        Ok(events)
    }

    /// Proposals and recorded votes for one collective.
    async fn fetch_collective_proposals(
        &self,
        collective: &str,
        head: u64,
        only_hash: Option<&str>,
    ) -> Result<Vec<ChainEvent<SubstrateEventData>>, ApiError> {
        let mut events = Vec::new();
        for hash in self.api.collective_proposals(collective).await? {
            if only_hash.is_some_and(|only| only != hash.as_str()) {
                continue;
            }
            let Some(record) = self.api.collective_proposal_of(collective, &hash).await? else {
                continue;
            };
            events.push(ChainEvent::new(
                head,
                SubstrateEventData::CollectiveProposed {
                    collective_name: collective.to_owned(),
                    // the proposing account is not kept in storage
                    proposer: String::new(),
                    proposal_index: record.index,
                    proposal_hash: hash.clone(),
                    threshold: record.threshold,
                    call: record.call,
                },
            ));
            let Some(votes) = self.api.collective_votes(collective, &hash).await? else {
                continue;
            };
            for (voter, vote) in votes
                .ayes
                .iter()
                .map(|who| (who, true))
                .chain(votes.nays.iter().map(|who| (who, false)))
            {
                events.push(ChainEvent::new(
                    head,
                    SubstrateEventData::CollectiveVoted {
                        collective_name: collective.to_owned(),
                        proposal_hash: hash.clone(),
                        voter: voter.clone(),
                        vote,
                    },
                ));
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl StorageFetcher for SubstrateStorageFetcher {
    type Data = SubstrateEventData;

    /// `fetch_all_completed` has no effect here: Substrate storage only
    /// lists live governance items, so there are no completed entities to
    /// walk past.
    async fn fetch(
        &self,
        range: Option<DisconnectedRange>,
        _fetch_all_completed: bool,
    ) -> Result<Vec<ChainEvent<SubstrateEventData>>, ApiError> {
        let head = self.api.best_block_number().await?;
        let Some(range) = normalize_range(range, head) else {
            return Ok(Vec::new());
        };

        let (proposal_events, proposal_hashes) =
            self.fetch_democracy_proposals(head, None).await?;
        let (referenda_events, referenda_hashes) =
            self.fetch_democracy_referenda(head, None).await?;

        let mut hashes = proposal_hashes;
        hashes.extend(referenda_hashes);
        let preimage_events = self.fetch_democracy_preimages(&hashes).await?;

        let treasury_events = self.fetch_treasury_proposals(head, None).await?;

        let mut events = proposal_events;
        events.extend(referenda_events);
        events.extend(preimage_events);
        events.extend(treasury_events);
        for collective in COLLECTIVES {
            events.extend(self.fetch_collective_proposals(collective, head, None).await?);
        }

        events.retain(|event| range.contains(&event.block_number));
        events.sort_by_key(|event| event.block_number);
        info!(head, count = events.len(), "storage fetch complete");
        Ok(events)
    }

    /// Requires the entity kind; a bare id is ambiguous across the five
    /// entity families.
    async fn fetch_one(
        &self,
        id: &str,
        entity: Option<SubstrateEntityKind>,
    ) -> Result<Vec<ChainEvent<SubstrateEventData>>, ApiError> {
        let Some(entity) = entity else {
            return Err(ApiError::invalid_argument("entity kind required for lookup"));
        };
        let head = self.api.best_block_number().await?;
        match entity {
            SubstrateEntityKind::DemocracyProposal => {
                let index = parse_index(id)?;
                Ok(self.fetch_democracy_proposals(head, Some(index)).await?.0)
            }
            SubstrateEntityKind::DemocracyReferendum => {
                let index = parse_index(id)?;
                Ok(self.fetch_democracy_referenda(head, Some(index)).await?.0)
            }
            SubstrateEntityKind::DemocracyPreimage => {
                let hashes = [id.to_owned()];
                self.fetch_democracy_preimages(&hashes).await
            }
            SubstrateEntityKind::TreasuryProposal => {
                let index = parse_index(id)?;
                self.fetch_treasury_proposals(head, Some(index)).await
            }
            SubstrateEntityKind::CollectiveProposal => {
                let mut events = Vec::new();
                for collective in COLLECTIVES {
                    events.extend(
                        self.fetch_collective_proposals(collective, head, Some(id)).await?,
                    );
                }
                Ok(events)
            }
        }
    }
}

fn parse_index(id: &str) -> Result<u32, ApiError> {
    id.parse()
        .map_err(|_| ApiError::invalid_argument(format!("expected a numeric id, got {id:?}")))
}
