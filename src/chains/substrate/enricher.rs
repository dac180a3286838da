use std::sync::Arc;

use super::{SubstrateApi, SubstrateEventData, SubstrateRuntimeEvent};
use crate::{error::ApiError, types::ChainEvent};

/// Turns raw runtime events into canonical payloads, performing the
/// per-kind read-only storage queries the runtime event itself cannot
/// answer (proposal hashes, proposers, call preimages, treasury details).
pub struct SubstrateEnricher {
    api: Arc<dyn SubstrateApi>,
}

impl SubstrateEnricher {
    pub fn new(api: Arc<dyn SubstrateApi>) -> Self {
        Self { api }
    }

    /// Enriches one runtime event. `Ok(None)` means the event is not one
    /// this crate tracks; errors mean an auxiliary query failed and the
    /// record should be dropped by the caller.
    pub async fn enrich(
        &self,
        block_number: u64,
        event: &SubstrateRuntimeEvent,
    ) -> Result<Option<ChainEvent<SubstrateEventData>>, ApiError> {
        let event = match event {
            SubstrateRuntimeEvent::DemocracyProposed { proposal_index, deposit } => {
                let props = self.api.public_props().await?;
                let prop = props
                    .into_iter()
                    .find(|p| p.index == *proposal_index)
                    .ok_or_else(|| {
                        ApiError::not_found(format!("democracy proposal {proposal_index}"))
                    })?;
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::DemocracyProposed {
                        proposal_index: *proposal_index,
                        proposal_hash: prop.hash,
                        deposit: deposit.to_string(),
                        proposer: prop.proposer.clone(),
                    },
                )
                .excluding(vec![prop.proposer])
            }
            SubstrateRuntimeEvent::DemocracyTabled { proposal_index } => ChainEvent::new(
                block_number,
                SubstrateEventData::DemocracyTabled { proposal_index: *proposal_index },
            ),
            SubstrateRuntimeEvent::DemocracyStarted { referendum_index, vote_threshold } => {
                let info = self.api.referendum_info(*referendum_index).await?;
                let (proposal_hash, end_block) = match info {
                    Some(info) => (info.proposal_hash, info.end_block),
                    None => (String::new(), 0),
                };
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::DemocracyStarted {
                        referendum_index: *referendum_index,
                        proposal_hash,
                        vote_threshold: vote_threshold.clone(),
                        end_block,
                    },
                )
            }
            SubstrateRuntimeEvent::DemocracyPassed { referendum_index } => {
                let queue = self.api.dispatch_queue().await?;
                let dispatch_block = queue
                    .iter()
                    .find(|entry| entry.referendum_index == *referendum_index)
                    .map(|entry| entry.dispatch_block);
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::DemocracyPassed {
                        referendum_index: *referendum_index,
                        dispatch_block,
                    },
                )
            }
            SubstrateRuntimeEvent::DemocracyNotPassed { referendum_index } => ChainEvent::new(
                block_number,
                SubstrateEventData::DemocracyNotPassed { referendum_index: *referendum_index },
            ),
            SubstrateRuntimeEvent::DemocracyCancelled { referendum_index } => ChainEvent::new(
                block_number,
                SubstrateEventData::DemocracyCancelled { referendum_index: *referendum_index },
            ),
            SubstrateRuntimeEvent::DemocracyExecuted { referendum_index, execution_ok } => {
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::DemocracyExecuted {
                        referendum_index: *referendum_index,
                        execution_ok: *execution_ok,
                    },
                )
            }
            SubstrateRuntimeEvent::PreimageNoted { proposal_hash, noter } => {
                let record = self.api.preimage(proposal_hash).await?.ok_or_else(|| {
                    ApiError::not_found(format!("preimage {proposal_hash}"))
                })?;
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::PreimageNoted {
                        proposal_hash: proposal_hash.clone(),
                        noter: noter.clone(),
                        preimage: record.call,
                    },
                )
                .excluding(vec![noter.clone()])
            }
            SubstrateRuntimeEvent::PreimageUsed { proposal_hash, noter } => ChainEvent::new(
                block_number,
                SubstrateEventData::PreimageUsed {
                    proposal_hash: proposal_hash.clone(),
                    noter: noter.clone(),
                },
            ),
            SubstrateRuntimeEvent::PreimageInvalid { proposal_hash, referendum_index } => {
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::PreimageInvalid {
                        proposal_hash: proposal_hash.clone(),
                        referendum_index: *referendum_index,
                    },
                )
            }
            SubstrateRuntimeEvent::PreimageReaped { proposal_hash, noter, reaper } => {
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::PreimageReaped {
                        proposal_hash: proposal_hash.clone(),
                        noter: noter.clone(),
                        reaper: reaper.clone(),
                    },
                )
            }
            SubstrateRuntimeEvent::TreasuryProposed { proposal_index } => {
                let record =
                    self.api.treasury_proposal(*proposal_index).await?.ok_or_else(|| {
                        ApiError::not_found(format!("treasury proposal {proposal_index}"))
                    })?;
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::TreasuryProposed {
                        proposal_index: *proposal_index,
                        proposer: record.proposer.clone(),
                        value: record.value.to_string(),
                        beneficiary: record.beneficiary,
                        bond: record.bond.to_string(),
                    },
                )
                .excluding(vec![record.proposer])
            }
            SubstrateRuntimeEvent::TreasuryAwarded { proposal_index, award, beneficiary } => {
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::TreasuryAwarded {
                        proposal_index: *proposal_index,
                        value: award.to_string(),
                        beneficiary: beneficiary.clone(),
                    },
                )
            }
            SubstrateRuntimeEvent::TreasuryRejected { proposal_index } => ChainEvent::new(
                block_number,
                SubstrateEventData::TreasuryRejected { proposal_index: *proposal_index },
            ),
            SubstrateRuntimeEvent::CollectiveProposed {
                collective_name,
                proposer,
                proposal_index,
                proposal_hash,
                threshold,
            } => {
                let record = self
                    .api
                    .collective_proposal_of(collective_name, proposal_hash)
                    .await?
                    .ok_or_else(|| {
                        ApiError::not_found(format!("collective proposal {proposal_hash}"))
                    })?;
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::CollectiveProposed {
                        collective_name: collective_name.clone(),
                        proposer: proposer.clone(),
                        proposal_index: *proposal_index,
                        proposal_hash: proposal_hash.clone(),
                        threshold: *threshold,
                        call: record.call,
                    },
                )
                .excluding(vec![proposer.clone()])
            }
            SubstrateRuntimeEvent::CollectiveVoted {
                collective_name,
                proposal_hash,
                voter,
                vote,
            } => ChainEvent::new(
                block_number,
                SubstrateEventData::CollectiveVoted {
                    collective_name: collective_name.clone(),
                    proposal_hash: proposal_hash.clone(),
                    voter: voter.clone(),
                    vote: *vote,
                },
            )
            .excluding(vec![voter.clone()]),
            SubstrateRuntimeEvent::CollectiveApproved { collective_name, proposal_hash } => {
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::CollectiveApproved {
                        collective_name: collective_name.clone(),
                        proposal_hash: proposal_hash.clone(),
                    },
                )
            }
            SubstrateRuntimeEvent::CollectiveDisapproved { collective_name, proposal_hash } => {
                ChainEvent::new(
                    block_number,
                    SubstrateEventData::CollectiveDisapproved {
                        collective_name: collective_name.clone(),
                        proposal_hash: proposal_hash.clone(),
                    },
                )
            }
            SubstrateRuntimeEvent::CollectiveExecuted {
                collective_name,
                proposal_hash,
                execution_ok,
            } => ChainEvent::new(
                block_number,
                SubstrateEventData::CollectiveExecuted {
                    collective_name: collective_name.clone(),
                    proposal_hash: proposal_hash.clone(),
                    execution_ok: *execution_ok,
                },
            ),
            SubstrateRuntimeEvent::Unknown => return Ok(None),
        };
        Ok(Some(event))
    }
}
