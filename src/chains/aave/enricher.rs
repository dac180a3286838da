use alloy_primitives::U256;
use tracing::error;

use super::{AaveEventData, AaveLogPayload, AaveProposal};
use crate::types::ChainEvent;

/// Maps decoded log payloads onto canonical events.
///
/// Purely local field conversion, no chain reads: addresses become
/// checksummed hex strings, amounts decimal strings. A numeric field too
/// large for its canonical width is logged and the log dropped.
pub struct AaveEnricher;

impl AaveEnricher {
    pub fn enrich(
        &self,
        block_number: u64,
        payload: &AaveLogPayload,
    ) -> Option<ChainEvent<AaveEventData>> {
        let event = match payload {
            AaveLogPayload::ProposalCreated {
                id,
                creator,
                executor,
                targets,
                values,
                signatures,
                calldatas,
                start_block,
                end_block,
                strategy,
                ipfs_hash,
            } => ChainEvent::new(
                block_number,
                AaveEventData::ProposalCreated {
                    id: proposal_id(id)?,
                    proposer: creator.to_string(),
                    executor: executor.to_string(),
                    targets: targets.iter().map(|t| t.to_string()).collect(),
                    values: values.iter().map(|v| v.to_string()).collect(),
                    signatures: signatures.clone(),
                    calldatas: calldatas.iter().map(|c| c.to_string()).collect(),
                    start_block: block_height(start_block)?,
                    end_block: block_height(end_block)?,
                    strategy: strategy.to_string(),
                    ipfs_hash: ipfs_hash.to_string(),
                },
            )
            .excluding(vec![creator.to_string()]),
            AaveLogPayload::VoteEmitted { id, voter, support, voting_power } => ChainEvent::new(
                block_number,
                AaveEventData::VoteEmitted {
                    id: proposal_id(id)?,
                    voter: voter.to_string(),
                    support: *support,
                    voting_power: voting_power.to_string(),
                },
            )
            .excluding(vec![voter.to_string()]),
            AaveLogPayload::ProposalQueued { id, execution_time } => ChainEvent::new(
                block_number,
                AaveEventData::ProposalQueued {
                    id: proposal_id(id)?,
                    execution_time: block_height(execution_time)?,
                },
            ),
            AaveLogPayload::ProposalExecuted { id } => ChainEvent::new(
                block_number,
                AaveEventData::ProposalExecuted { id: proposal_id(id)? },
            ),
            AaveLogPayload::ProposalCanceled { id } => ChainEvent::new(
                block_number,
                AaveEventData::ProposalCanceled { id: proposal_id(id)? },
            ),
            AaveLogPayload::DelegateChanged { token, delegator, delegatee } => ChainEvent::new(
                block_number,
                AaveEventData::DelegateChanged {
                    token_address: token.to_string(),
                    delegator: delegator.to_string(),
                    delegatee: delegatee.to_string(),
                },
            ),
            AaveLogPayload::DelegatedPowerChanged { token, user, amount } => ChainEvent::new(
                block_number,
                AaveEventData::DelegatedPowerChanged {
                    token_address: token.to_string(),
                    who: user.to_string(),
                    amount: amount.to_string(),
                },
            ),
            AaveLogPayload::Transfer { token, from, to, value } => ChainEvent::new(
                block_number,
                AaveEventData::Transfer {
                    token_address: token.to_string(),
                    from: from.to_string(),
                    to: to.to_string(),
                    amount: value.to_string(),
                },
            ),
            AaveLogPayload::Unknown => return None,
        };
        Some(event)
    }
}

/// Synthesizes the lifecycle events a proposal's storage record implies.
/// Used by the storage fetcher; the created event is dated at the voting
/// start block, terminal events at the voting end block.
pub(super) fn proposal_events(proposal: &AaveProposal) -> Vec<ChainEvent<AaveEventData>> {
    let mut events = vec![ChainEvent::new(
        proposal.start_block,
        AaveEventData::ProposalCreated {
            id: proposal.id,
            proposer: proposal.creator.to_string(),
            executor: proposal.executor.to_string(),
            targets: proposal.targets.iter().map(|t| t.to_string()).collect(),
            values: proposal.values.iter().map(|v| v.to_string()).collect(),
            signatures: proposal.signatures.clone(),
            calldatas: proposal.calldatas.iter().map(|c| c.to_string()).collect(),
            start_block: proposal.start_block,
            end_block: proposal.end_block,
            strategy: proposal.strategy.to_string(),
            ipfs_hash: proposal.ipfs_hash.to_string(),
        },
    )
    .excluding(vec![proposal.creator.to_string()])];

    if proposal.canceled {
        events.push(ChainEvent::new(
            proposal.end_block,
            AaveEventData::ProposalCanceled { id: proposal.id },
        ));
    } else if proposal.execution_time > 0 {
        events.push(ChainEvent::new(
            proposal.end_block,
            AaveEventData::ProposalQueued {
                id: proposal.id,
                execution_time: proposal.execution_time,
            },
        ));
        if proposal.executed {
            events.push(ChainEvent::new(
                proposal.end_block,
                AaveEventData::ProposalExecuted { id: proposal.id },
            ));
        }
    }
    events
}

fn proposal_id(id: &U256) -> Option<u32> {
    match u32::try_from(*id) {
        Ok(id) => Some(id),
        Err(_) => {
            error!(id = %id, "proposal id exceeds u32, dropping log");
            None
        }
    }
}

fn block_height(value: &U256) -> Option<u64> {
    match u64::try_from(*value) {
        Ok(value) => Some(value),
        Err(_) => {
            error!(value = %value, "numeric field exceeds u64, dropping log");
            None
        }
    }
}
