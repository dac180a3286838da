//! Canonical event payloads for the Aave governance module and its tokens.
//!
//! EVM values are converted to display strings at enrichment: addresses as
//! checksummed hex, amounts as decimal strings.

use serde::Serialize;

use crate::types::{EventData, Lifecycle};

/// The closed set of Aave event kinds this crate emits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AaveEventKind {
    ProposalCreated,
    VoteEmitted,
    ProposalQueued,
    ProposalExecuted,
    ProposalCanceled,
    DelegateChanged,
    DelegatedPowerChanged,
    Transfer,
}

impl AaveEventKind {
    /// Every kind, for exhaustiveness checks in tests.
    pub const ALL: [AaveEventKind; 8] = [
        AaveEventKind::ProposalCreated,
        AaveEventKind::VoteEmitted,
        AaveEventKind::ProposalQueued,
        AaveEventKind::ProposalExecuted,
        AaveEventKind::ProposalCanceled,
        AaveEventKind::DelegateChanged,
        AaveEventKind::DelegatedPowerChanged,
        AaveEventKind::Transfer,
    ];
}

/// Aave tracks a single entity family: governance proposals. Token events
/// (delegation, transfers) carry no entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AaveEntityKind {
    Proposal,
}

/// Canonical Aave event payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum AaveEventData {
    ProposalCreated {
        id: u32,
        proposer: String,
        executor: String,
        targets: Vec<String>,
        values: Vec<String>,
        signatures: Vec<String>,
        calldatas: Vec<String>,
        start_block: u64,
        end_block: u64,
        strategy: String,
        ipfs_hash: String,
    },
    VoteEmitted {
        id: u32,
        voter: String,
        support: bool,
        voting_power: String,
    },
    ProposalQueued {
        id: u32,
        execution_time: u64,
    },
    ProposalExecuted {
        id: u32,
    },
    ProposalCanceled {
        id: u32,
    },
    DelegateChanged {
        token_address: String,
        delegator: String,
        delegatee: String,
    },
    DelegatedPowerChanged {
        token_address: String,
        who: String,
        amount: String,
    },
    Transfer {
        token_address: String,
        from: String,
        to: String,
        amount: String,
    },
}

impl EventData for AaveEventData {
    type Kind = AaveEventKind;
    type Entity = AaveEntityKind;

    fn kind(&self) -> AaveEventKind {
        match self {
            AaveEventData::ProposalCreated { .. } => AaveEventKind::ProposalCreated,
            AaveEventData::VoteEmitted { .. } => AaveEventKind::VoteEmitted,
            AaveEventData::ProposalQueued { .. } => AaveEventKind::ProposalQueued,
            AaveEventData::ProposalExecuted { .. } => AaveEventKind::ProposalExecuted,
            AaveEventData::ProposalCanceled { .. } => AaveEventKind::ProposalCanceled,
            AaveEventData::DelegateChanged { .. } => AaveEventKind::DelegateChanged,
            AaveEventData::DelegatedPowerChanged { .. } => AaveEventKind::DelegatedPowerChanged,
            AaveEventData::Transfer { .. } => AaveEventKind::Transfer,
        }
    }

    fn classify(kind: AaveEventKind) -> Option<(AaveEntityKind, Lifecycle)> {
        match kind {
            AaveEventKind::ProposalCreated => Some((AaveEntityKind::Proposal, Lifecycle::Create)),
            AaveEventKind::VoteEmitted | AaveEventKind::ProposalQueued => {
                Some((AaveEntityKind::Proposal, Lifecycle::Update))
            }
            AaveEventKind::ProposalExecuted | AaveEventKind::ProposalCanceled => {
                Some((AaveEntityKind::Proposal, Lifecycle::Complete))
            }
            AaveEventKind::DelegateChanged
            | AaveEventKind::DelegatedPowerChanged
            | AaveEventKind::Transfer => None,
        }
    }
}
