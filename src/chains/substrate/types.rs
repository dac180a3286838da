//! Canonical event payloads for the Substrate governance modules.
//!
//! Variant tags are the kebab-case wire names consumers key on
//! (`democracy-proposed`, `preimage-noted`, ...). Balances are carried as
//! decimal strings; raw chain values are `u128` and converted at enrichment.

use serde::Serialize;

use crate::types::{EventData, Lifecycle};

/// The closed set of Substrate event kinds this crate emits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubstrateEventKind {
    DemocracyProposed,
    DemocracyTabled,
    DemocracyStarted,
    DemocracyVoted,
    DemocracyPassed,
    DemocracyNotPassed,
    DemocracyCancelled,
    DemocracyExecuted,
    PreimageNoted,
    PreimageUsed,
    PreimageInvalid,
    PreimageReaped,
    TreasuryProposed,
    TreasuryAwarded,
    TreasuryRejected,
    CollectiveProposed,
    CollectiveVoted,
    CollectiveApproved,
    CollectiveDisapproved,
    CollectiveExecuted,
}

impl SubstrateEventKind {
    /// Every kind, for exhaustiveness checks in tests.
    pub const ALL: [SubstrateEventKind; 20] = [
        SubstrateEventKind::DemocracyProposed,
        SubstrateEventKind::DemocracyTabled,
        SubstrateEventKind::DemocracyStarted,
        SubstrateEventKind::DemocracyVoted,
        SubstrateEventKind::DemocracyPassed,
        SubstrateEventKind::DemocracyNotPassed,
        SubstrateEventKind::DemocracyCancelled,
        SubstrateEventKind::DemocracyExecuted,
        SubstrateEventKind::PreimageNoted,
        SubstrateEventKind::PreimageUsed,
        SubstrateEventKind::PreimageInvalid,
        SubstrateEventKind::PreimageReaped,
        SubstrateEventKind::TreasuryProposed,
        SubstrateEventKind::TreasuryAwarded,
        SubstrateEventKind::TreasuryRejected,
        SubstrateEventKind::CollectiveProposed,
        SubstrateEventKind::CollectiveVoted,
        SubstrateEventKind::CollectiveApproved,
        SubstrateEventKind::CollectiveDisapproved,
        SubstrateEventKind::CollectiveExecuted,
    ];
}

/// Entity families a Substrate event can belong to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubstrateEntityKind {
    DemocracyProposal,
    DemocracyReferendum,
    DemocracyPreimage,
    TreasuryProposal,
    CollectiveProposal,
}

/// A decoded runtime call, attached to preimage and collective payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallDescription {
    pub method: String,
    pub section: String,
    pub args: Vec<String>,
}

/// Canonical Substrate event payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SubstrateEventData {
    DemocracyProposed {
        proposal_index: u32,
        proposal_hash: String,
        /// Decimal string of the raw `u128` deposit.
        deposit: String,
        proposer: String,
    },
    DemocracyTabled {
        proposal_index: u32,
    },
    DemocracyStarted {
        referendum_index: u32,
        proposal_hash: String,
        vote_threshold: String,
        end_block: u64,
    },
    DemocracyVoted {
        referendum_index: u32,
        who: String,
        is_aye: bool,
        conviction: u8,
        balance: String,
    },
    DemocracyPassed {
        referendum_index: u32,
        /// Scheduled dispatch block, when the queue still records one.
        dispatch_block: Option<u64>,
    },
    DemocracyNotPassed {
        referendum_index: u32,
    },
    DemocracyCancelled {
        referendum_index: u32,
    },
    DemocracyExecuted {
        referendum_index: u32,
        execution_ok: bool,
    },
    PreimageNoted {
        proposal_hash: String,
        noter: String,
        preimage: CallDescription,
    },
    PreimageUsed {
        proposal_hash: String,
        noter: String,
    },
    PreimageInvalid {
        proposal_hash: String,
        referendum_index: u32,
    },
    PreimageReaped {
        proposal_hash: String,
        noter: String,
        reaper: String,
    },
    TreasuryProposed {
        proposal_index: u32,
        proposer: String,
        value: String,
        beneficiary: String,
        bond: String,
    },
    TreasuryAwarded {
        proposal_index: u32,
        value: String,
        beneficiary: String,
    },
    TreasuryRejected {
        proposal_index: u32,
    },
    CollectiveProposed {
        collective_name: String,
        proposer: String,
        proposal_index: u32,
        proposal_hash: String,
        threshold: u32,
        call: CallDescription,
    },
    CollectiveVoted {
        collective_name: String,
        proposal_hash: String,
        voter: String,
        vote: bool,
    },
    CollectiveApproved {
        collective_name: String,
        proposal_hash: String,
    },
    CollectiveDisapproved {
        collective_name: String,
        proposal_hash: String,
    },
    CollectiveExecuted {
        collective_name: String,
        proposal_hash: String,
        execution_ok: bool,
    },
}

impl EventData for SubstrateEventData {
    type Kind = SubstrateEventKind;
    type Entity = SubstrateEntityKind;

    fn kind(&self) -> SubstrateEventKind {
        match self {
            SubstrateEventData::DemocracyProposed { .. } => SubstrateEventKind::DemocracyProposed,
            SubstrateEventData::DemocracyTabled { .. } => SubstrateEventKind::DemocracyTabled,
            SubstrateEventData::DemocracyStarted { .. } => SubstrateEventKind::DemocracyStarted,
            SubstrateEventData::DemocracyVoted { .. } => SubstrateEventKind::DemocracyVoted,
            SubstrateEventData::DemocracyPassed { .. } => SubstrateEventKind::DemocracyPassed,
            SubstrateEventData::DemocracyNotPassed { .. } => {
                SubstrateEventKind::DemocracyNotPassed
            }
            SubstrateEventData::DemocracyCancelled { .. } => {
                SubstrateEventKind::DemocracyCancelled
            }
            SubstrateEventData::DemocracyExecuted { .. } => SubstrateEventKind::DemocracyExecuted,
            SubstrateEventData::PreimageNoted { .. } => SubstrateEventKind::PreimageNoted,
            SubstrateEventData::PreimageUsed { .. } => SubstrateEventKind::PreimageUsed,
            SubstrateEventData::PreimageInvalid { .. } => SubstrateEventKind::PreimageInvalid,
            SubstrateEventData::PreimageReaped { .. } => SubstrateEventKind::PreimageReaped,
            SubstrateEventData::TreasuryProposed { .. } => SubstrateEventKind::TreasuryProposed,
            SubstrateEventData::TreasuryAwarded { .. } => SubstrateEventKind::TreasuryAwarded,
            SubstrateEventData::TreasuryRejected { .. } => SubstrateEventKind::TreasuryRejected,
            SubstrateEventData::CollectiveProposed { .. } => {
                SubstrateEventKind::CollectiveProposed
            }
            SubstrateEventData::CollectiveVoted { .. } => SubstrateEventKind::CollectiveVoted,
            SubstrateEventData::CollectiveApproved { .. } => {
                SubstrateEventKind::CollectiveApproved
            }
            SubstrateEventData::CollectiveDisapproved { .. } => {
                SubstrateEventKind::CollectiveDisapproved
            }
            SubstrateEventData::CollectiveExecuted { .. } => {
                SubstrateEventKind::CollectiveExecuted
            }
        }
    }

    fn classify(kind: SubstrateEventKind) -> Option<(SubstrateEntityKind, Lifecycle)> {
        use SubstrateEntityKind as Entity;
        use SubstrateEventKind as Kind;
        match kind {
            Kind::DemocracyProposed => Some((Entity::DemocracyProposal, Lifecycle::Create)),
            Kind::DemocracyTabled => Some((Entity::DemocracyProposal, Lifecycle::Complete)),
            Kind::DemocracyStarted => Some((Entity::DemocracyReferendum, Lifecycle::Create)),
            Kind::DemocracyVoted | Kind::DemocracyPassed => {
                Some((Entity::DemocracyReferendum, Lifecycle::Update))
            }
            Kind::DemocracyNotPassed | Kind::DemocracyCancelled | Kind::DemocracyExecuted => {
                Some((Entity::DemocracyReferendum, Lifecycle::Complete))
            }
            Kind::PreimageNoted => Some((Entity::DemocracyPreimage, Lifecycle::Create)),
            Kind::PreimageUsed | Kind::PreimageInvalid | Kind::PreimageReaped => {
                Some((Entity::DemocracyPreimage, Lifecycle::Complete))
            }
            Kind::TreasuryProposed => Some((Entity::TreasuryProposal, Lifecycle::Create)),
            Kind::TreasuryAwarded | Kind::TreasuryRejected => {
                Some((Entity::TreasuryProposal, Lifecycle::Complete))
            }
            Kind::CollectiveProposed => Some((Entity::CollectiveProposal, Lifecycle::Create)),
            Kind::CollectiveVoted | Kind::CollectiveApproved => {
                Some((Entity::CollectiveProposal, Lifecycle::Update))
            }
            Kind::CollectiveDisapproved | Kind::CollectiveExecuted => {
                Some((Entity::CollectiveProposal, Lifecycle::Complete))
            }
        }
    }
}
