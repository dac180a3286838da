//! The Substrate chain family: runtime-event governance.
//!
//! Covers the democracy, preimage, treasury and collective modules. Raw
//! input is a decoded block of runtime events plus extrinsics; the processor
//! enriches each through read-only storage queries on the injected
//! [`SubstrateApi`] handle.

mod enricher;
mod processor;
mod storage_fetcher;
mod subscriber;
mod types;

pub use enricher::SubstrateEnricher;
pub use processor::SubstrateProcessor;
pub use storage_fetcher::SubstrateStorageFetcher;
pub use subscriber::SubstrateSubscriber;
pub use types::{CallDescription, SubstrateEntityKind, SubstrateEventData, SubstrateEventKind};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    error::ApiError,
    interfaces::{ApiConnector, ChainFamily},
    types::RawRecord,
};

/// The two chambers whose proposals are tracked.
pub const COLLECTIVES: [&str; 2] = ["council", "technicalCommittee"];

/// One decoded block off the live feed.
#[derive(Clone, Debug, PartialEq)]
pub struct SubstrateBlock {
    pub number: u64,
    /// Runtime spec version the block was authored under. The subscriber
    /// stamps this when the feed leaves it out.
    pub spec_version: Option<u32>,
    pub events: Vec<SubstrateRuntimeEvent>,
    pub extrinsics: Vec<SubstrateExtrinsic>,
}

impl RawRecord for SubstrateBlock {
    fn block_number(&self) -> u64 {
        self.number
    }
}

/// A runtime event as decoded off the chain, before enrichment.
///
/// Carries only the fields the runtime emits; everything else the canonical
/// payload needs comes from storage queries. Events from modules this crate
/// does not track decode to `Unknown`.
#[derive(Clone, Debug, PartialEq)]
pub enum SubstrateRuntimeEvent {
    DemocracyProposed { proposal_index: u32, deposit: u128 },
    DemocracyTabled { proposal_index: u32 },
    DemocracyStarted { referendum_index: u32, vote_threshold: String },
    DemocracyPassed { referendum_index: u32 },
    DemocracyNotPassed { referendum_index: u32 },
    DemocracyCancelled { referendum_index: u32 },
    DemocracyExecuted { referendum_index: u32, execution_ok: bool },
    PreimageNoted { proposal_hash: String, noter: String },
    PreimageUsed { proposal_hash: String, noter: String },
    PreimageInvalid { proposal_hash: String, referendum_index: u32 },
    PreimageReaped { proposal_hash: String, noter: String, reaper: String },
    TreasuryProposed { proposal_index: u32 },
    TreasuryAwarded { proposal_index: u32, award: u128, beneficiary: String },
    TreasuryRejected { proposal_index: u32 },
    CollectiveProposed {
        collective_name: String,
        proposer: String,
        proposal_index: u32,
        proposal_hash: String,
        threshold: u32,
    },
    CollectiveVoted { collective_name: String, proposal_hash: String, voter: String, vote: bool },
    CollectiveApproved { collective_name: String, proposal_hash: String },
    CollectiveDisapproved { collective_name: String, proposal_hash: String },
    CollectiveExecuted { collective_name: String, proposal_hash: String, execution_ok: bool },
    Unknown,
}

/// An extrinsic included in a block, with its dispatch outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct SubstrateExtrinsic {
    pub success: bool,
    pub call: SubstrateCall,
}

/// Calls tracked from the extrinsic stream rather than the event stream.
#[derive(Clone, Debug, PartialEq)]
pub enum SubstrateCall {
    /// `democracy.vote`; the only call that produces a canonical event.
    DemocracyVote {
        voter: String,
        referendum_index: u32,
        is_aye: bool,
        conviction: u8,
        balance: u128,
    },
    Other,
}

/// A democracy public proposal as read from `publicProps`.
#[derive(Clone, Debug, PartialEq)]
pub struct PublicProposal {
    pub index: u32,
    pub hash: String,
    pub proposer: String,
}

/// Deposit backing a public proposal.
#[derive(Clone, Debug, PartialEq)]
pub struct DepositInfo {
    pub balance: u128,
    pub depositors: Vec<String>,
}

/// An ongoing referendum's storage record.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferendumInfo {
    pub index: u32,
    pub proposal_hash: String,
    pub vote_threshold: String,
    pub end_block: u64,
}

/// A passed referendum awaiting dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchEntry {
    pub referendum_index: u32,
    pub proposal_hash: String,
    pub dispatch_block: u64,
}

/// A noted preimage's storage record.
#[derive(Clone, Debug, PartialEq)]
pub struct PreimageRecord {
    pub noter: String,
    /// Block the preimage was noted at.
    pub at_block: u64,
    pub call: types::CallDescription,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreasuryProposalRecord {
    pub proposer: String,
    pub value: u128,
    pub beneficiary: String,
    pub bond: u128,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollectiveProposalRecord {
    pub index: u32,
    pub threshold: u32,
    pub call: types::CallDescription,
}

/// Recorded votes on a collective proposal.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectiveVotesRecord {
    pub ayes: Vec<String>,
    pub nays: Vec<String>,
}

/// The injected Substrate node surface.
///
/// Reduced to exactly the storage items and subscriptions the family
/// queries; the transport behind it is out of scope.
#[async_trait]
pub trait SubstrateApi: Send + Sync {
    async fn runtime_version(&self) -> Result<u32, ApiError>;
    async fn best_block_number(&self) -> Result<u64, ApiError>;

    /// Opens the live block feed. The sending half stays with the transport;
    /// [`unsubscribe_blocks`](Self::unsubscribe_blocks) closes it.
    async fn subscribe_blocks(&self) -> Result<mpsc::Receiver<SubstrateBlock>, ApiError>;
    fn unsubscribe_blocks(&self);

    async fn public_props(&self) -> Result<Vec<PublicProposal>, ApiError>;
    async fn deposit_of(&self, proposal_index: u32) -> Result<Option<DepositInfo>, ApiError>;
    async fn referendum_info(&self, referendum_index: u32)
        -> Result<Option<ReferendumInfo>, ApiError>;
    async fn active_referenda(&self) -> Result<Vec<ReferendumInfo>, ApiError>;
    async fn dispatch_queue(&self) -> Result<Vec<DispatchEntry>, ApiError>;
    async fn preimage(&self, proposal_hash: &str) -> Result<Option<PreimageRecord>, ApiError>;

    async fn treasury_proposal_count(&self) -> Result<u32, ApiError>;
    /// Indices of proposals already approved for payout.
    async fn treasury_approvals(&self) -> Result<Vec<u32>, ApiError>;
    async fn treasury_proposal(
        &self,
        proposal_index: u32,
    ) -> Result<Option<TreasuryProposalRecord>, ApiError>;

    async fn collective_proposals(&self, collective: &str) -> Result<Vec<String>, ApiError>;
    async fn collective_proposal_of(
        &self,
        collective: &str,
        proposal_hash: &str,
    ) -> Result<Option<CollectiveProposalRecord>, ApiError>;
    async fn collective_votes(
        &self,
        collective: &str,
        proposal_hash: &str,
    ) -> Result<Option<CollectiveVotesRecord>, ApiError>;
}

/// Connection parameters for a Substrate listener.
#[derive(Clone)]
pub struct SubstrateConfig {
    pub url: String,
    pub connector: Arc<dyn ApiConnector<Arc<dyn SubstrateApi>>>,
}

/// The Substrate [`ChainFamily`].
pub struct Substrate;

#[async_trait]
impl ChainFamily for Substrate {
    type Api = Arc<dyn SubstrateApi>;
    type Config = SubstrateConfig;
    type Raw = SubstrateBlock;
    type Data = SubstrateEventData;
    type Subscriber = SubstrateSubscriber;
    type Processor = SubstrateProcessor;
    type Fetcher = SubstrateStorageFetcher;

    const NETWORK: &'static str = "substrate";

    async fn connect(config: &SubstrateConfig) -> Result<Self::Api, ApiError> {
        config.connector.connect().await
    }

    fn subscriber(api: &Self::Api) -> SubstrateSubscriber {
        SubstrateSubscriber::new(Arc::clone(api))
    }

    fn processor(api: &Self::Api) -> SubstrateProcessor {
        SubstrateProcessor::new(Arc::clone(api))
    }

    fn storage_fetcher(api: &Self::Api) -> SubstrateStorageFetcher {
        SubstrateStorageFetcher::new(Arc::clone(api))
    }
}
