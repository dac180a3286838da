//! The Aave chain family: governance-module and token logs on an EVM chain.

mod enricher;
mod processor;
mod storage_fetcher;
mod subscriber;
mod types;

pub use enricher::AaveEnricher;
pub use processor::AaveProcessor;
pub use storage_fetcher::AaveStorageFetcher;
pub use subscriber::AaveSubscriber;
pub use types::{AaveEntityKind, AaveEventData, AaveEventKind};

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    error::ApiError,
    interfaces::{ApiConnector, ChainFamily},
    types::RawRecord,
};

/// One decoded log off the live feed.
#[derive(Clone, Debug, PartialEq)]
pub struct AaveRawLog {
    pub block_number: u64,
    pub payload: AaveLogPayload,
}

impl RawRecord for AaveRawLog {
    fn block_number(&self) -> u64 {
        self.block_number
    }
}

/// Decoded governance and token log bodies, raw EVM field types intact.
/// Logs from other contracts or topics decode to `Unknown`.
#[derive(Clone, Debug, PartialEq)]
pub enum AaveLogPayload {
    ProposalCreated {
        id: U256,
        creator: Address,
        executor: Address,
        targets: Vec<Address>,
        values: Vec<U256>,
        signatures: Vec<String>,
        calldatas: Vec<Bytes>,
        start_block: U256,
        end_block: U256,
        strategy: Address,
        ipfs_hash: B256,
    },
    VoteEmitted {
        id: U256,
        voter: Address,
        support: bool,
        voting_power: U256,
    },
    ProposalQueued {
        id: U256,
        execution_time: U256,
    },
    ProposalExecuted {
        id: U256,
    },
    ProposalCanceled {
        id: U256,
    },
    DelegateChanged {
        token: Address,
        delegator: Address,
        delegatee: Address,
    },
    DelegatedPowerChanged {
        token: Address,
        user: Address,
        amount: U256,
    },
    Transfer {
        token: Address,
        from: Address,
        to: Address,
        value: U256,
    },
    Unknown,
}

/// A governance proposal's storage record, as returned by `getProposalById`.
#[derive(Clone, Debug, PartialEq)]
pub struct AaveProposal {
    pub id: u32,
    pub creator: Address,
    pub executor: Address,
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<Bytes>,
    pub start_block: u64,
    pub end_block: u64,
    /// Zero until the proposal is queued.
    pub execution_time: u64,
    pub strategy: Address,
    pub ipfs_hash: B256,
    pub canceled: bool,
    pub executed: bool,
}

/// The injected Aave governance surface.
#[async_trait]
pub trait AaveApi: Send + Sync {
    async fn current_block(&self) -> Result<u64, ApiError>;
    async fn proposal_count(&self) -> Result<u32, ApiError>;
    async fn proposal_by_id(&self, id: u32) -> Result<Option<AaveProposal>, ApiError>;

    /// Opens the live log feed. The sending half stays with the transport;
    /// [`unsubscribe_logs`](Self::unsubscribe_logs) closes it.
    async fn subscribe_logs(&self) -> Result<mpsc::Receiver<AaveRawLog>, ApiError>;
    fn unsubscribe_logs(&self);
}

/// Connection parameters for an Aave listener.
#[derive(Clone)]
pub struct AaveConfig {
    /// The governance contract the listener watches.
    pub contract_address: Address,
    pub connector: Arc<dyn ApiConnector<Arc<dyn AaveApi>>>,
}

/// The Aave [`ChainFamily`].
pub struct Aave;

#[async_trait]
impl ChainFamily for Aave {
    type Api = Arc<dyn AaveApi>;
    type Config = AaveConfig;
    type Raw = AaveRawLog;
    type Data = AaveEventData;
    type Subscriber = AaveSubscriber;
    type Processor = AaveProcessor;
    type Fetcher = AaveStorageFetcher;

    const NETWORK: &'static str = "aave";

    async fn connect(config: &AaveConfig) -> Result<Self::Api, ApiError> {
        config.connector.connect().await
    }

    fn subscriber(api: &Self::Api) -> AaveSubscriber {
        AaveSubscriber::new(Arc::clone(api))
    }

    fn processor(_api: &Self::Api) -> AaveProcessor {
        AaveProcessor::new()
    }

    fn storage_fetcher(api: &Self::Api) -> AaveStorageFetcher {
        AaveStorageFetcher::new(Arc::clone(api))
    }
}
