use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use super::{SubstrateApi, SubstrateBlock, SubstrateCall, SubstrateEnricher, SubstrateEventData};
use crate::{interfaces::Processor, types::ChainEvent};

/// Turns one decoded block into canonical events.
///
/// Enrichment failures drop the individual record and the batch continues.
/// Votes arrive as extrinsics rather than runtime events; only extrinsics
/// that dispatched successfully are considered.
pub struct SubstrateProcessor {
    enricher: SubstrateEnricher,
}

impl SubstrateProcessor {
    pub fn new(api: Arc<dyn SubstrateApi>) -> Self {
        Self { enricher: SubstrateEnricher::new(api) }
    }
}

#[async_trait]
impl Processor for SubstrateProcessor {
    type Raw = SubstrateBlock;
    type Data = SubstrateEventData;

    async fn process(&self, block: SubstrateBlock) -> Vec<ChainEvent<SubstrateEventData>> {
        debug!(
            block = block.number,
            spec_version = ?block.spec_version,
            events = block.events.len(),
            "processing block"
        );

        let mut out = Vec::new();
        for event in &block.events {
            match self.enricher.enrich(block.number, event).await {
                Ok(Some(event)) => out.push(event),
                Ok(None) => {}
                Err(err) => {
                    error!(block = block.number, error = %err, "failed to enrich event, dropping");
                }
            }
        }

        for extrinsic in &block.extrinsics {
            if !extrinsic.success {
                continue;
            }
            if let SubstrateCall::DemocracyVote {
                voter,
                referendum_index,
                is_aye,
                conviction,
                balance,
            } = &extrinsic.call
            {
                out.push(
                    ChainEvent::new(
                        block.number,
                        SubstrateEventData::DemocracyVoted {
                            referendum_index: *referendum_index,
                            who: voter.clone(),
                            is_aye: *is_aye,
                            conviction: *conviction,
                            balance: balance.to_string(),
                        },
                    )
                    .excluding(vec![voter.clone()]),
                );
            }
        }
        out
    }
}
