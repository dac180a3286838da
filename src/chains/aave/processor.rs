use async_trait::async_trait;

use super::{AaveEnricher, AaveEventData, AaveRawLog};
use crate::{interfaces::Processor, types::ChainEvent};

/// Turns one decoded log into at most one canonical event.
pub struct AaveProcessor {
    enricher: AaveEnricher,
}

impl AaveProcessor {
    pub fn new() -> Self {
        Self { enricher: AaveEnricher }
    }
}

impl Default for AaveProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Processor for AaveProcessor {
    type Raw = AaveRawLog;
    type Data = AaveEventData;

    async fn process(&self, raw: AaveRawLog) -> Vec<ChainEvent<AaveEventData>> {
        self.enricher
            .enrich(raw.block_number, &raw.payload)
            .into_iter()
            .collect()
    }
}
