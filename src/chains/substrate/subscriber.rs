use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{SubstrateApi, SubstrateBlock};
use crate::{error::ApiError, interfaces::Subscriber};

const FEED_BUFFER: usize = 1024;

/// Live block feed for a Substrate chain.
///
/// Resolves the runtime version before the first block is delivered and
/// stamps it onto blocks the transport leaves unversioned, so the processor
/// always has version context.
pub struct SubstrateSubscriber {
    api: Arc<dyn SubstrateApi>,
    active: bool,
}

impl SubstrateSubscriber {
    pub fn new(api: Arc<dyn SubstrateApi>) -> Self {
        Self { api, active: false }
    }
}

#[async_trait]
impl Subscriber for SubstrateSubscriber {
    type Raw = SubstrateBlock;

    async fn subscribe(&mut self) -> Result<mpsc::Receiver<SubstrateBlock>, ApiError> {
        let spec_version = self.api.runtime_version().await?;
        info!(spec_version, "subscribing to block feed");

        let mut upstream = self.api.subscribe_blocks().await?;
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        tokio::spawn(async move {
            while let Some(mut block) = upstream.recv().await {
                if block.spec_version.is_none() {
                    block.spec_version = Some(spec_version);
                }
                if tx.send(block).await.is_err() {
                    debug!("block feed receiver dropped, stopping forwarder");
                    break;
                }
            }
        });
        self.active = true;
        Ok(rx)
    }

    fn unsubscribe(&mut self) {
        if !self.active {
            warn!("no active block subscription");
            return;
        }
        self.api.unsubscribe_blocks();
        self.active = false;
    }
}
