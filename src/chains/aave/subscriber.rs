use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{AaveApi, AaveRawLog};
use crate::{error::ApiError, interfaces::Subscriber};

/// Live governance and token log feed for an Aave deployment.
pub struct AaveSubscriber {
    api: Arc<dyn AaveApi>,
    active: bool,
}

impl AaveSubscriber {
    pub fn new(api: Arc<dyn AaveApi>) -> Self {
        Self { api, active: false }
    }
}

#[async_trait]
impl Subscriber for AaveSubscriber {
    type Raw = AaveRawLog;

    async fn subscribe(&mut self) -> Result<mpsc::Receiver<AaveRawLog>, ApiError> {
        info!("subscribing to governance log feed");
        let feed = self.api.subscribe_logs().await?;
        self.active = true;
        Ok(feed)
    }

    fn unsubscribe(&mut self) {
        if !self.active {
            warn!("no active log subscription");
            return;
        }
        self.api.unsubscribe_logs();
        self.active = false;
    }
}
