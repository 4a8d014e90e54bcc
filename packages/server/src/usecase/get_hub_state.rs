//! UseCase: ハブ状態取得（デバッグ用）

use std::sync::Arc;

use crate::domain::{HubSnapshot, MessageBroker};

use super::error::ServiceError;

pub struct GetHubStateUseCase {
    broker: Arc<dyn MessageBroker>,
}

impl GetHubStateUseCase {
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker }
    }

    pub async fn execute(&self) -> Result<HubSnapshot, ServiceError> {
        Ok(self.broker.snapshot().await?)
    }
}
