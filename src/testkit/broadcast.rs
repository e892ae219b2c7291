//! Broadcasters that record or reject updates.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::BroadcastError;
use crate::port::{Broadcaster, PriceUpdate};

/// Keeps every published update in order.
#[derive(Default)]
pub struct RecordingBroadcaster {
    updates: Mutex<Vec<PriceUpdate>>,
}

impl RecordingBroadcaster {
    pub fn updates(&self) -> Vec<PriceUpdate> {
        self.updates.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.updates.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.lock().is_empty()
    }

    pub fn clear(&self) {
        self.updates.lock().clear();
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn publish(&self, update: &PriceUpdate) -> Result<(), BroadcastError> {
        self.updates.lock().push(update.clone());
        Ok(())
    }
}

/// Rejects every publish.
pub struct FailingBroadcaster;

#[async_trait]
impl Broadcaster for FailingBroadcaster {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn check(&self) -> Result<(), BroadcastError> {
        Err(BroadcastError::Rejected {
            channel: "-".into(),
            reason: "broadcaster offline".into(),
        })
    }

    async fn publish(&self, update: &PriceUpdate) -> Result<(), BroadcastError> {
        Err(BroadcastError::Rejected {
            channel: update.channel(),
            reason: "broadcaster offline".into(),
        })
    }
}
