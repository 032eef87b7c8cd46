use crate::pool::TxEntry;
use std::sync::Arc;
use tokio::sync::broadcast;

/// what the pool tells the relay and the other subscribers
#[derive(Debug, Clone)]
pub enum TxPoolEvent {
    /// the transaction was admitted in the pool and can be relayed
    TransactionAccepted(Arc<TxEntry>),
}

pub(crate) struct Notifier {
    sender: broadcast::Sender<TxPoolEvent>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TxPoolEvent> {
        self.sender.subscribe()
    }

    /// publish the event, a missing subscriber is not an error for the pool
    pub fn notify(&self, event: TxPoolEvent) {
        if let Err(error) = self.sender.send(event) {
            tracing::debug!(%error, "no subscriber for the pool event");
        }
    }
}
