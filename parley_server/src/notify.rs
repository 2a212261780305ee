use std::collections::HashMap;

use parley_entities::{prelude::{AgreementConflict, NegotiationResult}, Uuid};
use serde::{Serialize, Deserialize};
use tokio::{sync::{broadcast::{Receiver, Sender}, watch, Mutex}, task::JoinHandle};
use tokio_stream::wrappers::WatchStream;


/// Published whenever a result record of a round was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultUpdate {
    pub event_id: Uuid,
    pub round: u32,
    pub team_id: Uuid,
    pub result_id: Uuid,
}

/// One broadcast channel per (event, round).
pub struct ResultNotificationManager {
    round_senders: Mutex<HashMap<(Uuid, u32), Sender<ResultUpdate>>>,
    capacity: usize,
}

impl ResultNotificationManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            round_senders: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn subscribe_to_round(&self, event_id: Uuid, round: u32) -> Receiver<ResultUpdate> {
        let mut senders = self.round_senders.lock().await;
        senders
            .entry((event_id, round))
            .or_insert_with(|| Sender::new(self.capacity))
            .subscribe()
    }

    pub async fn publish(&self, update: ResultUpdate) {
        let mut senders = self.round_senders.lock().await;
        let key = (update.event_id, update.round);
        if let Some(sender) = senders.get(&key) {
            // Nobody listening anymore
            if sender.send(update).is_err() {
                senders.remove(&key);
            }
        }
    }
}

/// Live view of one team's and its opponents' results for a round.
///
/// Dropping the subscription stops the task that keeps it current.
pub struct ResultSubscription {
    agreements: watch::Receiver<Vec<NegotiationResult>>,
    conflicts: watch::Receiver<Vec<AgreementConflict>>,
    pump: JoinHandle<()>,
}

impl ResultSubscription {
    pub(crate) fn new(
        agreements: watch::Receiver<Vec<NegotiationResult>>,
        conflicts: watch::Receiver<Vec<AgreementConflict>>,
        pump: JoinHandle<()>,
    ) -> Self {
        ResultSubscription { agreements, conflicts, pump }
    }

    /// Current results first, then every changed snapshot.
    pub fn on_agreements(&self) -> WatchStream<Vec<NegotiationResult>> {
        WatchStream::new(self.agreements.clone())
    }

    pub fn on_conflicts(&self) -> WatchStream<Vec<AgreementConflict>> {
        WatchStream::new(self.conflicts.clone())
    }

    pub fn agreements_receiver(&self) -> watch::Receiver<Vec<NegotiationResult>> {
        self.agreements.clone()
    }

    pub fn conflicts_receiver(&self) -> watch::Receiver<Vec<AgreementConflict>> {
        self.conflicts.clone()
    }

    /// Stops the updates. Receivers handed out earlier see their channels close.
    pub fn unsubscribe(self) {
        self.pump.abort();
    }
}

impl Drop for ResultSubscription {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
