use parley_entities::{
    finalize::{FinalizationCoordinator, FinalizationEvent},
    prelude::NegotiationResult,
    Uuid,
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info};

use crate::{notify::ResultSubscription, service::ResultService};


/// Runs a `FinalizationCoordinator` against a live subscription and executes its commands.
///
/// The watcher stops when it is dropped.
pub struct FinalizationWatcher {
    task: JoinHandle<()>,
}

fn agreements_event(snapshot: &[NegotiationResult], own_id: Uuid, opponent_id: Uuid) -> FinalizationEvent {
    FinalizationEvent::AgreementsUpdated {
        own: snapshot.iter().find(|r| r.team_id == own_id).cloned(),
        opponent: snapshot.iter().find(|r| r.team_id == opponent_id).cloned(),
    }
}

impl FinalizationWatcher {
    pub fn spawn(service: ResultService, subscription: &ResultSubscription, mut coordinator: FinalizationCoordinator, own_id: Uuid, opponent_id: Uuid) -> Self {
        let mut agreements = subscription.agreements_receiver();
        let mut conflicts = subscription.conflicts_receiver();

        let task = tokio::spawn(async move {
            let (done_tx, mut done_rx) = mpsc::channel::<bool>(1);

            let mut pending = vec![
                FinalizationEvent::ConflictsUpdated(conflicts.borrow_and_update().clone()),
                agreements_event(&agreements.borrow_and_update(), own_id, opponent_id),
            ];

            loop {
                for event in pending.drain(..) {
                    if let Some(command) = coordinator.handle(event) {
                        info!("Finalizing round {} for team {}", command.round, command.team_id);
                        let service = service.clone();
                        let done_tx = done_tx.clone();
                        tokio::spawn(async move {
                            let success = match service.finalize(&command).await {
                                Ok(_) => true,
                                Err(e) => {
                                    error!("Failed to finalize round {} for team {}: {}", command.round, command.team_id, e);
                                    false
                                }
                            };
                            let _ = done_tx.send(success).await;
                        });
                    }
                }

                let event = tokio::select! {
                    changed = agreements.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let event = agreements_event(&agreements.borrow_and_update(), own_id, opponent_id);
                        event
                    },
                    changed = conflicts.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let event = FinalizationEvent::ConflictsUpdated(conflicts.borrow_and_update().clone());
                        event
                    },
                    Some(success) = done_rx.recv() => FinalizationEvent::FinalizeCompleted { success },
                };
                pending.push(event);
            }
            debug!("Finalization watcher for team {} stopped", own_id);
        });

        FinalizationWatcher { task }
    }
}

impl Drop for FinalizationWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
