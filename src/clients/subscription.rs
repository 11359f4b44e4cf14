use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn, Instrument};

use crate::domain::RideSnapshot;
use crate::mirror::{MirrorClient, MirrorSubscription, SubscriptionId};
use crate::ride_actor::RideError;

/// Detachable token for a live ride listener.
///
/// Once [`SubscriptionHandle::unsubscribe`] returns, the callback has
/// finished any in-progress call and will never run again. Dropping the
/// handle also detaches the listener, without waiting.
pub struct SubscriptionHandle {
    ride_id: String,
    id: SubscriptionId,
    mirror: MirrorClient,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub(crate) fn spawn<F>(
        ride_id: String,
        mirror: MirrorClient,
        subscription: MirrorSubscription,
        mut on_update: F,
    ) -> Self
    where
        F: FnMut(RideSnapshot) + Send + 'static,
    {
        let MirrorSubscription { id, mut receiver } = subscription;
        let (stop, mut stopped) = oneshot::channel::<()>();

        let span = tracing::debug_span!("ride_listener", ride_id = %ride_id, listener = id.0);
        let task = tokio::spawn(
            async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = &mut stopped => break,
                        next = receiver.recv() => {
                            let Some(value) = next else { break };
                            match RideSnapshot::from_value(value) {
                                Ok(snapshot) => on_update(snapshot),
                                Err(e) => warn!(error = %e, "Skipping undecodable live ride"),
                            }
                        }
                    }
                }
                debug!("Listener task finished");
            }
            .instrument(span),
        );

        Self {
            ride_id,
            id,
            mirror,
            stop: Some(stop),
            task: Some(task),
        }
    }

    pub fn ride_id(&self) -> &str {
        &self.ride_id
    }

    pub fn is_active(&self) -> bool {
        self.stop.is_some()
    }

    /// Detach the listener. Calling it again is a no-op.
    pub async fn unsubscribe(&mut self) -> Result<(), RideError> {
        let Some(stop) = self.stop.take() else {
            return Ok(());
        };
        let _ = stop.send(());
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(ride_id = %self.ride_id, error = %e, "Listener task ended abnormally");
            }
        }
        self.mirror
            .unsubscribe(self.id)
            .await
            .map_err(|e| RideError::ActorCommunicationError(e.to_string()))
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
            if !self.mirror.unsubscribe_detached(self.id) {
                debug!(ride_id = %self.ride_id, "Mirror busy, listener left for pruning");
            }
        }
    }
}
