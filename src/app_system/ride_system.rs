use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use super::config::AppConfig;
use super::reconciler::Reconciler;
use crate::actor_framework::{ResourceActor, ResourceClient};
use crate::clients::{ProfileClient, RideLifecycleSync};
use crate::domain::{Ride, RiderProfile};
use crate::mirror::{MirrorActor, MirrorClient};

/// Starts the store actors and wires the clients on top of them.
///
/// The raw store clients are exposed as well; the matching process (or a
/// test standing in for it) writes through them directly.
pub struct RideSystem {
    pub rides: RideLifecycleSync,
    pub profiles: ProfileClient,
    pub reconciler: Reconciler,
    pub ride_store: ResourceClient<Ride>,
    pub mirror: MirrorClient,
    pub config: AppConfig,
    reconciler_stop: Option<oneshot::Sender<()>>,
    handles: Vec<JoinHandle<()>>,
}

impl RideSystem {
    /// Spawn everything. A zero `reconcile_interval` disables the periodic
    /// sweep; [`Reconciler::reconcile_once`] can still be called by hand.
    pub fn new(config: AppConfig) -> Self {
        info!("Starting ride system");
        let next_id = || Uuid::new_v4().simple().to_string();

        // 1. Durable collections
        let (ride_actor, ride_store) = ResourceActor::<Ride>::new(config.actor_buffer, next_id);
        let (rider_actor, rider_store) = ResourceActor::<RiderProfile>::new(config.actor_buffer, next_id);

        // 2. Realtime mirror
        let (mirror_actor, mirror) = MirrorActor::new(config.actor_buffer);

        let mut handles = vec![
            tokio::spawn(ride_actor.run()),
            tokio::spawn(rider_actor.run()),
            tokio::spawn(mirror_actor.run()),
        ];

        // 3. Clients
        let rides = RideLifecycleSync::new(ride_store.clone(), mirror.clone());
        let profiles = ProfileClient::new(rider_store, config.country_code.clone());
        let reconciler = Reconciler::new(ride_store.clone(), mirror.clone());

        // 4. Periodic reconciliation
        let reconciler_stop = if config.reconcile_interval.is_zero() {
            None
        } else {
            let (stop, stopped) = oneshot::channel();
            handles.push(tokio::spawn(
                reconciler.clone().run(config.reconcile_interval, stopped),
            ));
            Some(stop)
        };

        Self {
            rides,
            profiles,
            reconciler,
            ride_store,
            mirror,
            config,
            reconciler_stop,
            handles,
        }
    }

    pub async fn shutdown(mut self) -> Result<(), String> {
        info!("Shutting down ride system...");

        // The reconciler holds store clients, so it has to stop before the
        // store channels can close.
        if let Some(stop) = self.reconciler_stop.take() {
            let _ = stop.send(());
        }

        drop(self.rides);
        drop(self.profiles);
        drop(self.reconciler);
        drop(self.ride_store);
        drop(self.mirror);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Ride system shutdown complete.");
        Ok(())
    }
}
