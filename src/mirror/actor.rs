use std::collections::HashMap;

use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use super::error::MirrorError;

pub type MirrorResponse<T> = oneshot::Sender<Result<T, MirrorError>>;

/// Identifies one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Debug)]
pub enum MirrorRequest {
    Set {
        path: String,
        value: Value,
        respond_to: MirrorResponse<()>,
    },
    Update {
        path: String,
        partial: Map<String, Value>,
        respond_to: MirrorResponse<()>,
    },
    Get {
        path: String,
        respond_to: MirrorResponse<Option<Value>>,
    },
    List {
        prefix: String,
        respond_to: MirrorResponse<Vec<(String, Value)>>,
    },
    Subscribe {
        path: String,
        sink: mpsc::UnboundedSender<Value>,
        respond_to: MirrorResponse<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        respond_to: MirrorResponse<()>,
    },
}

struct Listener {
    path: String,
    sink: mpsc::UnboundedSender<Value>,
}

/// In-memory realtime store.
///
/// Requests are handled one at a time, so the order in which writes are
/// applied is also the order in which listeners see them.
pub struct MirrorActor {
    receiver: mpsc::Receiver<MirrorRequest>,
    values: HashMap<String, Value>,
    listeners: HashMap<SubscriptionId, Listener>,
    next_listener: u64,
}

impl MirrorActor {
    pub fn new(buffer_size: usize) -> (Self, MirrorClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            values: HashMap::new(),
            listeners: HashMap::new(),
            next_listener: 1,
        };
        (actor, MirrorClient::new(sender))
    }

    #[instrument(name = "mirror", skip(self))]
    pub async fn run(mut self) {
        info!("Mirror starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                MirrorRequest::Set { path, value, respond_to } => {
                    debug!(path = %path, "Processing set request");
                    self.values.insert(path.clone(), value);
                    self.publish(&path);
                    let _ = respond_to.send(Ok(()));
                }
                MirrorRequest::Update { path, partial, respond_to } => {
                    let result = self.handle_update(&path, partial);
                    if result.is_ok() {
                        self.publish(&path);
                    }
                    let _ = respond_to.send(result);
                }
                MirrorRequest::Get { path, respond_to } => {
                    let _ = respond_to.send(Ok(self.values.get(&path).cloned()));
                }
                MirrorRequest::List { prefix, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_list(&prefix)));
                }
                MirrorRequest::Subscribe { path, sink, respond_to } => {
                    let id = SubscriptionId(self.next_listener);
                    self.next_listener += 1;
                    debug!(path = %path, listener = id.0, "Listener registered");
                    self.listeners.insert(id, Listener { path, sink });
                    let _ = respond_to.send(Ok(id));
                }
                MirrorRequest::Unsubscribe { id, respond_to } => {
                    if self.listeners.remove(&id).is_some() {
                        debug!(listener = id.0, "Listener removed");
                    }
                    let _ = respond_to.send(Ok(()));
                }
            }
        }
        info!("Mirror stopped");
    }

    /// Merge top-level keys into the object stored at `path`.
    fn handle_update(&mut self, path: &str, partial: Map<String, Value>) -> Result<(), MirrorError> {
        let current = self
            .values
            .get_mut(path)
            .ok_or_else(|| MirrorError::NotFound(path.to_string()))?;
        let Value::Object(fields) = current else {
            warn!(path = %path, "Partial update against a non-object value");
            return Err(MirrorError::Rejected(format!("{} is not an object", path)));
        };
        for (key, value) in partial {
            fields.insert(key, value);
        }
        Ok(())
    }

    fn handle_list(&self, prefix: &str) -> Vec<(String, Value)> {
        let scope = format!("{}/", prefix);
        let mut entries: Vec<(String, Value)> = self
            .values
            .iter()
            .filter(|(path, _)| path.starts_with(&scope))
            .map(|(path, value)| (path.clone(), value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Push the current value at `path` to every listener on it, pruning
    /// listeners whose receiving side has gone away.
    fn publish(&mut self, path: &str) {
        let Some(value) = self.values.get(path) else {
            return;
        };
        let mut gone = Vec::new();
        for (id, listener) in &self.listeners {
            if listener.path == path && listener.sink.send(value.clone()).is_err() {
                gone.push(*id);
            }
        }
        for id in gone {
            debug!(listener = id.0, "Pruning closed listener");
            self.listeners.remove(&id);
        }
    }
}

/// Raw subscription on one mirror path.
///
/// Yields the full value at the path after each write.
#[derive(Debug)]
pub struct MirrorSubscription {
    pub id: SubscriptionId,
    pub receiver: mpsc::UnboundedReceiver<Value>,
}

#[derive(Clone)]
pub struct MirrorClient {
    sender: mpsc::Sender<MirrorRequest>,
}

impl MirrorClient {
    pub fn new(sender: mpsc::Sender<MirrorRequest>) -> Self {
        Self { sender }
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(MirrorResponse<R>) -> MirrorRequest,
    ) -> Result<R, MirrorError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| MirrorError::ActorClosed)?;
        response.await.map_err(|_| MirrorError::ActorDropped)?
    }

    #[instrument(skip(self, value))]
    pub async fn set(&self, path: String, value: Value) -> Result<(), MirrorError> {
        debug!("Sending request");
        self.call(|respond_to| MirrorRequest::Set { path, value, respond_to }).await
    }

    #[instrument(skip(self, partial))]
    pub async fn update(&self, path: String, partial: Map<String, Value>) -> Result<(), MirrorError> {
        debug!("Sending request");
        self.call(|respond_to| MirrorRequest::Update { path, partial, respond_to }).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, path: String) -> Result<Option<Value>, MirrorError> {
        debug!("Sending request");
        self.call(|respond_to| MirrorRequest::Get { path, respond_to }).await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, prefix: String) -> Result<Vec<(String, Value)>, MirrorError> {
        debug!("Sending request");
        self.call(|respond_to| MirrorRequest::List { prefix, respond_to }).await
    }

    #[instrument(skip(self))]
    pub async fn subscribe(&self, path: String) -> Result<MirrorSubscription, MirrorError> {
        debug!("Sending request");
        let (sink, receiver) = mpsc::unbounded_channel();
        let id = self
            .call(|respond_to| MirrorRequest::Subscribe { path, sink, respond_to })
            .await?;
        Ok(MirrorSubscription { id, receiver })
    }

    #[instrument(skip(self))]
    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), MirrorError> {
        debug!("Sending request");
        self.call(|respond_to| MirrorRequest::Unsubscribe { id, respond_to }).await
    }

    /// Queue an unsubscribe without waiting for it, for use where awaiting
    /// is impossible (e.g. `Drop`). Returns `false` if the request could not
    /// be queued; the listener is then pruned on the next write to its path.
    pub fn unsubscribe_detached(&self, id: SubscriptionId) -> bool {
        let (respond_to, _) = oneshot::channel();
        self.sender
            .try_send(MirrorRequest::Unsubscribe { id, respond_to })
            .is_ok()
    }
}
