use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

// =============================================================================
// 1. THE ABSTRACTION (Entity trait with hooks, DTOs and queries)
// =============================================================================

/// Trait that any document kept by a [`ResourceActor`] must implement.
///
/// One actor serves one collection, so the entity type doubles as the
/// collection name in logs.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;
    type Filter: Send + Sync + Debug;
    type SortKey: Ord;

    /// Collection name, used for logging only.
    const COLLECTION: &'static str;

    fn id(&self) -> &Self::Id;

    /// Construct the full entity from the allocated id and payload.
    ///
    /// `now` is the store's clock, the equivalent of a server timestamp.
    fn from_create(
        id: Self::Id,
        payload: Self::CreatePayload,
        now: DateTime<Utc>,
    ) -> Result<Self, String>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Apply a partial update. Returning `Err` rejects the patch and leaves
    /// the stored entity untouched.
    fn on_update(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> Result<(), String>;

    // --- Query support ---

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Key used to order query results (descending).
    fn sort_key(&self) -> Self::SortKey;
}

/// Errors surfaced by the store protocol itself.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Write rejected: {0}")]
    Rejected(String),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        payload: T::CreatePayload,
        respond_to: Response<T::Id>,
    },
    Insert {
        id: T::Id,
        payload: T::CreatePayload,
        respond_to: Response<()>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Query {
        filter: T::Filter,
        limit: usize,
        respond_to: Response<Vec<T>>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-memory document store for one collection.
pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
    clock: Clock,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
            clock: Box::new(Utc::now),
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Replace the server clock, mostly so tests can control timestamps.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[instrument(name = "document_store", skip(self), fields(collection = T::COLLECTION))]
    pub async fn run(mut self) {
        info!("Document store starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { payload, respond_to } => {
                    let id = (self.next_id_fn)();
                    let _ = respond_to.send(self.handle_create(id, payload));
                }
                ResourceRequest::Insert { id, payload, respond_to } => {
                    let _ = respond_to.send(self.handle_create(id, payload).map(|_| ()));
                }
                ResourceRequest::Get { id, respond_to } => {
                    debug!(id = %id, "Processing get request");
                    let _ = respond_to.send(Ok(self.store.get(&id).cloned()));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update(id, patch));
                }
                ResourceRequest::Query { filter, limit, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_query(&filter, limit)));
                }
            }
        }
        info!("Document store stopped");
    }

    fn handle_create(&mut self, id: T::Id, payload: T::CreatePayload) -> Result<T::Id, FrameworkError> {
        let now = (self.clock)();
        let mut item = T::from_create(id.clone(), payload, now).map_err(FrameworkError::Rejected)?;
        item.on_create().map_err(FrameworkError::Rejected)?;
        self.store.insert(id.clone(), item);
        debug!(id = %id, "Document written");
        Ok(id)
    }

    fn handle_update(&mut self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError> {
        let now = (self.clock)();
        let item = self
            .store
            .get_mut(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;

        // Hooks mutate a copy so a rejected patch cannot leave half-applied fields.
        let mut updated = item.clone();
        if let Err(reason) = updated.on_update(patch, now) {
            warn!(id = %id, reason = %reason, "Update rejected");
            return Err(FrameworkError::Rejected(reason));
        }
        *item = updated.clone();
        Ok(updated)
    }

    fn handle_query(&self, filter: &T::Filter, limit: usize) -> Vec<T> {
        let mut hits: Vec<T> = self
            .store
            .values()
            .filter(|item| item.matches(filter))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        hits.truncate(limit);
        debug!(?filter, hits = hits.len(), "Query answered");
        hits
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

// Manual impl: deriving would require `T: Clone` on the handle itself.
impl<T: Entity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, payload: T::CreatePayload) -> Result<T::Id, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Create { payload, respond_to }).await
    }

    pub async fn insert(&self, id: T::Id, payload: T::CreatePayload) -> Result<(), FrameworkError> {
        self.call(|respond_to| ResourceRequest::Insert { id, payload, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    pub async fn query(&self, filter: T::Filter, limit: usize) -> Result<Vec<T>, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Query { filter, limit, respond_to }).await
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================
