//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] or [`create_mock_mirror`] to get a client and
//! the receiving end of its channel, then helpers like [`expect_create`] or
//! [`expect_mirror_set`] to assert each request and script the reply.

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::actor_framework::{Entity, Response, ResourceClient, ResourceRequest};
use crate::mirror::{MirrorClient, MirrorRequest, MirrorResponse, SubscriptionId};

/// Creates a mock store client and a receiver for asserting requests.
///
/// The test plays the store: it reads each request from the receiver and
/// answers on the enclosed `respond_to`, which makes failures and odd
/// orderings easy to stage.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Same as [`create_mock_client`] for the realtime mirror.
pub fn create_mock_mirror(buffer_size: usize) -> (MirrorClient, mpsc::Receiver<MirrorRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (MirrorClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreatePayload, Response<T::Id>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { payload, respond_to }) => Some((payload, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Patch, Response<T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Update { id, patch, respond_to }) => Some((id, patch, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next mirror message is a Set request
pub async fn expect_mirror_set(
    receiver: &mut mpsc::Receiver<MirrorRequest>,
) -> Option<(String, Value, MirrorResponse<()>)> {
    match receiver.recv().await {
        Some(MirrorRequest::Set { path, value, respond_to }) => Some((path, value, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next mirror message is an Update request
pub async fn expect_mirror_update(
    receiver: &mut mpsc::Receiver<MirrorRequest>,
) -> Option<(String, Map<String, Value>, MirrorResponse<()>)> {
    match receiver.recv().await {
        Some(MirrorRequest::Update { path, partial, respond_to }) => Some((path, partial, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next mirror message is a Get request
pub async fn expect_mirror_get(
    receiver: &mut mpsc::Receiver<MirrorRequest>,
) -> Option<(String, MirrorResponse<Option<Value>>)> {
    match receiver.recv().await {
        Some(MirrorRequest::Get { path, respond_to }) => Some((path, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next mirror message is an Unsubscribe request
pub async fn expect_mirror_unsubscribe(
    receiver: &mut mpsc::Receiver<MirrorRequest>,
) -> Option<(SubscriptionId, MirrorResponse<()>)> {
    match receiver.recv().await {
        Some(MirrorRequest::Unsubscribe { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ride, RiderCreate, RiderProfile};
    use crate::ride_actor::RideFilter;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<RiderProfile>(10);

        let create_task = tokio::spawn(async move {
            let rider = RiderCreate { name: "Test".to_string(), phone_number: "+966500000000".to_string() };
            client.create(rider).await
        });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.name, "Test");
        responder.send(Ok("rider_1".to_string())).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok("rider_1".to_string()));
    }

    #[tokio::test]
    async fn test_unexpected_request_yields_none() {
        let (client, mut receiver) = create_mock_client::<Ride>(10);
        let _query = tokio::spawn(async move { client.query(RideFilter::All, 5).await });

        assert!(expect_get(&mut receiver).await.is_none());
    }
}
