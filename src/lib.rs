//! Ride booking lifecycle kept in sync across two stores.
//!
//! Every ride lives twice: as a durable record in the `rides` collection and
//! as a live copy under `activeRides/<id>` in a realtime mirror that pushes
//! each write to its listeners. [`clients::RideLifecycleSync`] performs the
//! rider's side of the lifecycle against both, and
//! [`app_system::Reconciler`] repairs whatever a half-finished dual write
//! leaves behind.
//!
//! Each store is an actor task owning its state; callers talk to it through
//! cheap cloneable clients.

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod domain;
pub mod fare;
pub mod mirror;
pub mod ride_actor;
pub mod rider_actor;

#[cfg(test)]
mod mock_framework;
