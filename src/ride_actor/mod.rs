//! Ride documents: the durable collection's entity, its DTOs and errors.

pub mod dtos;
pub mod entity;
pub mod error;

pub use dtos::*;
pub use error::*;
