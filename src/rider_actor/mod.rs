//! Rider profile documents.

pub mod entity;
pub mod error;

pub use error::*;
