//! Client-side orchestration over the store actors.

#[macro_use]
mod macros;

pub mod profile_client;
pub mod ride_client;
pub mod subscription;

pub use profile_client::*;
pub use ride_client::*;
pub use subscription::*;
