//! System orchestration, startup, and shutdown logic.

pub mod config;
pub mod reconciler;
pub mod ride_system;
pub mod telemetry;

pub use config::*;
pub use reconciler::*;
pub use ride_system::*;
pub use telemetry::*;
