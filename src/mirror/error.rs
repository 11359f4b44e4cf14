use thiserror::Error;

/// Errors returned by the realtime mirror.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MirrorError {
    #[error("No value at path: {0}")]
    NotFound(String),
    #[error("Mirror write rejected: {0}")]
    Rejected(String),
    #[error("Mirror actor closed")]
    ActorClosed,
    #[error("Mirror actor dropped")]
    ActorDropped,
}
