//! Error types for the engine.

use dedisync_remote::RemoteError;
use dedisync_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The remote capability is not connected. Surfaced immediately,
    /// never retried.
    #[error("not connected to the dedicated server")]
    NotConnected,

    /// The synchronizer is already past its one connect transition.
    #[error("already synchronizing")]
    AlreadyConnected,

    /// The remote side rejected an operation.
    #[error("remote operation failed: {detail}")]
    RemoteOperationFailed {
        /// The wrapped fault message.
        detail: String,
    },

    /// The server did not accept the written mode-script settings.
    #[error("the server rejected the mode script settings")]
    SettingsRejected,

    /// The catalog lookup for a map failed or returned nothing.
    #[error("no catalog metadata available for map {uid}")]
    MetadataUnavailable {
        /// The map UID the lookup was filtered by.
        uid: String,
    },

    /// The per-user records lookup failed.
    #[error("records lookup failed: {reason}")]
    RecordsUnavailable {
        /// Failure detail.
        reason: String,
    },

    /// The durable metadata store failed.
    #[error("metadata store error: {0}")]
    Store(#[from] StoreError),

    /// The background resync thread could not be started.
    #[error("failed to start resync thread: {0}")]
    ThreadSpawn(std::io::Error),
}

impl From<RemoteError> for EngineError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotConnected => EngineError::NotConnected,
            RemoteError::Fault(fault) => EngineError::RemoteOperationFailed {
                detail: fault.to_string(),
            },
        }
    }
}
