use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("No authenticated owner; queue admission refused")]
    NoAuthenticatedOwner,

    #[error("Operation {operation_id} not found")]
    OperationNotFound { operation_id: String },

    #[error("Conflict {conflict_id} not found")]
    ConflictNotFound { conflict_id: String },

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Device is offline")]
    Offline,

    #[error("Invalid priority: {0}")]
    InvalidPriority(i32),

    #[error("Invalid operation status: {0}")]
    InvalidStatus(String),

    #[error("Invalid operation kind: {0}")]
    InvalidKind(String),

    #[error("Invalid conflict strategy: {0}")]
    InvalidStrategy(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Handler error: {0}")]
    Handler(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
