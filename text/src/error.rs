use thiserror::Error;

/// Errors returned by [`Buffer`](crate::Buffer) operations.
///
/// Every variant is an ordinary, recoverable result for the immediate caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("Observer has already been added")]
    ObserverAlreadyAdded,

    #[error("Observer is not in the list of observers")]
    ObserverNotInList,

    #[error("Nothing to insert")]
    NothingToInsert,

    #[error("Nothing to erase")]
    NothingToErase,

    /// A mutation was attempted from inside an observer callback
    #[error("Buffer can not be modified when in a callback")]
    BufferInCallbacks,

    /// The storage worker panicked while running the operation
    #[error("Storage operation faulted: {message}")]
    Fault { message: String },
}

pub type Result<T, E = BufferError> = std::result::Result<T, E>;
