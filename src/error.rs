use crate::CacheState;
use std::{collections::TryReserveError, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Failed to reserve memory for points or vertices
    OutOfMemory(TryReserveError),
    /// Operation is not allowed in the current state of the path cache
    InvalidState {
        expected: CacheState,
        found: CacheState,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tessellate::{:?}", self)
    }
}

impl From<TryReserveError> for Error {
    fn from(error: TryReserveError) -> Self {
        Self::OutOfMemory(error)
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::OutOfMemory(_) => Self::new(std::io::ErrorKind::OutOfMemory, error),
            Error::InvalidState { .. } => Self::other(error),
        }
    }
}

impl std::error::Error for Error {}
