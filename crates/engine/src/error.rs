use archive::ArchiveError;
use std::io;
use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the engine and its handle.
#[derive(Debug, Error)]
pub enum Error {
    /// The handle was destroyed.
    #[error("engine handle is not valid")]
    InvalidHandle,

    /// A score, delta, factor or address was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A block or directory page could not be allocated.
    #[error("out of memory allocating {0}")]
    OutOfMemory(&'static str),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// An archive could not be written or failed validation.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// The address lies in a reserved or non-routable range.
    #[error("bogon address {}", dotted(.0))]
    Bogon(u32),
}

fn dotted(addr: &u32) -> String {
    addr::u32_to_ip(*addr)
}

/// Coarse failure class, one per error code a caller has to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidHandle,
    InvalidArgument,
    OutOfMemory,
    IoFailure,
    BogonAddress,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidHandle => ErrorKind::InvalidHandle,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::OutOfMemory(_) => ErrorKind::OutOfMemory,
            Error::Io(_) | Error::Archive(_) => ErrorKind::IoFailure,
            Error::Bogon(_) => ErrorKind::BogonAddress,
        }
    }
}
