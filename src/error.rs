use std::io;

use thiserror::Error;

/// Errors reported by the capture facade
#[derive(Error, Debug)]
pub enum Error {
    /// The node is not a video4linux capture device
    #[error("not a V4L capture device")]
    WrongDevice,

    /// The driver rejected memory mapped streaming
    #[error("unsupported device or operation")]
    Unsupported,

    /// A frame view was used after a newer capture or the end of the session
    #[error("buffer contents not available")]
    BufferGone,

    /// A read or seek position resolved to a negative offset
    #[error("negative offset")]
    NegativeOffset,

    /// The driver granted no buffers
    #[error("out of device memory")]
    OutOfMemory,

    /// Any other OS level failure, passed through unchanged
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the OS error code behind this error, if any
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::NegativeOffset => io::Error::new(io::ErrorKind::InvalidInput, err),
            err => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}
