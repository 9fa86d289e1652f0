use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::Role;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {role} `{}`", path.display())]
    SourceUnavailable {
        role: Role,
        path: PathBuf,
        source: io::Error,
    },

    #[error("{role} has {words} words from address {start}, but only {room} fit in the image")]
    CapacityExceeded {
        role: Role,
        start: usize,
        words: usize,
        room: usize,
    },

    #[error("cannot write image to `{}`", path.display())]
    DestinationUnavailable {
        path: PathBuf,
        source: io::Error,
    },

    #[error("handler offset {handler_offset} is past the image capacity {capacity}")]
    BadLayout {
        capacity: usize,
        handler_offset: usize,
    },
}

impl Error {
    /// Process exit status for a run that ended with this error. Stays clear
    /// of 2, which clap uses for usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::SourceUnavailable { .. } => 3,
            Self::CapacityExceeded { .. } => 4,
            Self::DestinationUnavailable { .. } => 5,
            Self::BadLayout { .. } => 1,
        }
    }
}
