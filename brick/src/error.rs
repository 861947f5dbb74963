use crate::BBOX_ENTRY_SIZE;
use std::io;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures raised while framing or parsing brick records.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "truncated record at byte {offset}: expected {expected} bytes but only {available} remain"
    )]
    TruncatedRecord {
        offset: u64,
        expected: usize,
        available: usize,
    },
    #[error("label blob of {len} bytes is not a multiple of {} bytes", BBOX_ENTRY_SIZE)]
    MalformedLabel { len: usize },
    #[error("box entry {index} has negative or non-finite size")]
    InvalidBBox { index: usize },
    #[error("image of {size} bytes does not fit in the image size field (max {max})")]
    ImageTooLarge { size: usize, max: usize },
    #[error("label blob of {size} bytes does not fit in the label size field (max {max})")]
    LabelTooLarge { size: usize, max: usize },
    #[error("the record stream is closed")]
    Closed,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true if the error indicates a corrupt or incomplete stream
    /// rather than a rejected input.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::TruncatedRecord { .. } | Self::MalformedLabel { .. } | Self::InvalidBBox { .. }
        )
    }
}
