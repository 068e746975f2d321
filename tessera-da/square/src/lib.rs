pub mod codec;
pub mod eds;
pub mod encoder;
pub mod repair;
pub mod share;
#[cfg(feature = "testutils")]
pub mod testutils;

// crates
use thiserror::Error;
// internal
use tessera_nmt::{CommitError, NmtError};

pub use codec::{Codec, CodecError, RsGf8Codec};
pub use eds::{Axis, ExtendedDataSquare};
pub use encoder::{DaEncoder, DaEncoderParams, EncodedData};
pub use repair::{repair, RepairError};
pub use share::{Share, PAYLOAD_SIZE, SHARE_SIZE};

/// Widest original square the GF(2^8) codec can extend.
pub const MAX_SQUARE_WIDTH: usize = 128;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("expected {want} shares, got {got}")]
    WrongShareCount { got: usize, want: usize },
    #[error("unsupported square width {0}")]
    UnsupportedWidth(usize),
    #[error("share must be {SHARE_SIZE} bytes, got {0}")]
    WrongShareSize(usize),
    #[error("share payload must be {PAYLOAD_SIZE} bytes, got {0}")]
    WrongPayloadSize(usize),
    #[error("shares are not namespace-ordered: {0}")]
    Ordering(NmtError),
    #[error(transparent)]
    Commit(CommitError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<NmtError> for EncodingError {
    fn from(err: NmtError) -> Self {
        match err {
            NmtError::Commit(commit) => Self::Commit(commit),
            other => Self::Ordering(other),
        }
    }
}
