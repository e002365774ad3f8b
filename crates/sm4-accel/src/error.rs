//! Error types shared by the facade and the C ABI.

use sm4_core::BLOCK_SIZE;
use thiserror::Error;

/// A malformed request: the caller broke an operation's preconditions.
///
/// These are programming errors. The safe API reports them, the C ABI
/// treats them as fatal.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
    /// Zero-length input for a block-aligned mode.
    #[error("input is empty")]
    Empty,
    /// Length not a multiple of the block size.
    #[error("length {len} is not a multiple of the 16-byte block size")]
    Misaligned {
        /// Offending length in bytes.
        len: usize,
    },
    /// XTS needs at least one full block.
    #[error("XTS input of {len} bytes is shorter than one block")]
    ShortXts {
        /// Offending length in bytes.
        len: usize,
    },
    /// Out-of-place call whose output cannot hold exactly the input.
    #[error("output buffer holds {output} bytes but input has {input}")]
    LengthMismatch {
        /// Input length in bytes.
        input: usize,
        /// Output length in bytes.
        output: usize,
    },
    /// Schedule never filled by a `setkey_*` call.
    #[error("{0} key schedule has not been derived from a key")]
    Unkeyed(&'static str),
    /// Null pointer handed to a raw entry point.
    #[error("null pointer passed for `{0}`")]
    NullPointer(&'static str),
}

/// Errors returned by [`Sm4Accel`](crate::Sm4Accel) operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccelError {
    /// The request itself was malformed.
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),
    /// All inputs were valid but the register file could not be acquired.
    #[error("SIMD register file unavailable: {0}")]
    Unavailable(&'static str),
}

impl AccelError {
    /// Returns `true` for caller errors as opposed to host conditions.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, AccelError::Contract(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = AccelError> = core::result::Result<T, E>;

/// ECB/CBC/CTR: positive multiple of the block size.
pub(crate) fn check_blocks(len: usize) -> Result<(), ContractViolation> {
    if len == 0 {
        Err(ContractViolation::Empty)
    } else if len % BLOCK_SIZE != 0 {
        Err(ContractViolation::Misaligned { len })
    } else {
        Ok(())
    }
}

/// XTS: at least one block; the tail is handled by ciphertext stealing.
pub(crate) fn check_xts(len: usize) -> Result<(), ContractViolation> {
    if len < BLOCK_SIZE {
        Err(ContractViolation::ShortXts { len })
    } else {
        Ok(())
    }
}

pub(crate) fn check_pair(input: &[u8], output: &[u8]) -> Result<(), ContractViolation> {
    if input.len() != output.len() {
        Err(ContractViolation::LengthMismatch {
            input: input.len(),
            output: output.len(),
        })
    } else {
        Ok(())
    }
}
