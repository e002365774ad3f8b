//! Reference SM4 implementation used as the software fallback and as the
//! known-good baseline for accelerated kernels.
//!
//! This crate follows GB/T 32907-2016 and provides:
//! - Encryption and decryption key schedules.
//! - The single-block 32-round transform.
//! - Public types shared across the workspace.
//!
//! Lookups go through a plain byte table; the implementation is not
//! constant-time with respect to cache timing.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod block;
mod cipher;
mod key;
mod round;
mod sbox;

pub use crate::block::{xor_in_place, Block, BLOCK_SIZE};
pub use crate::cipher::{crypt_block, decrypt_block, encrypt_block, expand_key_dec, expand_key_enc};
pub use crate::key::{RoundKeys, Sm4Key, ROUNDS};
pub use crate::round::{l_data, l_key, t_data, t_key, tau};
pub use crate::sbox::{sbox, sbox_table};
