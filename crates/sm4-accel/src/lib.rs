//! Guarded invocation of accelerated SM4 kernels.
//!
//! An accelerated SM4 routine works on the SIMD/floating-point register
//! file, which a kernel does not save across context switches on its own.
//! This crate brackets every call so the register file is enabled before
//! the routine runs and restored to its prior state afterwards:
//!
//! - [`vfp`]: the register-file guard and the host enable/disable pair.
//! - [`kernel`]: the accelerated-kernel boundary, with a portable kernel
//!   and, on AArch64, a NEON kernel.
//! - [`dispatch`]: one-time selection of the best available kernel.
//! - [`Sm4Accel`]: the facade, one operation per key direction and mode.
//! - [`ffi`]: the same operations behind raw-pointer `extern "C"` symbols.
//!
//! ```
//! use sm4_accel::{Sm4Accel, Sm4Key};
//!
//! let accel = Sm4Accel::new();
//! let key = Sm4Key::from([0u8; 16]);
//! let enc = accel.derive_enc(&key)?;
//! let dec = accel.derive_dec(&key)?;
//!
//! let mut block = [0u8; 16];
//! accel.ecb_in_place(&enc, &mut block)?;
//! accel.ecb_in_place(&dec, &mut block)?;
//! assert_eq!(block, [0u8; 16]);
//! # Ok::<(), sm4_accel::AccelError>(())
//! ```

#![warn(missing_docs)]

pub mod dispatch;
mod error;
mod facade;
pub mod ffi;
pub mod kernel;
mod schedule;
pub mod vfp;

pub use crate::error::{AccelError, ContractViolation, Result};
pub use crate::facade::Sm4Accel;
pub use crate::schedule::{DecSchedule, Decrypt, Direction, EncSchedule, Encrypt, KeySchedule};
pub use sm4_core::{Block, RoundKeys, Sm4Key, BLOCK_SIZE};
