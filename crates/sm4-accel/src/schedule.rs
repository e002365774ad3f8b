//! Direction-typed key schedules.
//!
//! SM4 encryption and decryption schedules share a layout but are not
//! interchangeable. Tagging the schedule with its direction turns a mismatch
//! into a type error.

use core::fmt;
use core::marker::PhantomData;

use sm4_core::{RoundKeys, ROUNDS};

use crate::error::ContractViolation;

mod sealed {
    pub trait Sealed {}
}

/// Direction a schedule was derived for.
pub trait Direction: sealed::Sealed + Copy + Default + fmt::Debug + 'static {
    /// Short name used in diagnostics.
    const NAME: &'static str;
}

/// Encryption direction marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Encrypt;

/// Decryption direction marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decrypt;

impl sealed::Sealed for Encrypt {}
impl sealed::Sealed for Decrypt {}

impl Direction for Encrypt {
    const NAME: &'static str = "encrypt";
}

impl Direction for Decrypt {
    const NAME: &'static str = "decrypt";
}

/// Caller-owned 32-word round-key schedule for direction `D`.
///
/// A schedule is usable only after a `setkey_*` call has filled it. The
/// facade rejects an unfilled one with [`ContractViolation::Unkeyed`].
#[derive(Clone, PartialEq, Eq)]
pub struct KeySchedule<D: Direction> {
    round_keys: RoundKeys,
    keyed: bool,
    _direction: PhantomData<D>,
}

/// Schedule produced by [`Sm4Accel::setkey_enc`](crate::Sm4Accel::setkey_enc).
pub type EncSchedule = KeySchedule<Encrypt>;
/// Schedule produced by [`Sm4Accel::setkey_dec`](crate::Sm4Accel::setkey_dec).
pub type DecSchedule = KeySchedule<Decrypt>;

impl<D: Direction> KeySchedule<D> {
    /// An unfilled schedule, ready to be passed to a `setkey_*` operation.
    ///
    /// Cipher operations refuse it until it has been filled.
    pub const fn empty() -> Self {
        Self {
            round_keys: RoundKeys::zeroed(),
            keyed: false,
            _direction: PhantomData,
        }
    }

    /// Wraps round keys whose direction the caller vouches for.
    pub(crate) fn from_round_keys(round_keys: RoundKeys) -> Self {
        Self {
            round_keys,
            keyed: true,
            _direction: PhantomData,
        }
    }

    /// Whether a key derivation has filled this schedule.
    pub fn is_keyed(&self) -> bool {
        self.keyed
    }

    /// The round keys in application order.
    pub fn round_keys(&self) -> &RoundKeys {
        &self.round_keys
    }

    /// The round keys, provided a derivation filled them.
    pub(crate) fn keyed_round_keys(&self) -> Result<&RoundKeys, ContractViolation> {
        if self.keyed {
            Ok(&self.round_keys)
        } else {
            Err(ContractViolation::Unkeyed(D::NAME))
        }
    }

    pub(crate) fn round_keys_mut(&mut self) -> &mut RoundKeys {
        &mut self.round_keys
    }

    pub(crate) fn mark_keyed(&mut self) {
        self.keyed = true;
    }

    /// The raw words, in the layout the C ABI expects.
    pub fn words(&self) -> &[u32; ROUNDS] {
        &self.round_keys.0
    }
}

impl<D: Direction> Default for KeySchedule<D> {
    fn default() -> Self {
        Self::empty()
    }
}

// Round keys are key material; keep them out of logs.
impl<D: Direction> fmt::Debug for KeySchedule<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySchedule")
            .field("direction", &D::NAME)
            .field("keyed", &self.keyed)
            .finish_non_exhaustive()
    }
}
