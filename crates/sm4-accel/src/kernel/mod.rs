//! The accelerated-kernel boundary.
//!
//! [`Sm4Kernel`] is the set of primitives the facade delegates to. Kernels
//! are stateless and operate in place on buffers the facade has already
//! validated; they never check lengths themselves.

use sm4_core::{expand_key_dec, expand_key_enc, Block, RoundKeys, Sm4Key};

/// One implementation of the SM4 primitives for a hardware capability.
///
/// Every method runs with the register file already held by the caller.
/// Length preconditions: `ecb`, `cbc_*` and `ctr_crypt` receive a positive
/// multiple of 16 bytes, `xts_*` receive at least 16 bytes.
pub trait Sm4Kernel: Send + Sync {
    /// Diagnostic name, e.g. `"aarch64/neon"`.
    fn name(&self) -> &'static str;

    /// Fills `rk` with the encryption schedule for `key`.
    fn setkey_enc(&self, rk: &mut RoundKeys, key: &Sm4Key) {
        *rk = expand_key_enc(key);
    }

    /// Fills `rk` with the decryption schedule for `key`.
    fn setkey_dec(&self, rk: &mut RoundKeys, key: &Sm4Key) {
        *rk = expand_key_dec(key);
    }

    /// Transforms each block independently.
    fn ecb(&self, rk: &RoundKeys, buf: &mut [u8]);

    /// CBC encryption; leaves `iv` at the last ciphertext block.
    fn cbc_encrypt(&self, rk: &RoundKeys, buf: &mut [u8], iv: &mut Block);

    /// CBC decryption; leaves `iv` at the last input ciphertext block.
    fn cbc_decrypt(&self, rk: &RoundKeys, buf: &mut [u8], iv: &mut Block);

    /// CTR keystream XOR; `iv` is a big-endian counter left at the next
    /// unused value.
    fn ctr_crypt(&self, rk: &RoundKeys, buf: &mut [u8], iv: &mut Block);

    /// XTS encryption of one data unit.
    ///
    /// `rk_data` is an encryption schedule for the data key, `rk_tweak` an
    /// encryption schedule for the tweak key. `iv` is left at the tweak of
    /// the block following the data unit.
    fn xts_encrypt(
        &self,
        rk_data: &RoundKeys,
        rk_tweak: &RoundKeys,
        buf: &mut [u8],
        iv: &mut Block,
    );

    /// XTS decryption of one data unit; `rk_data` is a decryption schedule.
    fn xts_decrypt(
        &self,
        rk_data: &RoundKeys,
        rk_tweak: &RoundKeys,
        buf: &mut [u8],
        iv: &mut Block,
    );
}

/// Bulk block transform a kernel is built from.
pub(crate) trait BlockEngine {
    /// Runs the cipher over every block of `blocks` (a multiple of 16 bytes).
    fn crypt_blocks(&self, rk: &RoundKeys, blocks: &mut [u8]);
}

/// Implements [`Sm4Kernel`] for a [`BlockEngine`] via the shared mode code.
macro_rules! impl_kernel_for_engine {
    ($engine:ty, $name:literal) => {
        impl $crate::kernel::Sm4Kernel for $engine {
            fn name(&self) -> &'static str {
                $name
            }

            fn ecb(&self, rk: &sm4_core::RoundKeys, buf: &mut [u8]) {
                $crate::kernel::BlockEngine::crypt_blocks(self, rk, buf)
            }

            fn cbc_encrypt(
                &self,
                rk: &sm4_core::RoundKeys,
                buf: &mut [u8],
                iv: &mut sm4_core::Block,
            ) {
                $crate::kernel::modes::cbc_encrypt(self, rk, buf, iv)
            }

            fn cbc_decrypt(
                &self,
                rk: &sm4_core::RoundKeys,
                buf: &mut [u8],
                iv: &mut sm4_core::Block,
            ) {
                $crate::kernel::modes::cbc_decrypt(self, rk, buf, iv)
            }

            fn ctr_crypt(
                &self,
                rk: &sm4_core::RoundKeys,
                buf: &mut [u8],
                iv: &mut sm4_core::Block,
            ) {
                $crate::kernel::modes::ctr_crypt(self, rk, buf, iv)
            }

            fn xts_encrypt(
                &self,
                rk_data: &sm4_core::RoundKeys,
                rk_tweak: &sm4_core::RoundKeys,
                buf: &mut [u8],
                iv: &mut sm4_core::Block,
            ) {
                $crate::kernel::modes::xts_encrypt(self, rk_data, rk_tweak, buf, iv)
            }

            fn xts_decrypt(
                &self,
                rk_data: &sm4_core::RoundKeys,
                rk_tweak: &sm4_core::RoundKeys,
                buf: &mut [u8],
                iv: &mut sm4_core::Block,
            ) {
                $crate::kernel::modes::xts_decrypt(self, rk_data, rk_tweak, buf, iv)
            }
        }
    };
}

pub(crate) use impl_kernel_for_engine;

mod modes;
#[cfg(target_arch = "aarch64")]
mod neon;
mod portable;

#[cfg(target_arch = "aarch64")]
pub use neon::Neon;
pub use portable::Portable;
