//! The cipher operation facade.
//!
//! Every operation runs the same protocol: validate the request, acquire the
//! register file, hand the caller's buffers straight to the kernel, release.
//! Validation happens before acquisition, so a rejected request never
//! touches the register file; the guard releases on every other exit.
//!
//! Out-of-place variants write the input into the caller's output buffer
//! and transform it there. IV and tweak buffers are updated in place so a
//! stream can be continued by the next call.

use sm4_core::{Block, Sm4Key};

use crate::dispatch;
use crate::error::{check_blocks, check_pair, check_xts, Result};
use crate::kernel::Sm4Kernel;
use crate::schedule::{DecSchedule, Direction, EncSchedule, KeySchedule};
use crate::vfp::{with_vfp, RegisterFile, ThreadContext};

/// Entry point for guarded SM4 operations.
///
/// Holds no per-call state: the kernel is stateless and the host only
/// tracks register-file ownership.
#[derive(Clone, Copy)]
pub struct Sm4Accel<H: RegisterFile = ThreadContext> {
    kernel: &'static dyn Sm4Kernel,
    host: H,
}

impl Sm4Accel<ThreadContext> {
    /// Uses the dispatched kernel on the current thread's register file.
    pub fn new() -> Self {
        Self::with_kernel(dispatch::kernel(), ThreadContext)
    }

    /// Uses the software kernel on the current thread's register file.
    pub fn portable() -> Self {
        Self::with_kernel(dispatch::portable(), ThreadContext)
    }
}

impl Default for Sm4Accel<ThreadContext> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: RegisterFile> core::fmt::Debug for Sm4Accel<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sm4Accel")
            .field("kernel", &self.kernel.name())
            .finish_non_exhaustive()
    }
}

impl<H: RegisterFile> Sm4Accel<H> {
    /// Pairs an explicit kernel with an explicit host.
    pub fn with_kernel(kernel: &'static dyn Sm4Kernel, host: H) -> Self {
        Self { kernel, host }
    }

    /// Name of the kernel in use.
    pub fn kernel_name(&self) -> &'static str {
        self.kernel.name()
    }

    /// The register-file host.
    pub fn host(&self) -> &H {
        &self.host
    }

    fn guarded<T>(&self, op: impl FnOnce(&dyn Sm4Kernel) -> T) -> Result<T> {
        let kernel = self.kernel;
        with_vfp(&self.host, || op(kernel))
    }

    /// Fills `schedule` with the encryption round keys for `key`.
    pub fn setkey_enc(&self, schedule: &mut EncSchedule, key: &Sm4Key) -> Result<()> {
        self.guarded(|k| k.setkey_enc(schedule.round_keys_mut(), key))?;
        schedule.mark_keyed();
        Ok(())
    }

    /// Fills `schedule` with the decryption round keys for `key`.
    pub fn setkey_dec(&self, schedule: &mut DecSchedule, key: &Sm4Key) -> Result<()> {
        self.guarded(|k| k.setkey_dec(schedule.round_keys_mut(), key))?;
        schedule.mark_keyed();
        Ok(())
    }

    /// Derives a fresh encryption schedule.
    pub fn derive_enc(&self, key: &Sm4Key) -> Result<EncSchedule> {
        let mut schedule = EncSchedule::empty();
        self.setkey_enc(&mut schedule, key)?;
        Ok(schedule)
    }

    /// Derives a fresh decryption schedule.
    pub fn derive_dec(&self, key: &Sm4Key) -> Result<DecSchedule> {
        let mut schedule = DecSchedule::empty();
        self.setkey_dec(&mut schedule, key)?;
        Ok(schedule)
    }

    /// ECB over `buf`; encrypts or decrypts according to the schedule.
    pub fn ecb_in_place<D: Direction>(
        &self,
        schedule: &KeySchedule<D>,
        buf: &mut [u8],
    ) -> Result<()> {
        check_blocks(buf.len())?;
        let rk = schedule.keyed_round_keys()?;
        self.guarded(|k| k.ecb(rk, buf))
    }

    /// ECB from `input` into `output`.
    pub fn ecb<D: Direction>(
        &self,
        schedule: &KeySchedule<D>,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<()> {
        check_pair(input, output)?;
        check_blocks(input.len())?;
        schedule.keyed_round_keys()?;
        output.copy_from_slice(input);
        self.ecb_in_place(schedule, output)
    }

    /// CBC encryption of `buf`; `iv` ends at the last ciphertext block.
    pub fn cbc_encrypt_in_place(
        &self,
        schedule: &EncSchedule,
        buf: &mut [u8],
        iv: &mut Block,
    ) -> Result<()> {
        check_blocks(buf.len())?;
        let rk = schedule.keyed_round_keys()?;
        self.guarded(|k| k.cbc_encrypt(rk, buf, iv))
    }

    /// CBC encryption from `input` into `output`.
    pub fn cbc_encrypt(
        &self,
        schedule: &EncSchedule,
        input: &[u8],
        output: &mut [u8],
        iv: &mut Block,
    ) -> Result<()> {
        check_pair(input, output)?;
        check_blocks(input.len())?;
        schedule.keyed_round_keys()?;
        output.copy_from_slice(input);
        self.cbc_encrypt_in_place(schedule, output, iv)
    }

    /// CBC decryption of `buf`; `iv` ends at the last input ciphertext block.
    pub fn cbc_decrypt_in_place(
        &self,
        schedule: &DecSchedule,
        buf: &mut [u8],
        iv: &mut Block,
    ) -> Result<()> {
        check_blocks(buf.len())?;
        let rk = schedule.keyed_round_keys()?;
        self.guarded(|k| k.cbc_decrypt(rk, buf, iv))
    }

    /// CBC decryption from `input` into `output`.
    pub fn cbc_decrypt(
        &self,
        schedule: &DecSchedule,
        input: &[u8],
        output: &mut [u8],
        iv: &mut Block,
    ) -> Result<()> {
        check_pair(input, output)?;
        check_blocks(input.len())?;
        schedule.keyed_round_keys()?;
        output.copy_from_slice(input);
        self.cbc_decrypt_in_place(schedule, output, iv)
    }

    /// CTR over `buf`. The same call encrypts and decrypts.
    ///
    /// Partial final blocks are rejected like in the other block modes.
    pub fn ctr_crypt_in_place(
        &self,
        schedule: &EncSchedule,
        buf: &mut [u8],
        counter: &mut Block,
    ) -> Result<()> {
        check_blocks(buf.len())?;
        let rk = schedule.keyed_round_keys()?;
        self.guarded(|k| k.ctr_crypt(rk, buf, counter))
    }

    /// CTR from `input` into `output`.
    pub fn ctr_crypt(
        &self,
        schedule: &EncSchedule,
        input: &[u8],
        output: &mut [u8],
        counter: &mut Block,
    ) -> Result<()> {
        check_pair(input, output)?;
        check_blocks(input.len())?;
        schedule.keyed_round_keys()?;
        output.copy_from_slice(input);
        self.ctr_crypt_in_place(schedule, output, counter)
    }

    /// XTS encryption of one data unit held in `buf`.
    ///
    /// `data` and `tweak` are encryption schedules for the two halves of the
    /// XTS key. `iv` carries the sector tweak in and the follow-on tweak out.
    pub fn xts_encrypt_in_place(
        &self,
        data: &EncSchedule,
        tweak: &EncSchedule,
        buf: &mut [u8],
        iv: &mut Block,
    ) -> Result<()> {
        check_xts(buf.len())?;
        let (rk_data, rk_tweak) = (data.keyed_round_keys()?, tweak.keyed_round_keys()?);
        self.guarded(|k| k.xts_encrypt(rk_data, rk_tweak, buf, iv))
    }

    /// XTS encryption from `input` into `output`.
    pub fn xts_encrypt(
        &self,
        data: &EncSchedule,
        tweak: &EncSchedule,
        input: &[u8],
        output: &mut [u8],
        iv: &mut Block,
    ) -> Result<()> {
        check_pair(input, output)?;
        check_xts(input.len())?;
        data.keyed_round_keys()?;
        tweak.keyed_round_keys()?;
        output.copy_from_slice(input);
        self.xts_encrypt_in_place(data, tweak, output, iv)
    }

    /// XTS decryption of one data unit held in `buf`.
    ///
    /// The tweak is always encrypted, so `tweak` stays an encryption schedule.
    pub fn xts_decrypt_in_place(
        &self,
        data: &DecSchedule,
        tweak: &EncSchedule,
        buf: &mut [u8],
        iv: &mut Block,
    ) -> Result<()> {
        check_xts(buf.len())?;
        let (rk_data, rk_tweak) = (data.keyed_round_keys()?, tweak.keyed_round_keys()?);
        self.guarded(|k| k.xts_decrypt(rk_data, rk_tweak, buf, iv))
    }

    /// XTS decryption from `input` into `output`.
    pub fn xts_decrypt(
        &self,
        data: &DecSchedule,
        tweak: &EncSchedule,
        input: &[u8],
        output: &mut [u8],
        iv: &mut Block,
    ) -> Result<()> {
        check_pair(input, output)?;
        check_xts(input.len())?;
        data.keyed_round_keys()?;
        tweak.keyed_round_keys()?;
        output.copy_from_slice(input);
        self.xts_decrypt_in_place(data, tweak, output, iv)
    }
}
