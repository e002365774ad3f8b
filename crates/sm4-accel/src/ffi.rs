//! C ABI entry points.
//!
//! These keep the raw-pointer signatures of the classic accelerator glue:
//! schedules are 32 native-endian `u32` words, keys and IVs are 16 bytes,
//! and `out` may equal `in` for in-place operation. A contract violation is
//! fatal, as is an unusable register file: the panic cannot unwind through
//! `extern "C"` and aborts.

use core::ffi::{c_uint, c_void};
use core::ptr;
use core::slice;

use sm4_core::{Block, RoundKeys, Sm4Key, ROUNDS};

use crate::error::{check_blocks, check_xts, ContractViolation, Result};
use crate::facade::Sm4Accel;
use crate::schedule::{Direction, KeySchedule};

fn fatal(result: Result<()>) {
    if let Err(err) = result {
        panic!("crypto_accel_sm4: {err}");
    }
}

fn non_null<T>(ptr: *const T, name: &'static str) -> Result<(), ContractViolation> {
    if ptr.is_null() {
        Err(ContractViolation::NullPointer(name))
    } else {
        Ok(())
    }
}

/// # Safety
/// `key` must point to 16 readable bytes.
unsafe fn read_key(key: *const u8) -> Sm4Key {
    Sm4Key(ptr::read_unaligned(key as *const [u8; 16]))
}

/// # Safety
/// `rk` must point to 32 readable words produced by the matching setkey.
unsafe fn read_schedule<D: Direction>(rk: *const c_void) -> KeySchedule<D> {
    KeySchedule::from_round_keys(RoundKeys(ptr::read_unaligned(rk as *const [u32; ROUNDS])))
}

/// Copies `input` into `out` unless they alias, then views `out` mutably.
///
/// # Safety
/// Both pointers must be valid for `len` bytes; `out` must be writable.
unsafe fn stage<'a>(out: *mut c_void, input: *const c_void, len: usize) -> &'a mut [u8] {
    let out = out as *mut u8;
    let input = input as *const u8;
    if !ptr::eq(out as *const u8, input) {
        ptr::copy(input, out, len);
    }
    slice::from_raw_parts_mut(out, len)
}

/// # Safety
/// `iv` must point to 16 writable bytes not aliased by the data buffers.
unsafe fn iv_mut<'a>(iv: *mut c_void) -> &'a mut Block {
    &mut *(iv as *mut Block)
}

pub(crate) unsafe fn setkey<D: Direction>(
    sk: *mut u32,
    key: *const u8,
    derive: fn(&Sm4Accel, &Sm4Key) -> Result<KeySchedule<D>>,
) -> Result<()> {
    non_null(sk, "sk")?;
    non_null(key, "key")?;
    let schedule = derive(&Sm4Accel::new(), &read_key(key))?;
    ptr::write_unaligned(sk as *mut [u32; ROUNDS], *schedule.words());
    Ok(())
}

#[derive(Clone, Copy)]
pub(crate) enum Chained {
    CbcEncrypt,
    CbcDecrypt,
    Ctr,
}

pub(crate) unsafe fn ecb(
    out: *mut c_void,
    input: *const c_void,
    key: *const c_void,
    len: c_uint,
) -> Result<()> {
    non_null(out, "out")?;
    non_null(input, "in")?;
    non_null(key, "key")?;
    let len = len as usize;
    check_blocks(len)?;
    // ECB is direction-agnostic: the schedule decides.
    let schedule = read_schedule::<crate::schedule::Encrypt>(key);
    Sm4Accel::new().ecb_in_place(&schedule, stage(out, input, len))
}

pub(crate) unsafe fn chained(
    mode: Chained,
    out: *mut c_void,
    input: *const c_void,
    key: *const c_void,
    len: c_uint,
    iv: *mut c_void,
) -> Result<()> {
    non_null(out, "out")?;
    non_null(input, "in")?;
    non_null(key, "key")?;
    non_null(iv, "iv")?;
    let len = len as usize;
    check_blocks(len)?;
    let accel = Sm4Accel::new();
    let buf = stage(out, input, len);
    let iv = iv_mut(iv);
    match mode {
        Chained::CbcEncrypt => accel.cbc_encrypt_in_place(&read_schedule(key), buf, iv),
        Chained::CbcDecrypt => accel.cbc_decrypt_in_place(&read_schedule(key), buf, iv),
        Chained::Ctr => accel.ctr_crypt_in_place(&read_schedule(key), buf, iv),
    }
}

pub(crate) unsafe fn xts(
    decrypt: bool,
    out: *mut c_void,
    input: *const c_void,
    key1: *const c_void,
    key2: *const c_void,
    len: c_uint,
    iv: *mut c_void,
) -> Result<()> {
    non_null(out, "out")?;
    non_null(input, "in")?;
    non_null(key1, "key1")?;
    non_null(key2, "key2")?;
    non_null(iv, "iv")?;
    let len = len as usize;
    check_xts(len)?;
    let accel = Sm4Accel::new();
    let tweak = read_schedule(key2);
    let buf = stage(out, input, len);
    let iv = iv_mut(iv);
    if decrypt {
        accel.xts_decrypt_in_place(&read_schedule(key1), &tweak, buf, iv)
    } else {
        accel.xts_encrypt_in_place(&read_schedule(key1), &tweak, buf, iv)
    }
}

/// Derives the encryption schedule for `key` into `sk`.
///
/// # Safety
/// `sk` must be valid for 32 word writes and `key` for 16 byte reads.
#[no_mangle]
pub unsafe extern "C" fn crypto_accel_sm4_setkey_enc(sk: *mut u32, key: *const u8) {
    fatal(setkey(sk, key, Sm4Accel::derive_enc))
}

/// Derives the decryption schedule for `key` into `sk`.
///
/// # Safety
/// `sk` must be valid for 32 word writes and `key` for 16 byte reads.
#[no_mangle]
pub unsafe extern "C" fn crypto_accel_sm4_setkey_dec(sk: *mut u32, key: *const u8) {
    fatal(setkey(sk, key, Sm4Accel::derive_dec))
}

/// ECB over `len` bytes with schedule `key`.
///
/// # Safety
/// `out`/`in` must be valid for `len` bytes, `key` for 32 words.
#[no_mangle]
pub unsafe extern "C" fn crypto_accel_sm4_ecb_enc(
    out: *mut c_void,
    input: *const c_void,
    key: *const c_void,
    len: c_uint,
) {
    fatal(ecb(out, input, key, len))
}

/// CBC encryption; `iv` is updated to the last ciphertext block.
///
/// # Safety
/// As for [`crypto_accel_sm4_ecb_enc`], plus `iv` valid for 16 bytes.
#[no_mangle]
pub unsafe extern "C" fn crypto_accel_sm4_cbc_enc(
    out: *mut c_void,
    input: *const c_void,
    key: *const c_void,
    len: c_uint,
    iv: *mut c_void,
) {
    fatal(chained(Chained::CbcEncrypt, out, input, key, len, iv))
}

/// CBC decryption with a decryption schedule.
///
/// # Safety
/// As for [`crypto_accel_sm4_cbc_enc`].
#[no_mangle]
pub unsafe extern "C" fn crypto_accel_sm4_cbc_dec(
    out: *mut c_void,
    input: *const c_void,
    key: *const c_void,
    len: c_uint,
    iv: *mut c_void,
) {
    fatal(chained(Chained::CbcDecrypt, out, input, key, len, iv))
}

/// CTR with an encryption schedule; `iv` is the big-endian counter.
///
/// # Safety
/// As for [`crypto_accel_sm4_cbc_enc`].
#[no_mangle]
pub unsafe extern "C" fn crypto_accel_sm4_ctr_enc(
    out: *mut c_void,
    input: *const c_void,
    key: *const c_void,
    len: c_uint,
    iv: *mut c_void,
) {
    fatal(chained(Chained::Ctr, out, input, key, len, iv))
}

/// XTS encryption: `key1` data schedule, `key2` tweak schedule (both encrypt).
///
/// # Safety
/// `out`/`in` valid for `len` bytes, both schedules for 32 words, `iv` for 16 bytes.
#[no_mangle]
pub unsafe extern "C" fn crypto_accel_sm4_xts_enc(
    out: *mut c_void,
    input: *const c_void,
    key1: *const c_void,
    key2: *const c_void,
    len: c_uint,
    iv: *mut c_void,
) {
    fatal(xts(false, out, input, key1, key2, len, iv))
}

/// XTS decryption: `key1` decryption schedule, `key2` encryption schedule.
///
/// # Safety
/// As for [`crypto_accel_sm4_xts_enc`].
#[no_mangle]
pub unsafe extern "C" fn crypto_accel_sm4_xts_dec(
    out: *mut c_void,
    input: *const c_void,
    key1: *const c_void,
    key2: *const c_void,
    len: c_uint,
    iv: *mut c_void,
) {
    fatal(xts(true, out, input, key1, key2, len, iv))
}
