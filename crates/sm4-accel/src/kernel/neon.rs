//! AArch64 Advanced SIMD kernel.
//!
//! Four blocks run side by side, one 32-bit word of each block per lane.
//! The S-box is evaluated with four 64-byte `TBL`/`TBX` lookups, the linear
//! layer with shift-and-insert rotations. Fewer than four remaining blocks
//! go through the portable path.

use core::arch::aarch64::*;

use sm4_core::{sbox_table, RoundKeys, BLOCK_SIZE};

use super::{impl_kernel_for_engine, BlockEngine, Portable};

const LANES: usize = 4;
const QUAD: usize = LANES * BLOCK_SIZE;

/// NEON kernel. Only valid where [`Neon::is_available`] holds.
#[derive(Clone, Copy, Debug, Default)]
pub struct Neon;

impl Neon {
    /// Runtime check for Advanced SIMD.
    pub fn is_available() -> bool {
        std::arch::is_aarch64_feature_detected!("neon")
    }
}

impl BlockEngine for Neon {
    fn crypt_blocks(&self, rk: &RoundKeys, blocks: &mut [u8]) {
        let mut quads = blocks.chunks_exact_mut(QUAD);
        for quad in &mut quads {
            let mut words = [0u32; LANES * 4];
            for (word, bytes) in words.iter_mut().zip(quad.chunks_exact(4)) {
                *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            // SAFETY: this kernel is only selected once NEON has been detected,
            // and `words` holds exactly four blocks.
            unsafe { crypt4(rk, &mut words) };
            for (bytes, word) in quad.chunks_exact_mut(4).zip(words.iter()) {
                bytes.copy_from_slice(&word.to_be_bytes());
            }
        }
        Portable.crypt_blocks(rk, quads.into_remainder());
    }
}

impl_kernel_for_engine!(Neon, "aarch64/neon");

macro_rules! rol {
    ($x:expr, $n:literal) => {
        vsliq_n_u32::<$n>(vshrq_n_u32::<{ 32 - $n }>($x), $x)
    };
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn load_quarter(table: *const u8) -> uint8x16x4_t {
    uint8x16x4_t(
        vld1q_u8(table),
        vld1q_u8(table.add(16)),
        vld1q_u8(table.add(32)),
        vld1q_u8(table.add(48)),
    )
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn load_sbox() -> [uint8x16x4_t; 4] {
    let table = sbox_table().as_ptr();
    [
        load_quarter(table),
        load_quarter(table.add(64)),
        load_quarter(table.add(128)),
        load_quarter(table.add(192)),
    ]
}

/// Byte-wise S-box over all sixteen bytes of `x`.
#[inline]
#[target_feature(enable = "neon")]
unsafe fn tau(sbox: &[uint8x16x4_t; 4], x: uint32x4_t) -> uint32x4_t {
    let step = vdupq_n_u8(64);
    let mut idx = vreinterpretq_u8_u32(x);
    let mut out = vqtbl4q_u8(sbox[0], idx);
    for quarter in &sbox[1..] {
        idx = vsubq_u8(idx, step);
        out = vqtbx4q_u8(out, *quarter, idx);
    }
    vreinterpretq_u32_u8(out)
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn l_data(b: uint32x4_t) -> uint32x4_t {
    let r2 = rol!(b, 2);
    let r10 = rol!(b, 10);
    let r18 = rol!(b, 18);
    let r24 = rol!(b, 24);
    veorq_u32(veorq_u32(b, r2), veorq_u32(veorq_u32(r10, r18), r24))
}

/// Runs 32 rounds over four blocks held as big-endian-decoded words.
#[target_feature(enable = "neon")]
unsafe fn crypt4(rk: &RoundKeys, words: &mut [u32; LANES * 4]) {
    let sbox = load_sbox();
    let lanes = vld4q_u32(words.as_ptr());
    let (mut x0, mut x1, mut x2, mut x3) = (lanes.0, lanes.1, lanes.2, lanes.3);

    for &k in rk.0.iter() {
        let mix = veorq_u32(veorq_u32(x1, x2), veorq_u32(x3, vdupq_n_u32(k)));
        let next = veorq_u32(x0, l_data(tau(&sbox, mix)));
        x0 = x1;
        x1 = x2;
        x2 = x3;
        x3 = next;
    }

    vst4q_u32(words.as_mut_ptr(), uint32x4x4_t(x3, x2, x1, x0));
}
