//! Modes of operation over a bulk block engine.
//!
//! Parallelisable modes stage up to [`BATCH`] bytes on the stack so an
//! engine with wide lanes sees several blocks per call.

use sm4_core::{xor_in_place, Block, RoundKeys, BLOCK_SIZE};

use super::BlockEngine;

const BATCH_BLOCKS: usize = 8;
const BATCH: usize = BATCH_BLOCKS * BLOCK_SIZE;

fn load_block(bytes: &[u8]) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(bytes);
    block
}

/// Adds one to a 128-bit big-endian counter, wrapping at 2^128.
pub(crate) fn increment_be(counter: &mut Block) {
    *counter = u128::from_be_bytes(*counter).wrapping_add(1).to_be_bytes();
}

/// Multiplies an XTS tweak by alpha in GF(2^128), little-endian convention.
pub(crate) fn mul_alpha(tweak: &Block) -> Block {
    let value = u128::from_le_bytes(*tweak);
    let carry = value >> 127;
    ((value << 1) ^ (carry * 0x87)).to_le_bytes()
}

pub(crate) fn cbc_encrypt<E: BlockEngine + ?Sized>(
    engine: &E,
    rk: &RoundKeys,
    buf: &mut [u8],
    iv: &mut Block,
) {
    let mut chain = *iv;
    for block in buf.chunks_exact_mut(BLOCK_SIZE) {
        xor_in_place(block, &chain);
        engine.crypt_blocks(rk, block);
        chain.copy_from_slice(block);
    }
    *iv = chain;
}

pub(crate) fn cbc_decrypt<E: BlockEngine + ?Sized>(
    engine: &E,
    rk: &RoundKeys,
    buf: &mut [u8],
    iv: &mut Block,
) {
    let mut chain = *iv;
    let mut saved = [0u8; BATCH];
    for chunk in buf.chunks_mut(BATCH) {
        let len = chunk.len();
        saved[..len].copy_from_slice(chunk);
        engine.crypt_blocks(rk, chunk);
        xor_in_place(&mut chunk[..BLOCK_SIZE], &chain);
        xor_in_place(&mut chunk[BLOCK_SIZE..], &saved[..len - BLOCK_SIZE]);
        chain.copy_from_slice(&saved[len - BLOCK_SIZE..len]);
    }
    *iv = chain;
}

pub(crate) fn ctr_crypt<E: BlockEngine + ?Sized>(
    engine: &E,
    rk: &RoundKeys,
    buf: &mut [u8],
    iv: &mut Block,
) {
    let mut keystream = [0u8; BATCH];
    for chunk in buf.chunks_mut(BATCH) {
        let len = chunk.len();
        for block in keystream[..len].chunks_exact_mut(BLOCK_SIZE) {
            block.copy_from_slice(&iv[..]);
            increment_be(iv);
        }
        engine.crypt_blocks(rk, &mut keystream[..len]);
        xor_in_place(chunk, &keystream[..len]);
    }
}

/// XEX over whole blocks, advancing `tweak` once per block.
fn xts_bulk<E: BlockEngine + ?Sized>(
    engine: &E,
    rk: &RoundKeys,
    buf: &mut [u8],
    tweak: &mut Block,
) {
    let mut tweaks = [0u8; BATCH];
    for chunk in buf.chunks_mut(BATCH) {
        let len = chunk.len();
        for slot in tweaks[..len].chunks_exact_mut(BLOCK_SIZE) {
            slot.copy_from_slice(&tweak[..]);
            *tweak = mul_alpha(tweak);
        }
        xor_in_place(chunk, &tweaks[..len]);
        engine.crypt_blocks(rk, chunk);
        xor_in_place(chunk, &tweaks[..len]);
    }
}

fn xex_block<E: BlockEngine + ?Sized>(
    engine: &E,
    rk: &RoundKeys,
    block: &mut Block,
    tweak: &Block,
) {
    xor_in_place(block, tweak);
    engine.crypt_blocks(rk, block);
    xor_in_place(block, tweak);
}

/// Splits an XTS buffer into the whole blocks processed normally and the
/// last whole block plus partial tail that need ciphertext stealing.
fn split_for_stealing(buf: &mut [u8]) -> (&mut [u8], &mut [u8]) {
    let tail = buf.len() % BLOCK_SIZE;
    let bulk = if tail == 0 {
        buf.len()
    } else {
        buf.len() - BLOCK_SIZE - tail
    };
    buf.split_at_mut(bulk)
}

pub(crate) fn xts_encrypt<E: BlockEngine + ?Sized>(
    engine: &E,
    rk_data: &RoundKeys,
    rk_tweak: &RoundKeys,
    buf: &mut [u8],
    iv: &mut Block,
) {
    let mut tweak = *iv;
    engine.crypt_blocks(rk_tweak, &mut tweak);

    let (bulk, stolen) = split_for_stealing(buf);
    xts_bulk(engine, rk_data, bulk, &mut tweak);

    if !stolen.is_empty() {
        let tail = stolen.len() - BLOCK_SIZE;
        let next = mul_alpha(&tweak);
        let (last, partial) = stolen.split_at_mut(BLOCK_SIZE);

        let mut cc = load_block(last);
        xex_block(engine, rk_data, &mut cc, &tweak);

        let mut pp = cc;
        pp[..tail].copy_from_slice(partial);
        partial.copy_from_slice(&cc[..tail]);
        xex_block(engine, rk_data, &mut pp, &next);
        last.copy_from_slice(&pp);

        tweak = mul_alpha(&next);
    }
    *iv = tweak;
}

pub(crate) fn xts_decrypt<E: BlockEngine + ?Sized>(
    engine: &E,
    rk_data: &RoundKeys,
    rk_tweak: &RoundKeys,
    buf: &mut [u8],
    iv: &mut Block,
) {
    let mut tweak = *iv;
    engine.crypt_blocks(rk_tweak, &mut tweak);

    let (bulk, stolen) = split_for_stealing(buf);
    xts_bulk(engine, rk_data, bulk, &mut tweak);

    if !stolen.is_empty() {
        let tail = stolen.len() - BLOCK_SIZE;
        let next = mul_alpha(&tweak);
        let (last, partial) = stolen.split_at_mut(BLOCK_SIZE);

        // The last whole ciphertext block was produced under the later tweak.
        let mut pp = load_block(last);
        xex_block(engine, rk_data, &mut pp, &next);

        let mut cc = pp;
        cc[..tail].copy_from_slice(partial);
        partial.copy_from_slice(&pp[..tail]);
        xex_block(engine, rk_data, &mut cc, &tweak);
        last.copy_from_slice(&cc);

        tweak = mul_alpha(&next);
    }
    *iv = tweak;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_increments_big_endian_and_wraps() {
        let mut counter = [0u8; 16];
        counter[15] = 0xff;
        increment_be(&mut counter);
        assert_eq!(counter[14..], [0x01, 0x00]);

        let mut counter = [0xff; 16];
        increment_be(&mut counter);
        assert_eq!(counter, [0u8; 16]);
    }

    #[test]
    fn alpha_shifts_left_little_endian() {
        let mut tweak = [0u8; 16];
        tweak[0] = 0x01;
        let doubled = mul_alpha(&tweak);
        assert_eq!(doubled[0], 0x02);

        let mut tweak = [0u8; 16];
        tweak[0] = 0x80;
        let doubled = mul_alpha(&tweak);
        assert_eq!(doubled[0], 0x00);
        assert_eq!(doubled[1], 0x01);
    }

    #[test]
    fn alpha_reduces_on_carry_out() {
        let mut tweak = [0u8; 16];
        tweak[15] = 0x80;
        let doubled = mul_alpha(&tweak);
        let mut expected = [0u8; 16];
        expected[0] = 0x87;
        assert_eq!(doubled, expected);
    }

    #[test]
    fn stealing_split_points() {
        let mut aligned = [0u8; 48];
        let (bulk, stolen) = split_for_stealing(&mut aligned);
        assert_eq!((bulk.len(), stolen.len()), (48, 0));

        let mut ragged = [0u8; 53];
        let (bulk, stolen) = split_for_stealing(&mut ragged);
        assert_eq!((bulk.len(), stolen.len()), (32, 21));

        let mut short = [0u8; 20];
        let (bulk, stolen) = split_for_stealing(&mut short);
        assert_eq!((bulk.len(), stolen.len()), (0, 20));
    }
}
