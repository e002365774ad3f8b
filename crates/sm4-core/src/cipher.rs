//! SM4 key schedule and block transform.

use crate::block::Block;
use crate::key::{RoundKeys, Sm4Key, ROUNDS};
use crate::round::{t_data, t_key};

const FK: [u32; 4] = [0xa3b1_bac6, 0x56aa_3350, 0x677d_9197, 0xb270_22dc];

#[rustfmt::skip]
const CK: [u32; ROUNDS] = [
    0x00070e15, 0x1c232a31, 0x383f464d, 0x545b6269,
    0x70777e85, 0x8c939aa1, 0xa8afb6bd, 0xc4cbd2d9,
    0xe0e7eef5, 0xfc030a11, 0x181f262d, 0x343b4249,
    0x50575e65, 0x6c737a81, 0x888f969d, 0xa4abb2b9,
    0xc0c7ced5, 0xdce3eaf1, 0xf8ff060d, 0x141b2229,
    0x30373e45, 0x4c535a61, 0x686f767d, 0x848b9299,
    0xa0a7aeb5, 0xbcc3cad1, 0xd8dfe6ed, 0xf4fb0209,
    0x10171e25, 0x2c333a41, 0x484f565d, 0x646b7279,
];

fn load_words(bytes: &[u8; 16]) -> [u32; 4] {
    let mut words = [0u32; 4];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

/// Expands a 128-bit key into the 32 encryption round keys.
pub fn expand_key_enc(key: &Sm4Key) -> RoundKeys {
    let words = load_words(&key.0);
    let mut k = [
        words[0] ^ FK[0],
        words[1] ^ FK[1],
        words[2] ^ FK[2],
        words[3] ^ FK[3],
    ];

    let mut rk = [0u32; ROUNDS];
    for (i, slot) in rk.iter_mut().enumerate() {
        let next = k[0] ^ t_key(k[1] ^ k[2] ^ k[3] ^ CK[i]);
        k = [k[1], k[2], k[3], next];
        *slot = next;
    }
    RoundKeys(rk)
}

/// Expands a 128-bit key into the 32 decryption round keys.
pub fn expand_key_dec(key: &Sm4Key) -> RoundKeys {
    expand_key_enc(key).reversed()
}

/// Runs the 32-round transform over one block.
///
/// Encrypts with an encryption schedule and decrypts with a decryption
/// schedule.
pub fn crypt_block(block: &Block, round_keys: &RoundKeys) -> Block {
    let mut x = load_words(block);
    for &rk in round_keys.0.iter() {
        let next = x[0] ^ t_data(x[1] ^ x[2] ^ x[3] ^ rk);
        x = [x[1], x[2], x[3], next];
    }

    let mut out = [0u8; 16];
    for (chunk, word) in out.chunks_exact_mut(4).zip(x.iter().rev()) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    out
}

/// Encrypts a single block with a key, expanding the schedule on the fly.
pub fn encrypt_block(block: &Block, key: &Sm4Key) -> Block {
    crypt_block(block, &expand_key_enc(key))
}

/// Decrypts a single block with a key, expanding the schedule on the fly.
pub fn decrypt_block(block: &Block, key: &Sm4Key) -> Block {
    crypt_block(block, &expand_key_dec(key))
}
