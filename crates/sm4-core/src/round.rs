//! SM4 round transformations.

use crate::sbox::sbox;

/// Applies the S-box to each byte of a word (the non-linear `tau`).
#[inline]
pub fn tau(word: u32) -> u32 {
    let [b0, b1, b2, b3] = word.to_be_bytes();
    u32::from_be_bytes([sbox(b0), sbox(b1), sbox(b2), sbox(b3)])
}

/// Linear diffusion used by the data rounds.
#[inline]
pub fn l_data(b: u32) -> u32 {
    b ^ b.rotate_left(2) ^ b.rotate_left(10) ^ b.rotate_left(18) ^ b.rotate_left(24)
}

/// Linear diffusion used by the key expansion.
#[inline]
pub fn l_key(b: u32) -> u32 {
    b ^ b.rotate_left(13) ^ b.rotate_left(23)
}

/// Round function `T` for data rounds.
#[inline]
pub fn t_data(word: u32) -> u32 {
    l_data(tau(word))
}

/// Round function `T'` for key expansion.
#[inline]
pub fn t_key(word: u32) -> u32 {
    l_key(tau(word))
}
