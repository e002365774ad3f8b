//! Block representation helpers.

/// SM4 block of 16 bytes.
pub type Block = [u8; 16];

/// Block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// XORs `rhs` into `dst` byte by byte.
///
/// Works on whole blocks and on runs of blocks alike; only the common
/// prefix of the two slices is touched.
#[inline]
pub fn xor_in_place(dst: &mut [u8], rhs: &[u8]) {
    for (d, r) in dst.iter_mut().zip(rhs) {
        *d ^= r;
    }
}
