//! Software kernel on top of the reference block transform.

use sm4_core::{crypt_block, RoundKeys, BLOCK_SIZE};

use super::{impl_kernel_for_engine, BlockEngine};

/// Always-available fallback kernel.
#[derive(Clone, Copy, Debug, Default)]
pub struct Portable;

impl BlockEngine for Portable {
    fn crypt_blocks(&self, rk: &RoundKeys, blocks: &mut [u8]) {
        let mut block = [0u8; BLOCK_SIZE];
        for chunk in blocks.chunks_exact_mut(BLOCK_SIZE) {
            block.copy_from_slice(chunk);
            chunk.copy_from_slice(&crypt_block(&block, rk));
        }
    }
}

impl_kernel_for_engine!(Portable, "portable");
