//! Key types for SM4.

/// Number of rounds, and therefore of round-key words.
pub const ROUNDS: usize = 32;

/// Raw 128-bit SM4 key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sm4Key(pub [u8; 16]);

impl From<[u8; 16]> for Sm4Key {
    fn from(value: [u8; 16]) -> Self {
        Self(value)
    }
}

/// Expanded round keys, one 32-bit word per round.
///
/// The same layout serves both directions; a decryption schedule is the
/// encryption schedule in reverse round order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundKeys(pub [u32; ROUNDS]);

impl RoundKeys {
    /// An all-zero schedule, to be filled by a key expansion.
    pub const fn zeroed() -> Self {
        Self([0u32; ROUNDS])
    }

    /// Returns the round key for the requested round (0..32).
    #[inline]
    pub fn get(&self, round: usize) -> u32 {
        self.0[round]
    }

    /// Returns the same schedule with the round order reversed.
    pub fn reversed(&self) -> Self {
        let mut words = self.0;
        words.reverse();
        Self(words)
    }
}

impl Default for RoundKeys {
    fn default() -> Self {
        Self::zeroed()
    }
}
