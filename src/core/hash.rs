//! State Hashing for Verification
//!
//! Deterministic SHA-256 digests of game state, used to check that two
//! engines fed the same seed and inputs end up in the same place, and
//! that undoing a provisional ability leaves the board untouched.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for game state.
///
/// Order of updates is part of the format.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for full game state.
    pub fn for_game_state() -> Self {
        Self::new(b"COLAPSI_STATE_V1")
    }

    /// Create hasher for the board alone.
    pub fn for_board() -> Self {
        Self::new(b"COLAPSI_BOARD_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a usize, widened to u64.
    #[inline]
    pub fn update_usize(&mut self, value: usize) {
        self.update_u64(value as u64);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for game verification.
///
/// Called by `GameState::compute_hash()`; the closure adds the
/// game-specific data after the turn counter and seed.
pub fn compute_state_hash<F>(turn_number: u32, rng_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_game_state();

    hasher.update_u32(turn_number);
    hasher.update_u64(rng_seed);

    add_state(&mut hasher);

    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hasher_determinism() {
        let mut h1 = StateHasher::for_board();
        let mut h2 = StateHasher::for_board();

        h1.update_u8(3);
        h1.update_str("7♠");
        h2.update_u8(3);
        h2.update_str("7♠");

        assert_eq!(h1.finalize(), h2.finalize());
    }

    #[test]
    fn test_domain_separation() {
        let mut h1 = StateHasher::for_board();
        let mut h2 = StateHasher::for_game_state();
        h1.update_u32(1);
        h2.update_u32(1);
        assert_ne!(h1.finalize(), h2.finalize());
    }

    #[test]
    fn test_compute_state_hash_includes_turn() {
        let a = compute_state_hash(1, 42, |h| h.update_bool(true));
        let b = compute_state_hash(2, 42, |h| h.update_bool(true));
        assert_ne!(a, b);
    }
}
