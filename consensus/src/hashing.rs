//! Header digests and difficulty boundaries.
//!
//! All integers are encoded big-endian. The nonce and mix hash are excluded
//! from [`hash_head`] since they are the output of sealing, not its input.

use halcyon_crypto::keccak256_multi;
use halcyon_types::{Difficulty, Header, StakeOutput, H256, U256};

/// Canonical hash of a header's sealed fields.
pub fn hash_head(header: &Header) -> H256 {
    let mut bits = [0u8; 32];
    header.bits.to_big_endian(&mut bits);
    H256::new(keccak256_multi(&[
        &header.version.to_be_bytes(),
        &bits,
        &header.number.to_be_bytes(),
        header.merkle.as_bytes(),
        header.previous_block_hash.as_bytes(),
        &header.timestamp.to_be_bytes(),
    ]))
}

/// Hybrid hash binding a header to the output it stakes.
///
/// Used as the comparison value on the proof-of-stake path in place of a
/// dataset evaluation.
pub fn hash_head_pos(header: &Header, stake: &StakeOutput) -> H256 {
    let head = hash_head(header);
    H256::new(keccak256_multi(&[
        head.as_bytes(),
        stake.point.hash.as_bytes(),
        &stake.point.index.to_be_bytes(),
        &stake.value.to_be_bytes(),
        &stake.height.to_be_bytes(),
    ]))
}

/// Largest value a seal may produce at difficulty `bits`.
///
/// A zero difficulty yields the zero boundary, which nothing satisfies.
pub fn boundary(bits: &Difficulty) -> H256 {
    if bits.is_zero() {
        return H256::ZERO;
    }
    H256::from_u256(U256::MAX / *bits)
}
