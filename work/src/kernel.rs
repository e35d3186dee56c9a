//! The memory-hard hash kernel.
//!
//! Bit-compatible with the reference scheme the chain forked from:
//! a Keccak-512 chained cache mixed over three rounds, dataset items derived
//! from 256 pseudo-random cache parents, and 64 page accesses per nonce folded
//! with FNV. All words are little-endian `u32`.

use halcyon_crypto::{keccak256_multi, keccak512, keccak512_multi};
use halcyon_types::H256;

use crate::evaluator::PowResult;
use crate::WorkError;

pub(crate) const HASH_BYTES: usize = 64;
pub(crate) const MIX_BYTES: usize = 128;
const NODE_WORDS: usize = HASH_BYTES / 4;
const MIX_WORDS: usize = MIX_BYTES / 4;
const MIX_NODES: usize = MIX_BYTES / HASH_BYTES;
const CACHE_ROUNDS: usize = 3;
const DATASET_PARENTS: u32 = 256;
const ACCESSES: u32 = 64;
const FNV_PRIME: u32 = 0x0100_0193;

/// One 64-byte dataset item as sixteen little-endian words.
pub(crate) type Node = [u32; NODE_WORDS];

#[inline]
fn fnv(a: u32, b: u32) -> u32 {
    a.wrapping_mul(FNV_PRIME) ^ b
}

fn node_from_bytes(bytes: &[u8; HASH_BYTES]) -> Node {
    let mut node = [0u32; NODE_WORDS];
    for (word, chunk) in node.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    node
}

fn node_to_bytes(node: &Node) -> [u8; HASH_BYTES] {
    let mut bytes = [0u8; HASH_BYTES];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(node) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}

fn hash_node(node: &Node) -> Node {
    node_from_bytes(&keccak512(&node_to_bytes(node)))
}

/// Reserve room for `count` nodes, reporting refusal (or a breached
/// `memory_limit`) as [`WorkError::Allocation`] instead of aborting.
pub(crate) fn allocate_nodes(count: u64, memory_limit: Option<u64>) -> Result<Vec<Node>, WorkError> {
    let bytes = count.saturating_mul(HASH_BYTES as u64);
    if memory_limit.is_some_and(|limit| bytes > limit) {
        return Err(WorkError::Allocation { bytes });
    }
    let count = usize::try_from(count).map_err(|_| WorkError::Allocation { bytes })?;
    let mut nodes = Vec::new();
    nodes
        .try_reserve_exact(count)
        .map_err(|_| WorkError::Allocation { bytes })?;
    Ok(nodes)
}

/// Build the verification cache for `seed`.
pub(crate) fn make_cache(
    cache_size: u64,
    seed: &H256,
    memory_limit: Option<u64>,
) -> Result<Vec<Node>, WorkError> {
    let count = cache_size / HASH_BYTES as u64;
    if count == 0 {
        return Err(WorkError::InvalidSize { bytes: cache_size });
    }
    let mut cache = allocate_nodes(count, memory_limit)?;

    let mut item = node_from_bytes(&keccak512(seed.as_bytes()));
    cache.push(item);
    for _ in 1..count {
        item = hash_node(&item);
        cache.push(item);
    }

    let n = cache.len();
    for _ in 0..CACHE_ROUNDS {
        for i in 0..n {
            let source = cache[i][0] as usize % n;
            let previous = cache[(i + n - 1) % n];
            let mut mixed = [0u32; NODE_WORDS];
            for (k, word) in mixed.iter_mut().enumerate() {
                *word = previous[k] ^ cache[source][k];
            }
            cache[i] = hash_node(&mixed);
        }
    }
    Ok(cache)
}

/// Derive mining dataset item `index` from the verification cache.
pub(crate) fn dataset_item(cache: &[Node], index: u32) -> Node {
    let n = cache.len();
    let mut mix = cache[index as usize % n];
    mix[0] ^= index;
    mix = hash_node(&mix);
    for parent in 0..DATASET_PARENTS {
        let source = fnv(index ^ parent, mix[parent as usize % NODE_WORDS]) as usize % n;
        let item = &cache[source];
        for (word, other) in mix.iter_mut().zip(item) {
            *word = fnv(*word, *other);
        }
    }
    hash_node(&mix)
}

/// Number of mining dataset items in `data_size` bytes. Items are indexed
/// by `u32`, so anything larger is an invalid size.
pub(crate) fn item_count(data_size: u64) -> Result<u32, WorkError> {
    u32::try_from(data_size / HASH_BYTES as u64)
        .map_err(|_| WorkError::InvalidSize { bytes: data_size })
}

/// Evaluate one nonce over a dataset of `items` items. `lookup` returns
/// mining dataset item `i`, either precomputed or derived on demand; both
/// paths must agree.
pub(crate) fn hashimoto<F>(header_hash: &H256, nonce: u64, items: u32, lookup: F) -> PowResult
where
    F: Fn(u32) -> Node,
{
    let pages = items / MIX_NODES as u32;
    let seed = keccak512_multi(&[header_hash.as_bytes(), &nonce.to_le_bytes()]);
    let seed_words = node_from_bytes(&seed);

    let mut mix = [0u32; MIX_WORDS];
    for (i, word) in mix.iter_mut().enumerate() {
        *word = seed_words[i % NODE_WORDS];
    }

    for access in 0..ACCESSES {
        let page = fnv(access ^ seed_words[0], mix[access as usize % MIX_WORDS]) % pages;
        for part in 0..MIX_NODES {
            let item = lookup(page * MIX_NODES as u32 + part as u32);
            let words = &mut mix[part * NODE_WORDS..(part + 1) * NODE_WORDS];
            for (word, other) in words.iter_mut().zip(item.iter()) {
                *word = fnv(*word, *other);
            }
        }
    }

    let mut compressed = [0u8; 32];
    for (out, words) in compressed.chunks_exact_mut(4).zip(mix.chunks_exact(4)) {
        let folded = fnv(fnv(fnv(words[0], words[1]), words[2]), words[3]);
        out.copy_from_slice(&folded.to_le_bytes());
    }

    PowResult {
        value: H256::new(keccak256_multi(&[&seed, &compressed])),
        mix_hash: H256::new(compressed),
    }
}
