#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use halcyon_consensus::{ConsensusEngine, EngineConfig};
use halcyon_types::{ChainParams, Difficulty, Header, SizeSchedule, H256};

#[derive(Debug, Arbitrary)]
struct Input {
    version: u32,
    previous_block_hash: [u8; 32],
    merkle: [u8; 32],
    timestamp: u32,
    bits: [u8; 32],
    nonce: u64,
    mix_hash: [u8; 32],
    number: u64,
}

fn engine() -> &'static ConsensusEngine {
    static ENGINE: OnceLock<ConsensusEngine> = OnceLock::new();
    ENGINE.get_or_init(|| {
        let params = ChainParams {
            epoch_length: 4_096,
            sizes: SizeSchedule {
                cache_init: 4_096,
                cache_growth: 512,
                dataset_init: 65_536,
                dataset_growth: 4_096,
            },
            ..ChainParams::mainnet()
        };
        match ConsensusEngine::with_params(params, &EngineConfig::default()) {
            Ok(engine) => engine,
            Err(e) => panic!("fuzz engine: {e}"),
        }
    })
}

// Arbitrary seals are rejected or accepted, never an error or a panic.
fuzz_target!(|input: Input| {
    let header = Header {
        version: input.version,
        previous_block_hash: H256::new(input.previous_block_hash),
        merkle: H256::new(input.merkle),
        timestamp: input.timestamp,
        bits: Difficulty::from_big_endian(&input.bits),
        nonce: input.nonce,
        mix_hash: H256::new(input.mix_hash),
        number: input.number,
        stake: None,
    };
    let verdict = engine().verify_seal(&header);
    assert!(verdict.is_ok());
});
