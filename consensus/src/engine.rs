//! The consensus engine: one instance per node, built once from configuration.
//!
//! Every header check flows through here. Seal verification moves a header
//! through `received -> seed derived -> dataset acquired -> evaluated` and
//! ends in a [`Verdict`]; there is no retry inside the engine.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use halcyon_types::{ChainParams, Difficulty, Header, NetworkId, StakeOutput, H256};
use halcyon_work::{
    Dataset, DatasetRegistry, EpochCache, EpochSpec, FullDataset, LightDataset, Miner,
    PowEvaluator, Solution, WorkError, WorkPackage,
};
use tracing::{debug, debug_span, info, trace};

use crate::config::EngineConfig;
use crate::difficulty::DifficultyCalculator;
use crate::hashing;
use crate::stake;
use crate::verdict::{RejectReason, Verdict};
use crate::ConsensusError;

pub struct ConsensusEngine {
    params: ChainParams,
    epochs: EpochCache,
    difficulty: DifficultyCalculator,
    lights: DatasetRegistry<LightDataset>,
    fulls: DatasetRegistry<FullDataset>,
    memory_limit: Option<u64>,
}

impl ConsensusEngine {
    /// Build an engine for the network named in `config`.
    pub fn new(config: &EngineConfig) -> Result<Self, ConsensusError> {
        Self::with_params(ChainParams::for_network(config.network), config)
    }

    /// Build an engine with explicit chain parameters.
    pub fn with_params(params: ChainParams, config: &EngineConfig) -> Result<Self, ConsensusError> {
        config.validate()?;
        if params.epoch_length == 0 {
            return Err(ConsensusError::Config("epoch_length must be positive".into()));
        }

        info!(
            network = %params.network,
            epoch_length = params.epoch_length,
            retained_epochs = config.retained_epochs,
            memory_limit = ?config.dataset_memory_limit,
            "consensus engine ready"
        );
        Ok(Self {
            epochs: EpochCache::new(params.epoch_length, params.sizes),
            difficulty: DifficultyCalculator::new(&params),
            lights: DatasetRegistry::new(config.retained_epochs),
            fulls: DatasetRegistry::new(config.retained_epochs),
            memory_limit: config.dataset_memory_limit,
            params,
        })
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn network(&self) -> NetworkId {
        self.params.network
    }

    // ── Header-level derivations ─────────────────────────────────────────

    pub fn hash_head(&self, header: &Header) -> H256 {
        hashing::hash_head(header)
    }

    pub fn hash_head_pos(&self, header: &Header, stake: &StakeOutput) -> H256 {
        hashing::hash_head_pos(header, stake)
    }

    pub fn seed_hash(&self, header: &Header) -> Result<H256, ConsensusError> {
        Ok(self.epochs.seed_hash(header.number)?)
    }

    pub fn boundary(&self, header: &Header) -> H256 {
        hashing::boundary(&header.bits)
    }

    /// First block height of the epoch seeded by `seed`.
    pub fn number(&self, seed: &H256) -> Result<u64, ConsensusError> {
        Ok(self.epochs.number(seed)?)
    }

    pub fn cache_size(&self, header: &Header) -> Result<u64, ConsensusError> {
        Ok(self.epochs.cache_size(header.number)?)
    }

    pub fn data_size(&self, number: u64) -> Result<u64, ConsensusError> {
        Ok(self.epochs.data_size(number)?)
    }

    pub fn calculate_difficulty(
        &self,
        current: &Header,
        previous: &Header,
        is_staking: bool,
    ) -> Difficulty {
        self.difficulty.calculate(current, previous, is_staking)
    }

    pub fn work_package(&self, header: &Header) -> Result<WorkPackage, ConsensusError> {
        Ok(WorkPackage {
            boundary: self.boundary(header),
            header_hash: self.hash_head(header),
            seed_hash: self.seed_hash(header)?,
        })
    }

    // ── Datasets ─────────────────────────────────────────────────────────

    /// Shared verification dataset for the epoch of block `number`.
    pub fn light_dataset(&self, number: u64) -> Result<Arc<LightDataset>, ConsensusError> {
        self.light_for(&self.epochs.spec(number)?)
    }

    /// Shared mining dataset for the epoch of block `number`.
    ///
    /// `progress` runs only if this call performs the build; a caller that
    /// joins a build already in flight waits for it instead.
    pub fn full_dataset<F>(
        &self,
        number: u64,
        progress: F,
    ) -> Result<Arc<FullDataset>, ConsensusError>
    where
        F: FnMut(u8) -> ControlFlow<()>,
    {
        let spec = self.epochs.spec(number)?;
        let light = self.light_for(&spec)?;
        let full = self.fulls.acquire(&spec.seed, || {
            FullDataset::build(&light, self.memory_limit, progress)
        })?;
        Ok(full)
    }

    fn light_for(&self, spec: &EpochSpec) -> Result<Arc<LightDataset>, ConsensusError> {
        let light = self
            .lights
            .acquire(&spec.seed, || LightDataset::build(spec, self.memory_limit))?;
        Ok(light)
    }

    /// A mining dataset if one is live for `spec`, else the verification dataset.
    fn dataset_for(&self, spec: &EpochSpec) -> Result<Arc<dyn Dataset>, ConsensusError> {
        let dataset: Arc<dyn Dataset> = match self.fulls.get(&spec.seed) {
            Some(full) => full,
            None => self.light_for(spec)?,
        };
        Ok(dataset)
    }

    // ── Verification ─────────────────────────────────────────────────────

    /// Check the proof-of-work seal of `header`.
    ///
    /// Errors are reserved for failures to evaluate at all (a dataset that
    /// cannot be allocated); an invalid seal is `Ok(Verdict::Rejected(..))`.
    /// So is a height past the last derivable epoch, which is refused before
    /// any seed hashing.
    pub fn verify_seal(&self, header: &Header) -> Result<Verdict, ConsensusError> {
        let span = debug_span!("verify_seal", number = header.number);
        let _enter = span.enter();
        trace!("received");

        let spec = match self.epochs.spec(header.number) {
            Ok(spec) => spec,
            Err(WorkError::EpochOutOfRange { epoch, max }) => {
                debug!(epoch, max, "seal rejected: epoch out of range");
                return Ok(Verdict::Rejected(RejectReason::EpochOutOfRange { epoch, max }));
            }
            Err(e) => return Err(e.into()),
        };
        trace!(epoch = spec.epoch, seed = %spec.seed, "seed derived");

        let dataset = self.dataset_for(&spec)?;
        trace!("dataset acquired");

        let package = WorkPackage {
            boundary: hashing::boundary(&header.bits),
            header_hash: hashing::hash_head(header),
            seed_hash: spec.seed,
        };
        let solution = Solution {
            nonce: header.nonce,
            mix_hash: header.mix_hash,
        };
        let outcome = PowEvaluator::evaluate(dataset.as_ref(), &package, &solution);
        trace!(?outcome, "evaluated");

        let verdict = Verdict::from(outcome);
        match &verdict {
            Verdict::Accepted => debug!("seal accepted"),
            Verdict::Rejected(reason) => debug!(%reason, "seal rejected"),
        }
        Ok(verdict)
    }

    /// Check that `current` carries the difficulty retargeted from `previous`.
    pub fn verify_difficulty(&self, current: &Header, previous: &Header) -> Verdict {
        let expected = self.calculate_difficulty(current, previous, current.is_proof_of_stake());
        if current.bits == expected {
            Verdict::Accepted
        } else {
            debug!(number = current.number, %expected, actual = %current.bits, "difficulty mismatch");
            Verdict::Rejected(RejectReason::DifficultyMismatch {
                expected,
                actual: current.bits,
            })
        }
    }

    /// Check the proof-of-stake seal of `header` against the output it stakes.
    pub fn verify_stake(&self, header: &Header, stake: &StakeOutput) -> Verdict {
        stake::verify_stake(&self.params.stake, header, stake)
    }

    /// Full header check: difficulty against the parent, then the seal on
    /// whichever path the header takes.
    ///
    /// A stake header needs its staked output; without one it is rejected.
    pub fn verify_header(
        &self,
        header: &Header,
        previous: &Header,
        stake: Option<&StakeOutput>,
    ) -> Result<Verdict, ConsensusError> {
        let verdict = self.verify_difficulty(header, previous);
        if !verdict.is_accepted() {
            return Ok(verdict);
        }
        match (header.is_proof_of_stake(), stake) {
            (false, _) => self.verify_seal(header),
            (true, Some(stake)) => Ok(self.verify_stake(header, stake)),
            (true, None) => Ok(Verdict::Rejected(RejectReason::MissingStake)),
        }
    }

    // ── Mining ───────────────────────────────────────────────────────────

    /// Search for a seal for `header`, returning the sealed header if one is
    /// found within `max_attempts` nonces.
    ///
    /// Builds (or joins) the mining dataset for the header's epoch first.
    /// `cancel` also aborts that build.
    pub fn mine(
        &self,
        header: &Header,
        start_nonce: u64,
        max_attempts: u64,
        cancel: &AtomicBool,
    ) -> Result<Option<Header>, ConsensusError> {
        let package = self.work_package(header)?;
        let full = self.full_dataset(header.number, |_| {
            if cancel.load(Ordering::Relaxed) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        let solution = Miner.search(full.as_ref(), &package, start_nonce, max_attempts, cancel)?;
        Ok(solution.map(|solution| Header {
            nonce: solution.nonce,
            mix_hash: solution.mix_hash,
            ..header.clone()
        }))
    }

    /// Number of seeds with a live verification and mining dataset.
    pub fn live_datasets(&self) -> (usize, usize) {
        (self.lights.live(), self.fulls.live())
    }
}

impl std::fmt::Debug for ConsensusEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusEngine")
            .field("network", &self.params.network)
            .field("epoch_length", &self.params.epoch_length)
            .field("cached_epochs", &self.epochs.cached_epochs())
            .field("memory_limit", &self.memory_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halcyon_types::{OutputPoint, SizeSchedule, COIN};

    const TINY_SCHEDULE: SizeSchedule = SizeSchedule {
        cache_init: 4_096,
        cache_growth: 512,
        dataset_init: 65_536,
        dataset_growth: 4_096,
    };

    fn tiny_params() -> ChainParams {
        ChainParams {
            epoch_length: 100,
            sizes: TINY_SCHEDULE,
            ..ChainParams::mainnet()
        }
    }

    fn engine() -> ConsensusEngine {
        ConsensusEngine::with_params(tiny_params(), &EngineConfig::default()).unwrap()
    }

    fn header(number: u64, bits: u64) -> Header {
        Header {
            version: 1,
            previous_block_hash: H256::new([0x10; 32]),
            merkle: H256::new([0x20; 32]),
            timestamp: 1_700_000_000,
            bits: Difficulty::from(bits),
            number,
            ..Header::default()
        }
    }

    fn mined(engine: &ConsensusEngine, header: &Header) -> Header {
        engine
            .mine(header, 0, 100_000, &AtomicBool::new(false))
            .unwrap()
            .expect("a seal at difficulty 16")
    }

    #[test]
    fn mined_header_is_accepted() {
        let engine = engine();
        let sealed = mined(&engine, &header(5, 16));
        assert_eq!(engine.verify_seal(&sealed).unwrap(), Verdict::Accepted);
    }

    #[test]
    fn tampered_mix_is_rejected() {
        let engine = engine();
        let sealed = mined(&engine, &header(5, 16));
        let tampered = Header {
            mix_hash: H256::new([0xEE; 32]),
            ..sealed
        };
        assert_eq!(
            engine.verify_seal(&tampered).unwrap(),
            Verdict::Rejected(RejectReason::MixMismatch)
        );
    }

    #[test]
    fn matching_mix_above_boundary_is_rejected() {
        let engine = engine();
        let unsealed = header(5, 0);
        let hard = Header {
            bits: Difficulty::MAX,
            ..unsealed
        };
        let result = engine
            .light_dataset(5)
            .unwrap()
            .compute(&engine.hash_head(&hard), 0);
        let claimed = Header {
            nonce: 0,
            mix_hash: result.mix_hash,
            ..hard
        };
        assert_eq!(
            engine.verify_seal(&claimed).unwrap(),
            Verdict::Rejected(RejectReason::AboveBoundary)
        );
    }

    #[test]
    fn full_dataset_verifies_the_same() {
        let sealed = mined(&engine(), &header(150, 16));
        let engine = engine();
        let light_verdict = engine.verify_seal(&sealed).unwrap();

        let full = engine
            .full_dataset(150, |_| ControlFlow::Continue(()))
            .unwrap();
        assert_eq!(full.epoch(), 1);
        assert_eq!(engine.verify_seal(&sealed).unwrap(), light_verdict);
        assert_eq!(light_verdict, Verdict::Accepted);
    }

    #[test]
    fn concurrent_verifications_share_one_dataset() {
        let sealed = mined(&engine(), &header(320, 16));
        let verifier = engine();
        let verdicts: Vec<Verdict> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| verifier.verify_seal(&sealed).unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert!(verdicts.iter().all(Verdict::is_accepted));
        assert_eq!(verifier.live_datasets(), (1, 0));
    }

    #[test]
    fn datasets_are_shared_per_epoch() {
        let engine = engine();
        let a = engine.light_dataset(0).unwrap();
        let b = engine.light_dataset(99).unwrap();
        let c = engine.light_dataset(100).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn memory_limit_surfaces_as_error() {
        let config = EngineConfig {
            dataset_memory_limit: Some(1_024),
            ..EngineConfig::default()
        };
        let engine = ConsensusEngine::with_params(tiny_params(), &config).unwrap();
        let err = engine.verify_seal(&header(0, 16)).unwrap_err();
        assert!(matches!(
            err,
            ConsensusError::Work(halcyon_work::WorkError::Allocation { .. })
        ));
        assert_eq!(engine.live_datasets(), (0, 0));
    }

    #[test]
    fn seed_and_number_round_trip() {
        let engine = engine();
        let h = header(250, 1);
        let seed = engine.seed_hash(&h).unwrap();
        assert_eq!(engine.number(&seed).unwrap(), 200);
        assert!(engine.number(&H256::new([0xAB; 32])).is_err());
    }

    #[test]
    fn mainnet_epoch_boundary_scenario() {
        let engine = ConsensusEngine::new(&EngineConfig::default()).unwrap();
        let genesis = header(0, 1);
        let next_epoch = header(30_000, 1);
        assert_ne!(
            engine.seed_hash(&genesis).unwrap(),
            engine.seed_hash(&next_epoch).unwrap()
        );
        assert!(engine.data_size(30_000).unwrap() > engine.data_size(0).unwrap());
        assert_eq!(engine.cache_size(&genesis).unwrap(), 16_776_896);
        assert_eq!(engine.data_size(0).unwrap(), 1_073_739_904);
    }

    #[test]
    fn testnet_engine_uses_testnet_constants() {
        let config = EngineConfig {
            network: NetworkId::Test,
            ..EngineConfig::default()
        };
        let engine = ConsensusEngine::new(&config).unwrap();
        assert_eq!(engine.network(), NetworkId::Test);
        assert_eq!(engine.params().epoch_length, 3_000);
        assert_ne!(engine.seed_hash(&header(3_000, 1)).unwrap(), H256::ZERO);
    }

    #[test]
    fn difficulty_check_uses_block_kind() {
        let engine = engine();
        let previous = Header {
            timestamp: 1_000,
            ..header(9, 1_000_000_000)
        };
        let mut work = Header {
            timestamp: 1_020,
            ..header(10, 0)
        };
        work.bits = engine.calculate_difficulty(&work, &previous, false);
        assert_eq!(engine.verify_difficulty(&work, &previous), Verdict::Accepted);

        let staked = Header {
            stake: Some(OutputPoint::default()),
            ..work.clone()
        };
        assert!(matches!(
            engine.verify_difficulty(&staked, &previous),
            Verdict::Rejected(RejectReason::DifficultyMismatch { .. })
        ));
    }

    #[test]
    fn stake_header_without_output_is_rejected() {
        let engine = engine();
        let previous = header(9, 1_000_000_000);
        let mut staked = Header {
            stake: Some(OutputPoint::default()),
            ..header(10, 0)
        };
        staked.bits = engine.calculate_difficulty(&staked, &previous, true);
        assert_eq!(
            engine.verify_header(&staked, &previous, None).unwrap(),
            Verdict::Rejected(RejectReason::MissingStake)
        );

        let output = StakeOutput {
            point: OutputPoint::default(),
            value: 10_000 * COIN,
            height: 0,
        };
        // Ten blocks deep is far short of the mainnet maturity rule.
        assert!(matches!(
            engine.verify_header(&staked, &previous, Some(&output)).unwrap(),
            Verdict::Rejected(RejectReason::StakeImmature { .. })
        ));
    }

    #[test]
    fn cancelled_mining_returns_error() {
        let engine = engine();
        let result = engine.mine(&header(5, u64::MAX), 0, u64::MAX, &AtomicBool::new(true));
        assert!(matches!(
            result,
            Err(ConsensusError::Work(halcyon_work::WorkError::Cancelled))
        ));
    }

    #[test]
    fn mining_builds_the_mining_dataset() {
        let engine = engine();
        let sealed = mined(&engine, &header(5, 16));
        assert_eq!(engine.live_datasets(), (1, 1));
        assert_eq!(engine.verify_seal(&sealed).unwrap(), Verdict::Accepted);
    }

    #[test]
    fn height_past_last_epoch_is_rejected_without_work() {
        let engine = engine();
        let started = std::time::Instant::now();
        let verdict = engine.verify_seal(&header(u64::MAX, 16)).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Rejected(RejectReason::EpochOutOfRange { max: halcyon_work::MAX_EPOCH, .. })
        ));
        assert!(engine.seed_hash(&header(u64::MAX, 16)).is_err());
        assert!(engine.data_size(u64::MAX).is_err());
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(engine.live_datasets(), (0, 0));
    }

    #[test]
    fn height_past_last_epoch_cannot_be_mined() {
        let engine = engine();
        let result = engine.mine(&header(u64::MAX, 16), 0, 1, &AtomicBool::new(false));
        assert!(matches!(
            result,
            Err(ConsensusError::Work(halcyon_work::WorkError::EpochOutOfRange { .. }))
        ));
    }
}
