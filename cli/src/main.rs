//! halcyon: operator tool for the Halcyon proof-of-work core.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use halcyon_consensus::{ConsensusEngine, EngineConfig, Verdict};
use halcyon_types::{Difficulty, Header, NetworkId, StakeOutput, H256};
use halcyon_utils::{init_logging, LogFormat};
use serde::de::DeserializeOwned;

#[derive(Parser)]
#[command(name = "halcyon", version, about = "Halcyon proof-of-work and difficulty tool")]
struct Cli {
    /// Network whose constants to use: "main" or "test".
    /// Overrides the config file's network value.
    #[arg(long, env = "HALCYON_NETWORK", global = true)]
    network: Option<NetworkId>,

    /// Path to a TOML engine configuration file.
    #[arg(long, env = "HALCYON_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "HALCYON_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "HALCYON_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the epoch and seed hash for a block height.
    Seed { height: u64 },

    /// Find the first block height of the epoch seeded by a hash.
    Epoch { seed: H256 },

    /// Print the verification and mining dataset sizes for a block height.
    Sizes { height: u64 },

    /// Retarget difficulty from the parent's difficulty and both timestamps.
    Difficulty {
        /// Parent difficulty, decimal or 0x-prefixed hex.
        #[arg(long, value_parser = parse_difficulty)]
        previous_bits: Difficulty,

        /// Parent timestamp (unix seconds).
        #[arg(long)]
        previous_time: u32,

        /// Block timestamp (unix seconds).
        #[arg(long)]
        time: u32,

        /// Use the proof-of-stake retarget rule.
        #[arg(long)]
        stake: bool,
    },

    /// Verify a header read from a TOML file.
    ///
    /// With `--previous`, the difficulty is checked against the parent as
    /// well. Stake headers need `--stake` with the staked output.
    Verify {
        header: PathBuf,

        #[arg(long)]
        previous: Option<PathBuf>,

        #[arg(long)]
        stake: Option<PathBuf>,
    },
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    match s.strip_prefix("0x") {
        Some(hex) => Difficulty::from_str(hex).map_err(|e| format!("invalid hex difficulty: {e:?}")),
        None => Difficulty::from_dec_str(s).map_err(|e| format!("invalid difficulty: {e:?}")),
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

fn verify(
    engine: &ConsensusEngine,
    header: &Path,
    previous: Option<&Path>,
    stake: Option<&Path>,
) -> anyhow::Result<Verdict> {
    let header: Header = read_toml(header)?;
    let stake: Option<StakeOutput> = stake.map(read_toml::<StakeOutput>).transpose()?;

    let verdict = match previous {
        Some(path) => {
            let previous: Header = read_toml(path)?;
            engine.verify_header(&header, &previous, stake.as_ref())?
        }
        None => match (&stake, header.is_proof_of_stake()) {
            (Some(stake), true) => engine.verify_stake(&header, stake),
            (None, true) => anyhow::bail!("stake header needs --stake"),
            (_, false) => engine.verify_seal(&header)?,
        },
    };
    Ok(verdict)
}

fn run(engine: &ConsensusEngine, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Seed { height } => {
            let header = Header {
                number: height,
                ..Header::default()
            };
            println!("epoch: {}", engine.params().epoch_of(height));
            println!("seed:  0x{}", engine.seed_hash(&header)?);
        }
        Command::Epoch { seed } => {
            let number = engine.number(&seed)?;
            println!("height: {number}");
            println!("epoch:  {}", engine.params().epoch_of(number));
        }
        Command::Sizes { height } => {
            let header = Header {
                number: height,
                ..Header::default()
            };
            println!("cache: {}", engine.cache_size(&header)?);
            println!("data:  {}", engine.data_size(height)?);
        }
        Command::Difficulty {
            previous_bits,
            previous_time,
            time,
            stake,
        } => {
            let previous = Header {
                timestamp: previous_time,
                bits: previous_bits,
                ..Header::default()
            };
            let current = Header {
                timestamp: time,
                ..Header::default()
            };
            println!("{}", engine.calculate_difficulty(&current, &previous, stake));
        }
        Command::Verify {
            header,
            previous,
            stake,
        } => {
            let verdict = verify(engine, &header, previous.as_deref(), stake.as_deref())?;
            println!("{verdict}");
            if !verdict.is_accepted() {
                return Ok(ExitCode::from(2));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level);
    tracing::debug!(network = %config.network, "configuration loaded");

    let engine = ConsensusEngine::new(&config)?;
    run(&engine, cli.command)
}
