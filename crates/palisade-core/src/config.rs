/// DEPLOYMENT CONFIGURATION
///
/// Every numeric threshold in the pipeline lives here so a deployment can
/// override it at startup. Validation is fail-fast: a config that violates
/// an invariant (weights not summing to 1.0, inverted bands, zero timeouts)
/// must prevent the pipeline from serving traffic, never silently default.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Credibility weights sum to {0}, expected 1.0")]
    WeightsNotNormalized(f64),

    #[error("Value band is inverted: min {min} > max {max}")]
    InvertedValueBand { min: f64, max: f64 },

    #[error("Quorum {quorum} exceeds party count {parties}")]
    QuorumExceedsParties { quorum: usize, parties: usize },

    #[error("Quorum must be at least 1")]
    ZeroQuorum,

    #[error("Party timeout must be non-zero")]
    ZeroTimeout,

    #[error("Consensus deviation tolerance must be positive, got {0}")]
    NonPositiveTolerance(f64),

    #[error("Credibility tier boundaries must be strictly increasing: {0} / {1} / {2}")]
    UnorderedTierBounds(f64, f64, f64),

    #[error("Threshold {name} must be within [0,1], got {value}")]
    UnitIntervalViolation { name: &'static str, value: f64 },

    #[error("Threshold {name} must be positive, got {value}")]
    NonPositiveThreshold { name: &'static str, value: f64 },

    #[error("No address grammars configured")]
    NoAddressGrammars,

    #[error("Batch concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Address grammars the input validator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressGrammar {
    /// 0x-prefixed, 40 hex chars
    Evm,
    /// Base58, 32-44 chars
    Solana,
    /// bech32 with `cosmos1` prefix
    Cosmos,
}

/// Thresholds for the structural input checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub min_wallet_age_days: u32,
    pub min_trade_count: u32,
    pub min_value_usd: f64,
    pub max_value_usd: f64,
    pub address_grammars: Vec<AddressGrammar>,
    /// Wallets rejected outright
    pub blocklist: HashSet<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            min_wallet_age_days: 30,
            min_trade_count: 10,
            min_value_usd: 100.0,
            max_value_usd: 10_000_000.0,
            address_grammars: vec![
                AddressGrammar::Evm,
                AddressGrammar::Solana,
                AddressGrammar::Cosmos,
            ],
            blocklist: HashSet::new(),
        }
    }
}

/// Thresholds for the five statistical window checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Trailing-hour rate must stay below this multiple of the 24h mean
    pub volume_spike_multiplier: f64,
    /// Dominant pattern share above which repetition is flagged
    pub pattern_repetition_fraction: f64,
    /// Mean pairwise cross-chain correlation below this is flagged
    pub correlation_floor: f64,
    /// Variance/mean of inter-event deltas below this is flagged
    pub timing_cv_ceiling: f64,
    /// Two same-wallet events closer than this are sequence candidates
    pub sequence_interval_secs: i64,
    /// Value jump factor that makes a close pair impossible
    pub sequence_value_multiplier: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        AnomalyConfig {
            volume_spike_multiplier: 10.0,
            pattern_repetition_fraction: 0.8,
            correlation_floor: 0.3,
            timing_cv_ceiling: 0.1,
            sequence_interval_secs: 60,
            sequence_value_multiplier: 10.0,
        }
    }
}

/// Multi-party consensus parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Minimum surviving submissions before a decision may be reached
    pub quorum: usize,
    /// Per-party response deadline
    pub party_timeout_ms: u64,
    /// Allowed mean absolute deviation, as a fraction of the median
    pub deviation_tolerance: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            quorum: 3,
            party_timeout_ms: 5_000,
            deviation_tolerance: 0.05,
        }
    }
}

/// Fixed weights of the credibility components. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CredibilityWeights {
    pub age: f64,
    pub volume: f64,
    pub cross_chain: f64,
    pub identity: f64,
    pub custody: f64,
    pub reputation: f64,
}

impl CredibilityWeights {
    pub fn sum(&self) -> f64 {
        self.age + self.volume + self.cross_chain + self.identity + self.custody + self.reputation
    }
}

impl Default for CredibilityWeights {
    fn default() -> Self {
        CredibilityWeights {
            age: 0.20,
            volume: 0.20,
            cross_chain: 0.15,
            identity: 0.15,
            custody: 0.10,
            reputation: 0.20,
        }
    }
}

/// Credibility scoring parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredibilityConfig {
    pub weights: CredibilityWeights,
    /// Age sub-score saturates at this many days
    pub age_cap_days: u32,
    /// Volume earning a full volume sub-score, USD
    pub volume_reference_usd: f64,
    /// Cross-chain volume earning a full footprint contribution, USD
    pub cross_chain_reference_usd: f64,
    /// Active chains earning a full footprint contribution
    pub chain_cap: u32,
    /// Linked identity signals earning a full identity sub-score
    pub identity_cap: u32,
    /// Weighting floor: events are never scaled below this
    pub weight_floor: f64,
    /// Tier boundaries (Low / Medium / High)
    pub tier_low: f64,
    pub tier_medium: f64,
    pub tier_high: f64,
    /// Score assigned when no profile is available
    pub default_score: f64,
}

impl Default for CredibilityConfig {
    fn default() -> Self {
        CredibilityConfig {
            weights: CredibilityWeights::default(),
            age_cap_days: 365,
            volume_reference_usd: 1_000_000.0,
            cross_chain_reference_usd: 100_000.0,
            chain_cap: 5,
            identity_cap: 3,
            weight_floor: 0.1,
            tier_low: 0.2,
            tier_medium: 0.4,
            tier_high: 0.7,
            default_score: 0.5,
        }
    }
}

/// How layer outcomes combine into the overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyMode {
    /// All layers must pass: input, anomaly tolerance, consensus reached,
    /// credibility at or above minimum
    Strict,
    /// Input and consensus (with confidence) must pass; credibility binds
    /// only when a profile was supplied
    Lenient,
}

/// Verdict combination policy. Mode is a deployment switch, never per-event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub mode: PolicyMode,
    /// Anomaly count above this terminates the run
    pub anomaly_tolerance: usize,
    /// Minimum credibility for a valid verdict
    pub min_credibility: f64,
    /// Minimum consensus confidence (Lenient mode)
    pub min_consensus_confidence: f64,
    /// Concurrent validations during batch processing
    pub max_batch_concurrency: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            mode: PolicyMode::Strict,
            anomaly_tolerance: 2,
            min_credibility: 0.4,
            min_consensus_confidence: 0.5,
            max_batch_concurrency: 8,
        }
    }
}

/// Complete deployment configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub credibility: CredibilityConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl PipelineConfig {
    /// Load from a JSON file. Missing sections fall back to defaults;
    /// the result is still subject to `validate`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Fail-fast invariant checks, run before the pipeline serves traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.address_grammars.is_empty() {
            return Err(ConfigError::NoAddressGrammars);
        }
        if self.input.min_value_usd > self.input.max_value_usd {
            return Err(ConfigError::InvertedValueBand {
                min: self.input.min_value_usd,
                max: self.input.max_value_usd,
            });
        }

        for (name, value) in [
            ("volume_spike_multiplier", self.anomaly.volume_spike_multiplier),
            ("sequence_value_multiplier", self.anomaly.sequence_value_multiplier),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositiveThreshold { name, value });
            }
        }
        for (name, value) in [
            ("pattern_repetition_fraction", self.anomaly.pattern_repetition_fraction),
            ("correlation_floor", self.anomaly.correlation_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::UnitIntervalViolation { name, value });
            }
        }

        if self.consensus.quorum == 0 {
            return Err(ConfigError::ZeroQuorum);
        }
        if self.consensus.party_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.consensus.deviation_tolerance <= 0.0 {
            return Err(ConfigError::NonPositiveTolerance(
                self.consensus.deviation_tolerance,
            ));
        }

        let weight_sum = self.credibility.weights.sum();
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightsNotNormalized(weight_sum));
        }
        let c = &self.credibility;
        if !(c.tier_low < c.tier_medium && c.tier_medium < c.tier_high) {
            return Err(ConfigError::UnorderedTierBounds(
                c.tier_low,
                c.tier_medium,
                c.tier_high,
            ));
        }
        for (name, value) in [
            ("weight_floor", c.weight_floor),
            ("default_score", c.default_score),
            ("min_credibility", self.policy.min_credibility),
            ("min_consensus_confidence", self.policy.min_consensus_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::UnitIntervalViolation { name, value });
            }
        }

        if self.policy.max_batch_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        Ok(())
    }

    /// Check the quorum against an actual party roster. Called when the
    /// multi-party validator is constructed.
    pub fn validate_party_roster(&self, parties: usize) -> Result<(), ConfigError> {
        if self.consensus.quorum > parties {
            return Err(ConfigError::QuorumExceedsParties {
                quorum: self.consensus.quorum,
                parties,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn unnormalized_weights_rejected() {
        let mut config = PipelineConfig::default();
        config.credibility.weights.age = 0.5; // sum now 1.3
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightsNotNormalized(_))
        ));
    }

    #[test]
    fn inverted_value_band_rejected() {
        let mut config = PipelineConfig::default();
        config.input.min_value_usd = 1_000_000.0;
        config.input.max_value_usd = 100.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedValueBand { .. })
        ));
    }

    #[test]
    fn quorum_checked_against_roster() {
        let config = PipelineConfig::default();
        assert!(config.validate_party_roster(5).is_ok());
        assert!(config.validate_party_roster(2).is_err());
    }

    #[test]
    fn unordered_tiers_rejected() {
        let mut config = PipelineConfig::default();
        config.credibility.tier_medium = 0.1; // below tier_low
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnorderedTierBounds(..))
        ));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.consensus.quorum, config.consensus.quorum);
    }
}
