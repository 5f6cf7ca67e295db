/// VALIDATION OUTCOME TYPES
///
/// Everything a pipeline run produces about one event: anomaly records,
/// the multi-party consensus outcome, the credibility assessment, and the
/// combined verdict handed to the downstream incentive ledger.
///
/// A consumer must treat `overall_valid = false` as "do not act on this
/// event", and a Pending consensus as indeterminate — neither pass nor fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::event::WeightedEvent;

/// Severity of a single anomaly finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// The five statistical checks the anomaly detector runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyKind {
    /// Trailing 1h event count far above the 24h hourly mean
    VolumeSpike,
    /// One behavior pattern dominating the window
    PatternRepetition,
    /// Per-chain activity timelines that should co-move but do not
    CrossChainDecorrelation,
    /// Inter-event deltas too mechanical to be organic
    TimingRegularity,
    /// Same wallet jumping >10x in value within seconds
    ImpossibleSequence,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::VolumeSpike => "VOLUME_SPIKE",
            AnomalyKind::PatternRepetition => "PATTERN_REPETITION",
            AnomalyKind::CrossChainDecorrelation => "CROSS_CHAIN_DECORRELATION",
            AnomalyKind::TimingRegularity => "TIMING_REGULARITY",
            AnomalyKind::ImpossibleSequence => "IMPOSSIBLE_SEQUENCE",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AnomalyKind::VolumeSpike => Severity::High,
            AnomalyKind::PatternRepetition => Severity::Medium,
            AnomalyKind::CrossChainDecorrelation => Severity::High,
            AnomalyKind::TimingRegularity => Severity::Medium,
            AnomalyKind::ImpossibleSequence => Severity::High,
        }
    }
}

/// One statistical red flag raised against a window of recent events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub description: String,
    /// The value the check observed
    pub observed: f64,
    /// The configured threshold it was compared against
    pub threshold: f64,
}

/// Status of a multi-party consensus round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusStatus {
    /// Quorum not met — indeterminate, not a pass and not a fail
    Pending,
    /// Parties agree within tolerance
    Consensus,
    /// Parties responded but disagree beyond tolerance
    Disagreement,
    /// A party task failed in an unhandled way
    Error,
}

/// Result of gathering independent observations of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusOutcome {
    pub status: ConsensusStatus,
    /// Median of surviving submissions, present only on Consensus
    pub consensus_value: Option<f64>,
    /// Confidence in [0,1]; 0 unless status is Consensus
    pub confidence: f64,
    /// Submissions that survived timeout/error filtering
    pub responses_used: usize,
    /// Submissions discarded (timed out or errored)
    pub responses_discarded: usize,
}

impl ConsensusOutcome {
    pub fn pending(used: usize, discarded: usize) -> Self {
        ConsensusOutcome {
            status: ConsensusStatus::Pending,
            consensus_value: None,
            confidence: 0.0,
            responses_used: used,
            responses_discarded: discarded,
        }
    }

    pub fn error(discarded: usize) -> Self {
        ConsensusOutcome {
            status: ConsensusStatus::Error,
            consensus_value: None,
            confidence: 0.0,
            responses_used: 0,
            responses_discarded: discarded,
        }
    }
}

/// Coarse reputation bucket derived from the continuous credibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CredibilityTier {
    Unreliable,
    Low,
    Medium,
    High,
}

impl CredibilityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredibilityTier::Unreliable => "UNRELIABLE",
            CredibilityTier::Low => "LOW",
            CredibilityTier::Medium => "MEDIUM",
            CredibilityTier::High => "HIGH",
        }
    }
}

/// Named component sub-scores, each clamped to [0,1] before combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ComponentScores {
    pub age: f64,
    pub volume: f64,
    pub cross_chain: f64,
    pub identity: f64,
    pub custody: f64,
    pub reputation: f64,
}

/// Reputation assessment of a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityScore {
    /// Fixed-weight combination of the components, clamped to [0,1]
    pub overall: f64,
    pub tier: CredibilityTier,
    pub components: ComponentScores,
}

/// Named states of the per-event validation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationStage {
    Input,
    Anomaly,
    Consensus,
    Credibility,
    Combine,
}

impl ValidationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStage::Input => "INPUT",
            ValidationStage::Anomaly => "ANOMALY",
            ValidationStage::Consensus => "CONSENSUS",
            ValidationStage::Credibility => "CREDIBILITY",
            ValidationStage::Combine => "COMBINE",
        }
    }
}

/// Outcome of one layer within a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerStatus {
    Passed,
    Failed,
    /// Layer was never reached (an earlier layer terminated the run)
    Skipped,
}

impl LayerStatus {
    pub fn passed(&self) -> bool {
        matches!(self, LayerStatus::Passed)
    }
}

/// Aggregate of all four layers for one event.
///
/// `overall_valid` is a pure function of the per-layer results and the
/// configured policy; it is never set independently of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Wallet of the event under validation
    pub wallet: String,
    /// Content hash of the event under validation
    pub event_hash: Vec<u8>,
    pub input_status: LayerStatus,
    /// Machine-checkable reason when input validation failed
    pub rejection_reason: Option<String>,
    pub anomaly_status: LayerStatus,
    pub anomalies: Vec<Anomaly>,
    pub consensus_status: LayerStatus,
    pub consensus: Option<ConsensusOutcome>,
    pub credibility_status: LayerStatus,
    pub credibility: Option<CredibilityScore>,
    /// Credibility-weighted copy of the event, when the run got that far
    pub weighted: Option<WeightedEvent>,
    pub overall_valid: bool,
    /// Furthest state the machine reached
    pub stage_reached: ValidationStage,
    pub validated_at: DateTime<Utc>,
    /// Deterministic hash over the decision-relevant fields
    pub verdict_hash: Vec<u8>,
}

impl ValidationVerdict {
    /// Compute the deterministic verdict hash. Wall-clock fields are
    /// excluded so that identical decisions hash identically.
    pub fn compute_hash(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(&self.event_hash);
        hasher.update([
            self.input_status.passed() as u8,
            self.anomaly_status.passed() as u8,
            self.consensus_status.passed() as u8,
            self.credibility_status.passed() as u8,
            self.overall_valid as u8,
        ]);
        hasher.update(self.stage_reached.as_str().as_bytes());
        if let Some(reason) = &self.rejection_reason {
            hasher.update(reason.as_bytes());
        }
        hasher.update((self.anomalies.len() as u64).to_le_bytes());
        if let Some(consensus) = &self.consensus {
            hasher.update([consensus.status as u8]);
        }
        hasher.finalize().to_vec()
    }

    /// Verify the stored hash against a recomputation.
    pub fn verify_hash(&self) -> bool {
        self.verdict_hash == self.compute_hash()
    }

    pub fn verdict_hash_hex(&self) -> String {
        hex::encode(&self.verdict_hash)
    }
}
