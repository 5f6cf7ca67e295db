/// PALISADE VALIDATION PIPELINE
///
/// Layered validation for untrusted liquidation-event reports:
/// - Input validation: structural and range checks, cheapest first
/// - Anomaly detection: statistical checks against recent-event windows
/// - Multi-party consensus: independent observations, median-reduced
/// - Credibility scoring: reputation-weighted trust in the wallet
/// - Complete validator: the orchestrating state machine and batch API
///
/// A verdict of `overall_valid = false` means "do not act on this event".
/// The pipeline never mints, settles, or persists; it only decides.

pub mod anomaly;
pub mod consensus;
pub mod credibility;
pub mod input;
pub mod parties;
pub mod pipeline;

// Re-export key types for easy access
pub use anomaly::AnomalyDetector;
pub use consensus::{reduce_submissions, MultiPartyValidator, PartyClient, PartyError};
pub use credibility::{CredibilityModel, WeightedCredibilityModel};
pub use input::{
    ActivityOracle, ActivityOracleError, InputValidator, InputVerdict, StaticActivityOracle,
};
pub use parties::{honest_roster, ColludingParty, FaultyParty, HonestParty, SlowParty};
pub use pipeline::{CompleteValidator, ValidationRequest, ValidationSummary};
