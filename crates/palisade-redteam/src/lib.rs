/// PALISADE RED TEAM
///
/// Adversarial stress-testing for the validation pipeline: a fixed
/// catalogue of attack scenario generators, a harness that drives them
/// through the complete validator as a black box, and an assessment report
/// scoring the pipeline's resilience.
///
/// The framework is read-only with respect to the pipeline: it submits
/// inputs and reads verdicts. Remediation guidance is advisory output for
/// a human operator.

pub mod report;
pub mod runner;
pub mod scenario;

// Re-export key types for easy access
pub use report::{AssessmentReport, Recommendation, RecommendationPriority};
pub use runner::{AttackOutcome, RedTeamError, RedTeamHarness};
pub use scenario::{
    default_catalogue, AttackCase, AttackKind, AttackScenario, AttackSeverity, TargetLayer,
};
