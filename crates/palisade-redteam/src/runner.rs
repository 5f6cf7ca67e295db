/// RED-TEAM HARNESS
///
/// Drives the attack catalogue through the complete validator and records,
/// per scenario, how many adversarial cases the pipeline accepted. The
/// validator is a black box: the harness never patches thresholds or
/// inspects internals, it only submits inputs and reads verdicts.
///
/// Scenarios run sequentially in catalogue order so reports are
/// deterministic; aggregation itself is order-independent.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use log::info;

use palisade_core::{ConfigError, PipelineConfig};
use palisade_pipeline::{honest_roster, CompleteValidator, StaticActivityOracle};

use crate::report::AssessmentReport;
use crate::scenario::{
    default_catalogue, AttackCase, AttackKind, AttackScenario, AttackSeverity, TargetLayer,
};

#[derive(Debug, Error)]
pub enum RedTeamError {
    #[error("Pipeline configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalogue is empty")]
    EmptyCatalogue,
}

/// Result of one scenario against the pipeline. An attack *succeeds* when
/// the pipeline accepted more adversarial cases than the scenario's
/// acceptable ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub scenario: String,
    pub kind: AttackKind,
    pub target_layer: TargetLayer,
    pub severity: AttackSeverity,
    pub total_cases: usize,
    /// Cases where `overall_valid` came back true
    pub undetected_cases: usize,
    pub acceptable_rate: f64,
    pub success: bool,
    pub evidence: String,
    pub mitigations: Vec<String>,
}

impl AttackOutcome {
    pub fn undetected_rate(&self) -> f64 {
        if self.total_cases == 0 {
            0.0
        } else {
            self.undetected_cases as f64 / self.total_cases as f64
        }
    }
}

pub struct RedTeamHarness {
    config: PipelineConfig,
    catalogue: Vec<Box<dyn AttackScenario>>,
    seed: u64,
}

impl RedTeamHarness {
    /// Harness over the default catalogue. Fail-fast on a config the
    /// pipeline itself would refuse.
    pub fn new(config: PipelineConfig, seed: u64) -> Result<Self, RedTeamError> {
        config.validate()?;
        Ok(RedTeamHarness {
            config,
            catalogue: default_catalogue(),
            seed,
        })
    }

    /// Replace the catalogue (e.g. to add deployment-specific scenarios).
    pub fn with_catalogue(
        mut self,
        catalogue: Vec<Box<dyn AttackScenario>>,
    ) -> Result<Self, RedTeamError> {
        if catalogue.is_empty() {
            return Err(RedTeamError::EmptyCatalogue);
        }
        self.catalogue = catalogue;
        Ok(self)
    }

    /// Run every scenario and assemble the assessment report.
    pub async fn run(&self) -> Result<AssessmentReport, RedTeamError> {
        let mut outcomes = Vec::with_capacity(self.catalogue.len());
        for scenario in &self.catalogue {
            outcomes.push(self.run_scenario(scenario.as_ref()).await?);
        }
        Ok(AssessmentReport::generate(outcomes))
    }

    async fn run_scenario(
        &self,
        scenario: &dyn AttackScenario,
    ) -> Result<AttackOutcome, RedTeamError> {
        let mut rng = StdRng::seed_from_u64(self.seed ^ scenario_salt(scenario.name()));
        let cases = scenario.build_cases(&mut rng);
        let total_cases = cases.len();
        let mut undetected = 0usize;
        let mut slipped = Vec::new();

        for case in cases {
            if self.run_case(&case).await? {
                undetected += 1;
                slipped.push(case.label.clone());
            }
        }

        let rate = if total_cases == 0 {
            0.0
        } else {
            undetected as f64 / total_cases as f64
        };
        let success = rate > scenario.acceptable_success_rate();
        let evidence = if undetected == 0 {
            format!("all {} adversarial cases rejected", total_cases)
        } else {
            format!(
                "{}/{} adversarial cases accepted ({:.0}% > {:.0}% ceiling: {})",
                undetected,
                total_cases,
                rate * 100.0,
                scenario.acceptable_success_rate() * 100.0,
                slipped.join(", ")
            )
        };
        info!(
            "scenario {}: {}/{} undetected (attack {})",
            scenario.name(),
            undetected,
            total_cases,
            if success { "SUCCEEDED" } else { "contained" }
        );

        Ok(AttackOutcome {
            scenario: scenario.name().to_string(),
            kind: scenario.kind(),
            target_layer: scenario.target_layer(),
            severity: scenario.severity(),
            total_cases,
            undetected_cases: undetected,
            acceptable_rate: scenario.acceptable_success_rate(),
            success,
            evidence,
            mitigations: scenario.mitigations(),
        })
    }

    /// Returns true when the pipeline accepted the adversarial case.
    async fn run_case(&self, case: &AttackCase) -> Result<bool, RedTeamError> {
        let mut oracle = StaticActivityOracle::new();
        for (wallet, venues) in &case.venue_activity {
            oracle = oracle.with_wallet(wallet, *venues);
        }
        let parties = case.parties.clone().unwrap_or_else(honest_roster);
        // A fresh validator per case: scenarios may bring their own party
        // roster, and nothing leaks between cases.
        let validator =
            CompleteValidator::new(self.config.clone(), parties, Box::new(oracle))?;
        let verdict = validator
            .validate(&case.event, &case.window, case.profile.as_ref())
            .await;
        Ok(verdict.overall_valid)
    }
}

/// Stable per-scenario RNG salt so each scenario sees an independent,
/// reproducible stream.
fn scenario_salt(name: &str) -> u64 {
    let digest = Sha256::digest(name.as_bytes());
    u64::from_le_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_salts_differ() {
        assert_ne!(scenario_salt("a"), scenario_salt("b"));
        assert_eq!(scenario_salt("a"), scenario_salt("a"));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = PipelineConfig::default();
        config.credibility.weights.volume = 0.9;
        assert!(matches!(
            RedTeamHarness::new(config, 1),
            Err(RedTeamError::Config(_))
        ));
    }
}
