/// MULTI-PARTY CONSENSUS
///
/// Gathers independent value observations of one event from N external
/// parties and reduces them to a single outcome. Parties are untrusted and
/// possibly slow: every query runs concurrently under its own deadline, so
/// one unresponsive party never stalls the rest.
///
/// Timeouts and party-reported errors are discards, not retries. Fewer than
/// quorum survivors is an indeterminate PENDING, never a silent pass or
/// fail. The reduction itself is a pure function of the surviving
/// submissions: reproducible, permutation-invariant, no randomness.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};
use thiserror::Error;

use palisade_core::{
    ConfigError, ConsensusConfig, ConsensusOutcome, ConsensusStatus, LiquidationEvent,
};

#[derive(Debug, Error)]
pub enum PartyError {
    #[error("Party declined: {0}")]
    Declined(String),

    #[error("Party backend failure: {0}")]
    Backend(String),
}

/// One external party endpoint. Implementations wrap whatever transport the
/// deployment uses; the pipeline only sees the observation contract.
#[async_trait]
pub trait PartyClient: Send + Sync {
    fn party_id(&self) -> &str;

    /// Independent numeric observation of the event (its liquidated value).
    async fn observe(&self, event: &LiquidationEvent) -> Result<f64, PartyError>;
}

pub struct MultiPartyValidator {
    config: ConsensusConfig,
    parties: Vec<Arc<dyn PartyClient>>,
}

impl MultiPartyValidator {
    /// Fails fast when the quorum can never be met by the roster.
    pub fn new(
        config: ConsensusConfig,
        parties: Vec<Arc<dyn PartyClient>>,
    ) -> Result<Self, ConfigError> {
        if config.quorum == 0 {
            return Err(ConfigError::ZeroQuorum);
        }
        if config.quorum > parties.len() {
            return Err(ConfigError::QuorumExceedsParties {
                quorum: config.quorum,
                parties: parties.len(),
            });
        }
        Ok(MultiPartyValidator { config, parties })
    }

    pub fn party_count(&self) -> usize {
        self.parties.len()
    }

    /// Fan out to all parties, fan in once every query returned or timed
    /// out, then reduce.
    pub async fn validate(&self, event: &LiquidationEvent) -> ConsensusOutcome {
        let deadline = Duration::from_millis(self.config.party_timeout_ms);
        let queries = self.parties.iter().map(|party| {
            let party = Arc::clone(party);
            let event = event.clone();
            tokio::spawn(
                async move { tokio::time::timeout(deadline, party.observe(&event)).await },
            )
        });

        let mut submissions = Vec::with_capacity(self.parties.len());
        let mut discarded = 0usize;
        let mut task_fault = false;

        for (party, joined) in self.parties.iter().zip(join_all(queries).await) {
            match joined {
                Ok(Ok(Ok(value))) if value.is_finite() => submissions.push(value),
                Ok(Ok(Ok(value))) => {
                    warn!("party {} submitted non-finite value {}", party.party_id(), value);
                    discarded += 1;
                }
                Ok(Ok(Err(fault))) => {
                    debug!("party {} errored: {}", party.party_id(), fault);
                    discarded += 1;
                }
                Ok(Err(_elapsed)) => {
                    debug!("party {} timed out after {:?}", party.party_id(), deadline);
                    discarded += 1;
                }
                Err(join_fault) => {
                    warn!("party {} task failed: {}", party.party_id(), join_fault);
                    task_fault = true;
                }
            }
        }

        if task_fault {
            return ConsensusOutcome::error(discarded + submissions.len());
        }
        reduce_submissions(&submissions, discarded, &self.config)
    }
}

/// Reduce surviving submissions to an outcome. Pure and deterministic:
/// permuting the submissions cannot change the result.
pub fn reduce_submissions(
    submissions: &[f64],
    discarded: usize,
    config: &ConsensusConfig,
) -> ConsensusOutcome {
    if submissions.len() < config.quorum {
        return ConsensusOutcome::pending(submissions.len(), discarded);
    }

    let median = median(submissions);
    let deviation = submissions
        .iter()
        .map(|value| (value - median).abs())
        .sum::<f64>()
        / submissions.len() as f64;
    let tolerance = config.deviation_tolerance * median.abs();

    if deviation > tolerance {
        return ConsensusOutcome {
            status: ConsensusStatus::Disagreement,
            consensus_value: None,
            confidence: 0.0,
            responses_used: submissions.len(),
            responses_discarded: discarded,
        };
    }

    let confidence = if tolerance > 0.0 {
        (1.0 - deviation / tolerance).clamp(0.0, 1.0)
    } else {
        // Zero tolerance only reaches here with zero deviation
        1.0
    };
    ConsensusOutcome {
        status: ConsensusStatus::Consensus,
        consensus_value: Some(median),
        confidence,
        responses_used: submissions.len(),
        responses_discarded: discarded,
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parties::{FaultyParty, HonestParty, SlowParty};
    use chrono::{TimeZone, Utc};
    use palisade_core::ConsensusStatus;
    use proptest::prelude::*;

    fn event() -> LiquidationEvent {
        LiquidationEvent {
            wallet: "0x1111111111111111111111111111111111111111".to_string(),
            value_usd: 1500.0,
            wallet_age_days: 45,
            trade_count: 25,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            chain: "arbitrum".to_string(),
            asset: "ETH".to_string(),
        }
    }

    fn honest_roster(n: usize) -> Vec<Arc<dyn PartyClient>> {
        (0..n)
            .map(|i| {
                // Small spread in basis points, well within tolerance
                Arc::new(HonestParty::new(&format!("party-{i}"), (i as i32 - 2) * 10))
                    as Arc<dyn PartyClient>
            })
            .collect()
    }

    #[test]
    fn roster_smaller_than_quorum_is_rejected() {
        let result = MultiPartyValidator::new(ConsensusConfig::default(), honest_roster(2));
        assert!(matches!(result, Err(ConfigError::QuorumExceedsParties { .. })));
    }

    #[tokio::test]
    async fn corroborating_parties_reach_consensus() {
        let validator =
            MultiPartyValidator::new(ConsensusConfig::default(), honest_roster(5)).unwrap();
        let outcome = validator.validate(&event()).await;
        assert_eq!(outcome.status, ConsensusStatus::Consensus);
        assert_eq!(outcome.responses_used, 5);
        let value = outcome.consensus_value.unwrap();
        assert!((value - 1500.0).abs() < 20.0);
        assert!(outcome.confidence > 0.5, "confidence {}", outcome.confidence);
    }

    #[tokio::test]
    async fn wild_disagreement_is_reported() {
        let parties: Vec<Arc<dyn PartyClient>> = vec![
            Arc::new(HonestParty::new("a", 0)),
            Arc::new(HonestParty::new("b", 4_000)),  // +40%
            Arc::new(HonestParty::new("c", -4_000)), // -40%
        ];
        let validator = MultiPartyValidator::new(ConsensusConfig::default(), parties).unwrap();
        let outcome = validator.validate(&event()).await;
        assert_eq!(outcome.status, ConsensusStatus::Disagreement);
        assert_eq!(outcome.confidence, 0.0);
        assert!(outcome.consensus_value.is_none());
    }

    #[tokio::test]
    async fn too_many_faults_leave_consensus_pending() {
        let parties: Vec<Arc<dyn PartyClient>> = vec![
            Arc::new(HonestParty::new("a", 0)),
            Arc::new(HonestParty::new("b", 5)),
            Arc::new(FaultyParty::new("c")),
        ];
        let validator = MultiPartyValidator::new(ConsensusConfig::default(), parties).unwrap();
        let outcome = validator.validate(&event()).await;
        assert_eq!(outcome.status, ConsensusStatus::Pending);
        assert_eq!(outcome.responses_used, 2);
        assert_eq!(outcome.responses_discarded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_party_is_discarded_not_awaited() {
        let parties: Vec<Arc<dyn PartyClient>> = vec![
            Arc::new(HonestParty::new("a", 0)),
            Arc::new(HonestParty::new("b", 5)),
            Arc::new(HonestParty::new("c", -5)),
            Arc::new(SlowParty::new("d", 60_000, 0)),
        ];
        let validator = MultiPartyValidator::new(ConsensusConfig::default(), parties).unwrap();
        let outcome = validator.validate(&event()).await;
        assert_eq!(outcome.status, ConsensusStatus::Consensus);
        assert_eq!(outcome.responses_used, 3);
        assert_eq!(outcome.responses_discarded, 1);
    }

    #[tokio::test]
    async fn panicked_party_task_surfaces_as_error() {
        struct PanickyParty;
        #[async_trait]
        impl PartyClient for PanickyParty {
            fn party_id(&self) -> &str {
                "panicky"
            }
            async fn observe(&self, _: &LiquidationEvent) -> Result<f64, PartyError> {
                panic!("unhandled fault")
            }
        }

        let parties: Vec<Arc<dyn PartyClient>> = vec![
            Arc::new(HonestParty::new("a", 0)),
            Arc::new(HonestParty::new("b", 5)),
            Arc::new(PanickyParty),
        ];
        let validator = MultiPartyValidator::new(ConsensusConfig::default(), parties).unwrap();
        let outcome = validator.validate(&event()).await;
        assert_eq!(outcome.status, ConsensusStatus::Error);
        assert_eq!(outcome.confidence, 0.0);
    }

    #[test]
    fn reduction_is_deterministic() {
        let config = ConsensusConfig::default();
        let submissions = [1500.0, 1501.0, 1498.0, 1502.0, 1499.0];
        let first = reduce_submissions(&submissions, 0, &config);
        let second = reduce_submissions(&submissions, 0, &config);
        assert_eq!(first, second);
        assert_eq!(first.status, ConsensusStatus::Consensus);
    }

    proptest! {
        #[test]
        fn reduction_is_permutation_invariant(
            mut submissions in proptest::collection::vec(1.0f64..1_000_000.0, 3..12),
        ) {
            let config = ConsensusConfig::default();
            let forward = reduce_submissions(&submissions, 0, &config);
            submissions.reverse();
            let reversed = reduce_submissions(&submissions, 0, &config);
            prop_assert_eq!(forward, reversed);
        }

        #[test]
        fn confidence_stays_in_unit_interval(
            submissions in proptest::collection::vec(1.0f64..1_000_000.0, 0..12),
        ) {
            let config = ConsensusConfig::default();
            let outcome = reduce_submissions(&submissions, 0, &config);
            prop_assert!((0.0..=1.0).contains(&outcome.confidence));
            if outcome.status != ConsensusStatus::Consensus {
                prop_assert_eq!(outcome.confidence, 0.0);
            }
        }
    }
}
