/// COMPLETE VALIDATION PIPELINE
///
/// Orchestrates the four layers as an explicit state machine per event:
///
///   INPUT -> ANOMALY -> CONSENSUS -> CREDIBILITY -> COMBINE
///
/// Input failure and anomaly overflow terminate the run early with the
/// remaining layers marked skipped. The consensus outcome is recorded
/// whatever its status. A missing profile degrades credibility to the
/// configured default, never to a failure. The overall verdict is a pure
/// function of the layer results and the configured policy mode.
///
/// Batch validation runs events concurrently: per-event validation touches
/// no shared mutable state, so the only bound is the configured concurrency
/// limit. Cancellation is cooperative: in-flight events finish, nothing new
/// is dispatched, completed verdicts are returned.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use log::{debug, info};
use tokio_util::sync::CancellationToken;

use palisade_core::{
    ConfigError, ConsensusStatus, CredibilityTier, LayerStatus, LiquidationEvent, PipelineConfig,
    PolicyMode, ValidationStage, ValidationVerdict, WalletProfile,
};

use crate::anomaly::AnomalyDetector;
use crate::consensus::{MultiPartyValidator, PartyClient};
use crate::credibility::{CredibilityModel, WeightedCredibilityModel};
use crate::input::{ActivityOracle, InputValidator};

/// One unit of batch work: the event plus the context it is judged in.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub event: LiquidationEvent,
    /// Snapshot of recent events, newest last
    pub window: Vec<LiquidationEvent>,
    pub profile: Option<WalletProfile>,
}

pub struct CompleteValidator {
    config: PipelineConfig,
    input: InputValidator,
    anomaly: AnomalyDetector,
    consensus: MultiPartyValidator,
    model: Box<dyn CredibilityModel>,
    oracle: Box<dyn ActivityOracle>,
}

impl CompleteValidator {
    /// Build the pipeline. Fail-fast: a misconfigured pipeline refuses to
    /// exist rather than serving degraded decisions.
    pub fn new(
        config: PipelineConfig,
        parties: Vec<std::sync::Arc<dyn PartyClient>>,
        oracle: Box<dyn ActivityOracle>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        config.validate_party_roster(parties.len())?;
        let consensus = MultiPartyValidator::new(config.consensus.clone(), parties)?;
        Ok(CompleteValidator {
            input: InputValidator::new(config.input.clone()),
            anomaly: AnomalyDetector::new(config.anomaly.clone()),
            consensus,
            model: Box::new(WeightedCredibilityModel::new(config.credibility.clone())),
            oracle,
            config,
        })
    }

    /// Swap the credibility strategy (e.g. for a learned model).
    pub fn with_model(mut self, model: Box<dyn CredibilityModel>) -> Self {
        self.model = model;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate one event against its window and optional profile.
    pub async fn validate(
        &self,
        event: &LiquidationEvent,
        window: &[LiquidationEvent],
        profile: Option<&WalletProfile>,
    ) -> ValidationVerdict {
        // INPUT
        let input_verdict = self.input.check(event, self.oracle.as_ref());
        if !input_verdict.valid {
            debug!(
                "event {} rejected at input: {:?}",
                event.wallet, input_verdict.reason
            );
            return self.sealed(ValidationVerdict {
                wallet: event.wallet.clone(),
                event_hash: event.content_hash(),
                input_status: LayerStatus::Failed,
                rejection_reason: input_verdict.reason,
                anomaly_status: LayerStatus::Skipped,
                anomalies: Vec::new(),
                consensus_status: LayerStatus::Skipped,
                consensus: None,
                credibility_status: LayerStatus::Skipped,
                credibility: None,
                weighted: None,
                overall_valid: false,
                stage_reached: ValidationStage::Input,
                validated_at: Utc::now(),
                verdict_hash: Vec::new(),
            });
        }

        // ANOMALY
        let anomalies = self.anomaly.scan(window);
        let anomaly_ok = anomalies.len() <= self.config.policy.anomaly_tolerance;
        if !anomaly_ok {
            debug!(
                "event {} rejected at anomaly: {} findings over tolerance {}",
                event.wallet,
                anomalies.len(),
                self.config.policy.anomaly_tolerance
            );
            return self.sealed(ValidationVerdict {
                wallet: event.wallet.clone(),
                event_hash: event.content_hash(),
                input_status: LayerStatus::Passed,
                rejection_reason: None,
                anomaly_status: LayerStatus::Failed,
                anomalies,
                consensus_status: LayerStatus::Skipped,
                consensus: None,
                credibility_status: LayerStatus::Skipped,
                credibility: None,
                weighted: None,
                overall_valid: false,
                stage_reached: ValidationStage::Anomaly,
                validated_at: Utc::now(),
                verdict_hash: Vec::new(),
            });
        }

        // CONSENSUS — outcome recorded regardless of status
        let consensus = self.consensus.validate(event).await;
        let consensus_ok = consensus.status == ConsensusStatus::Consensus;

        // CREDIBILITY — a missing profile degrades, never fails
        let credibility = match profile {
            Some(profile) => self.model.score(profile),
            None => self.model.default_score(),
        };
        let credibility_ok = credibility.overall >= self.config.policy.min_credibility;
        let weighted = self.model.weight_event(event, &credibility);

        // COMBINE
        let overall_valid = match self.config.policy.mode {
            PolicyMode::Strict => consensus_ok && credibility_ok,
            PolicyMode::Lenient => {
                consensus_ok
                    && consensus.confidence >= self.config.policy.min_consensus_confidence
                    && (profile.is_none() || credibility_ok)
            }
        };

        self.sealed(ValidationVerdict {
            wallet: event.wallet.clone(),
            event_hash: event.content_hash(),
            input_status: LayerStatus::Passed,
            rejection_reason: None,
            anomaly_status: LayerStatus::Passed,
            anomalies,
            consensus_status: if consensus_ok {
                LayerStatus::Passed
            } else {
                LayerStatus::Failed
            },
            consensus: Some(consensus),
            credibility_status: if credibility_ok {
                LayerStatus::Passed
            } else {
                LayerStatus::Failed
            },
            credibility: Some(credibility),
            weighted: Some(weighted),
            overall_valid,
            stage_reached: ValidationStage::Combine,
            validated_at: Utc::now(),
            verdict_hash: Vec::new(),
        })
    }

    /// Validate a batch, one verdict per dispatched event, in input order.
    pub async fn validate_batch(&self, requests: &[ValidationRequest]) -> Vec<ValidationVerdict> {
        self.validate_batch_with_cancel(requests, &CancellationToken::new())
            .await
    }

    /// Batch with cooperative cancellation: after `cancel` fires, in-flight
    /// validations complete and their verdicts are returned, but no further
    /// event is dispatched.
    pub async fn validate_batch_with_cancel(
        &self,
        requests: &[ValidationRequest],
        cancel: &CancellationToken,
    ) -> Vec<ValidationVerdict> {
        let concurrency = self.config.policy.max_batch_concurrency;
        let verdicts: Vec<ValidationVerdict> = stream::iter(requests.iter())
            .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
            .map(|request| {
                self.validate(&request.event, &request.window, request.profile.as_ref())
            })
            .buffered(concurrency)
            .collect()
            .await;
        info!(
            "batch complete: {}/{} events validated ({} overall valid)",
            verdicts.len(),
            requests.len(),
            verdicts.iter().filter(|v| v.overall_valid).count()
        );
        verdicts
    }

    /// Aggregate statistics over a result set.
    pub fn summarize(verdicts: &[ValidationVerdict]) -> ValidationSummary {
        let mut summary = ValidationSummary {
            total: verdicts.len(),
            ..ValidationSummary::default()
        };
        let mut confidence_sum = 0.0;
        let mut confidence_count = 0usize;
        let mut credibility_sum = 0.0;
        let mut credibility_count = 0usize;

        for verdict in verdicts {
            if verdict.overall_valid {
                summary.overall_valid += 1;
            }
            if verdict.input_status.passed() {
                summary.input_passed += 1;
            }
            if verdict.anomaly_status.passed() {
                summary.anomaly_passed += 1;
            }
            if verdict.consensus_status.passed() {
                summary.consensus_reached += 1;
            }
            if verdict.credibility_status.passed() {
                summary.credibility_passed += 1;
            }
            if let Some(consensus) = &verdict.consensus {
                confidence_sum += consensus.confidence;
                confidence_count += 1;
            }
            if let Some(credibility) = &verdict.credibility {
                credibility_sum += credibility.overall;
                credibility_count += 1;
                *summary.tier_distribution.entry(credibility.tier).or_insert(0) += 1;
            }
        }

        if confidence_count > 0 {
            summary.mean_consensus_confidence = confidence_sum / confidence_count as f64;
        }
        if credibility_count > 0 {
            summary.mean_credibility = credibility_sum / credibility_count as f64;
        }
        summary
    }

    fn sealed(&self, mut verdict: ValidationVerdict) -> ValidationVerdict {
        verdict.verdict_hash = verdict.compute_hash();
        verdict
    }
}

/// Per-layer pass counts and score means across a result set.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub overall_valid: usize,
    pub input_passed: usize,
    pub anomaly_passed: usize,
    pub consensus_reached: usize,
    pub credibility_passed: usize,
    pub mean_consensus_confidence: f64,
    pub mean_credibility: f64,
    pub tier_distribution: BTreeMap<CredibilityTier, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::StaticActivityOracle;
    use crate::parties::honest_roster;
    use chrono::{Duration, TimeZone, Utc};

    const WALLET: &str = "0x1111111111111111111111111111111111111111";

    fn event() -> LiquidationEvent {
        LiquidationEvent {
            wallet: WALLET.to_string(),
            value_usd: 1500.0,
            wallet_age_days: 45,
            trade_count: 25,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            chain: "arbitrum".to_string(),
            asset: "ETH".to_string(),
        }
    }

    fn quiet_window() -> Vec<LiquidationEvent> {
        // A couple of unremarkable events hours apart
        (0..4)
            .map(|i| {
                let mut e = event();
                e.wallet = format!("0x{:040x}", i + 10);
                e.value_usd = 800.0 + 3_100.0 * i as f64;
                e.timestamp = Utc.with_ymd_and_hms(2026, 2, 28, 13, 0, 0).unwrap()
                    + Duration::seconds(i * 19_800 + 311 * i * i);
                e
            })
            .collect()
    }

    fn validator() -> CompleteValidator {
        CompleteValidator::new(
            PipelineConfig::default(),
            honest_roster(),
            Box::new(StaticActivityOracle::new().with_wallet(WALLET, 3)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn invalid_input_skips_every_later_layer() {
        let mut young = event();
        young.wallet_age_days = 10;
        let verdict = validator().validate(&young, &quiet_window(), None).await;
        assert!(!verdict.overall_valid);
        assert_eq!(verdict.stage_reached, ValidationStage::Input);
        assert_eq!(verdict.input_status, LayerStatus::Failed);
        assert_eq!(verdict.anomaly_status, LayerStatus::Skipped);
        assert_eq!(verdict.consensus_status, LayerStatus::Skipped);
        assert_eq!(verdict.credibility_status, LayerStatus::Skipped);
        assert!(verdict.consensus.is_none());
        assert!(verdict.weighted.is_none());
        assert!(verdict.rejection_reason.unwrap().contains("age"));
    }

    #[tokio::test]
    async fn missing_profile_degrades_not_fails() {
        let verdict = validator().validate(&event(), &quiet_window(), None).await;
        assert_eq!(verdict.stage_reached, ValidationStage::Combine);
        let credibility = verdict.credibility.unwrap();
        assert_eq!(credibility.overall, 0.5); // configured default
        assert!(verdict.overall_valid);
    }

    #[tokio::test]
    async fn verdict_hash_is_sealed_and_verifiable() {
        let verdict = validator().validate(&event(), &quiet_window(), None).await;
        assert!(verdict.verify_hash());
        assert!(!verdict.verdict_hash.is_empty());
    }

    #[tokio::test]
    async fn low_credibility_fails_strict_policy() {
        let profile = WalletProfile {
            wallet: WALLET.to_string(),
            age_days: 40,
            lifetime_volume_usd: 900.0,
            trade_count: 12,
            active_chains: 1,
            cross_chain_volume_usd: 0.0,
            linked_identities: 0,
            clean_custody: false,
            protocol_reputation: 0.1,
        };
        let verdict = validator()
            .validate(&event(), &quiet_window(), Some(&profile))
            .await;
        assert_eq!(verdict.credibility_status, LayerStatus::Failed);
        assert!(!verdict.overall_valid);
        // The run still completed: consensus was recorded
        assert!(verdict.consensus.is_some());
    }

    #[tokio::test]
    async fn summary_counts_layers_and_tiers() {
        let v = validator();
        let requests = vec![
            ValidationRequest {
                event: event(),
                window: quiet_window(),
                profile: None,
            },
            ValidationRequest {
                event: {
                    let mut e = event();
                    e.wallet_age_days = 2;
                    e
                },
                window: quiet_window(),
                profile: None,
            },
        ];
        let verdicts = v.validate_batch(&requests).await;
        assert_eq!(verdicts.len(), 2);
        let summary = CompleteValidator::summarize(&verdicts);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.overall_valid, 1);
        assert_eq!(summary.input_passed, 1);
        assert_eq!(summary.consensus_reached, 1);
        assert_eq!(summary.tier_distribution[&CredibilityTier::Medium], 1);
    }

    #[tokio::test]
    async fn cancelled_batch_returns_partial_results() {
        let v = validator();
        let requests: Vec<ValidationRequest> = (0..6)
            .map(|_| ValidationRequest {
                event: event(),
                window: quiet_window(),
                profile: None,
            })
            .collect();
        let cancel = CancellationToken::new();
        cancel.cancel(); // cancelled before dispatch: nothing new starts
        let verdicts = v.validate_batch_with_cancel(&requests, &cancel).await;
        assert!(verdicts.len() < requests.len());
    }
}
