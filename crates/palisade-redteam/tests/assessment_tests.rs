/// RED-TEAM ASSESSMENT TESTS
///
/// These tests verify:
/// - The default pipeline configuration contains the whole catalogue
/// - Weakening one layer's thresholds lets the matching attack land
/// - The security score falls monotonically as more attacks land
/// - Assessment runs are reproducible per seed

use palisade_core::PipelineConfig;
use palisade_redteam::{AttackSeverity, RecommendationPriority, RedTeamHarness};

#[tokio::test]
async fn default_pipeline_contains_the_full_catalogue() {
    let harness = RedTeamHarness::new(PipelineConfig::default(), 1234).unwrap();
    let report = harness.run().await.unwrap();

    assert_eq!(report.total_attacks, 7);
    assert_eq!(
        report.successful_attacks, 0,
        "breached scenarios: {:?}",
        report
            .outcomes
            .iter()
            .filter(|o| o.success)
            .map(|o| (&o.scenario, &o.evidence))
            .collect::<Vec<_>>()
    );
    assert_eq!(report.security_score, 100.0);
    assert!(report.recommendations.is_empty());
    assert!(report.verify_hash());
}

#[tokio::test]
async fn gutted_credibility_threshold_lets_identity_wash_land() {
    let mut config = PipelineConfig::default();
    config.policy.min_credibility = 0.0;
    let harness = RedTeamHarness::new(config, 1234).unwrap();
    let report = harness.run().await.unwrap();

    let wash = report
        .outcomes
        .iter()
        .find(|o| o.scenario == "identity-wash")
        .unwrap();
    assert!(wash.success, "evidence: {}", wash.evidence);
    assert!(report.security_score < 100.0);
    assert_eq!(report.successes_by_severity[&AttackSeverity::High], 1);
    assert_eq!(
        report.recommendations[0].priority,
        RecommendationPriority::Immediate
    );
}

#[tokio::test]
async fn security_score_falls_as_more_layers_are_weakened() {
    let strict = RedTeamHarness::new(PipelineConfig::default(), 99)
        .unwrap()
        .run()
        .await
        .unwrap();

    let mut one_gap = PipelineConfig::default();
    one_gap.policy.min_credibility = 0.0;
    let weakened_once = RedTeamHarness::new(one_gap, 99).unwrap().run().await.unwrap();

    let mut two_gaps = PipelineConfig::default();
    two_gaps.policy.min_credibility = 0.0;
    two_gaps.policy.anomaly_tolerance = 100;
    let weakened_twice = RedTeamHarness::new(two_gaps, 99).unwrap().run().await.unwrap();

    assert!(strict.security_score > weakened_once.security_score);
    assert!(weakened_once.security_score > weakened_twice.security_score);
    assert!(
        weakened_twice.successful_attacks > weakened_once.successful_attacks,
        "{} vs {}",
        weakened_twice.successful_attacks,
        weakened_once.successful_attacks
    );
}

#[tokio::test]
async fn assessment_is_reproducible_per_seed() {
    let first = RedTeamHarness::new(PipelineConfig::default(), 7)
        .unwrap()
        .run()
        .await
        .unwrap();
    let second = RedTeamHarness::new(PipelineConfig::default(), 7)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(first.report_hash, second.report_hash);
    assert_eq!(first.security_score, second.security_score);
}
