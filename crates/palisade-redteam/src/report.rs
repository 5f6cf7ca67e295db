/// ASSESSMENT REPORTING
///
/// Turns a set of attack outcomes into one immutable assessment document:
/// a 0-100 security score that only falls as attacks land, successful
/// attacks grouped by severity, prioritized recommendations with
/// deduplicated mitigations, and next steps for the operator.
///
/// The report is advisory. Remediation is a human decision; the framework
/// never patches pipeline thresholds itself.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::runner::AttackOutcome;
use crate::scenario::AttackSeverity;

/// Urgency bucket for a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecommendationPriority {
    /// Scheduled remediation in the normal release cadence
    Scheduled,
    /// Drop everything: a Critical/High attack landed
    Immediate,
}

/// One prioritized remediation item, covering every successful attack of
/// one severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub severity: AttackSeverity,
    pub summary: String,
    /// Mitigations across same-severity attacks, deduplicated
    pub mitigations: Vec<String>,
}

/// Aggregate over one red-team run. Generated once, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// 0-100, monotonically decreasing in successful attacks
    pub security_score: f64,
    pub total_attacks: usize,
    pub successful_attacks: usize,
    pub successes_by_severity: BTreeMap<AttackSeverity, usize>,
    pub outcomes: Vec<AttackOutcome>,
    pub recommendations: Vec<Recommendation>,
    pub next_steps: Vec<String>,
    pub generated_at: DateTime<Utc>,
    /// Deterministic hash over the decision-relevant content
    pub report_hash: Vec<u8>,
}

impl AssessmentReport {
    pub fn generate(outcomes: Vec<AttackOutcome>) -> Self {
        let total_attacks = outcomes.len();
        let successful: Vec<&AttackOutcome> = outcomes.iter().filter(|o| o.success).collect();
        let successful_attacks = successful.len();

        let security_score = if total_attacks == 0 {
            100.0
        } else {
            (100.0 * (1.0 - successful_attacks as f64 / total_attacks as f64)).max(0.0)
        };

        let mut successes_by_severity: BTreeMap<AttackSeverity, usize> = BTreeMap::new();
        for outcome in &successful {
            *successes_by_severity.entry(outcome.severity).or_insert(0) += 1;
        }

        let recommendations = build_recommendations(&successful);
        let next_steps = build_next_steps(security_score, &successes_by_severity);

        let mut report = AssessmentReport {
            security_score,
            total_attacks,
            successful_attacks,
            successes_by_severity,
            outcomes,
            recommendations,
            next_steps,
            generated_at: Utc::now(),
            report_hash: Vec::new(),
        };
        report.report_hash = report.compute_hash();
        report
    }

    /// Deterministic content hash; the generation timestamp is excluded so
    /// that identical runs hash identically.
    pub fn compute_hash(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.security_score.to_le_bytes());
        hasher.update((self.total_attacks as u64).to_le_bytes());
        hasher.update((self.successful_attacks as u64).to_le_bytes());
        for outcome in &self.outcomes {
            hasher.update(outcome.scenario.as_bytes());
            hasher.update([outcome.success as u8]);
            hasher.update((outcome.undetected_cases as u64).to_le_bytes());
            hasher.update((outcome.total_cases as u64).to_le_bytes());
        }
        hasher.finalize().to_vec()
    }

    pub fn verify_hash(&self) -> bool {
        self.report_hash == self.compute_hash()
    }

    /// Machine-readable document for archival.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable rendering for the operator.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("== PALISADE RED-TEAM ASSESSMENT ==\n");
        out.push_str(&format!(
            "Security score: {:.1}/100 ({} of {} attacks contained)\n",
            self.security_score,
            self.total_attacks - self.successful_attacks,
            self.total_attacks
        ));
        out.push_str(&format!(
            "Report hash: {}\n\n",
            hex::encode(&self.report_hash)
        ));

        out.push_str("Scenario results:\n");
        for outcome in &self.outcomes {
            out.push_str(&format!(
                "  [{}] {} (targets {:?}, severity {}): {}\n",
                if outcome.success { "BREACH" } else { "  ok  " },
                outcome.scenario,
                outcome.target_layer,
                outcome.severity.as_str(),
                outcome.evidence
            ));
        }

        if self.recommendations.is_empty() {
            out.push_str("\nNo remediation required: every attack was contained.\n");
        } else {
            out.push_str("\nRecommendations (highest priority first):\n");
            for recommendation in &self.recommendations {
                out.push_str(&format!(
                    "  {:?} [{}]: {}\n",
                    recommendation.priority,
                    recommendation.severity.as_str(),
                    recommendation.summary
                ));
                for mitigation in &recommendation.mitigations {
                    out.push_str(&format!("    - {}\n", mitigation));
                }
            }
        }

        out.push_str("\nNext steps:\n");
        for step in &self.next_steps {
            out.push_str(&format!("  * {}\n", step));
        }
        out
    }
}

fn build_recommendations(successful: &[&AttackOutcome]) -> Vec<Recommendation> {
    // Group successful attacks by severity; dedup mitigations per bucket
    let mut by_severity: BTreeMap<AttackSeverity, (Vec<String>, BTreeSet<String>)> =
        BTreeMap::new();
    for outcome in successful {
        let bucket = by_severity.entry(outcome.severity).or_default();
        bucket.0.push(outcome.scenario.clone());
        bucket.1.extend(outcome.mitigations.iter().cloned());
    }

    let mut recommendations: Vec<Recommendation> = by_severity
        .into_iter()
        .map(|(severity, (scenarios, mitigations))| {
            let priority = match severity {
                AttackSeverity::Critical | AttackSeverity::High => {
                    RecommendationPriority::Immediate
                }
                AttackSeverity::Medium | AttackSeverity::Low => RecommendationPriority::Scheduled,
            };
            let summary = match priority {
                RecommendationPriority::Immediate => format!(
                    "Immediate action: {} {} attack(s) defeated the pipeline ({})",
                    scenarios.len(),
                    severity.as_str(),
                    scenarios.join(", ")
                ),
                RecommendationPriority::Scheduled => format!(
                    "Schedule remediation: {} {} attack(s) slipped through ({})",
                    scenarios.len(),
                    severity.as_str(),
                    scenarios.join(", ")
                ),
            };
            Recommendation {
                priority,
                severity,
                summary,
                mitigations: mitigations.into_iter().collect(),
            }
        })
        .collect();

    // Highest priority first, then highest severity
    recommendations.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.severity.cmp(&a.severity))
    });
    recommendations
}

fn build_next_steps(
    security_score: f64,
    successes_by_severity: &BTreeMap<AttackSeverity, usize>,
) -> Vec<String> {
    let mut steps = Vec::new();
    let critical_or_high = successes_by_severity
        .iter()
        .filter(|(severity, _)| **severity >= AttackSeverity::High)
        .map(|(_, count)| count)
        .sum::<usize>();

    if critical_or_high > 0 {
        steps.push(
            "Suspend incentive minting until the breached layers are hardened".to_string(),
        );
        steps.push("Re-run the assessment after each threshold change".to_string());
    } else if security_score < 100.0 {
        steps.push("Fold the slipped scenarios into the regression suite".to_string());
        steps.push("Review lower-severity gaps at the next threshold review".to_string());
    } else {
        steps.push("Archive this report alongside the deployed configuration".to_string());
        steps.push("Schedule the next periodic assessment".to_string());
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{AttackKind, TargetLayer};

    fn outcome(name: &str, severity: AttackSeverity, success: bool) -> AttackOutcome {
        AttackOutcome {
            scenario: name.to_string(),
            kind: AttackKind::FabricatedWalletFarm,
            target_layer: TargetLayer::Input,
            severity,
            total_cases: 10,
            undetected_cases: if success { 5 } else { 0 },
            acceptable_rate: 0.05,
            success,
            evidence: "test".to_string(),
            mitigations: vec!["shared mitigation".to_string()],
        }
    }

    #[test]
    fn clean_run_scores_one_hundred() {
        let report = AssessmentReport::generate(vec![
            outcome("a", AttackSeverity::High, false),
            outcome("b", AttackSeverity::Low, false),
        ]);
        assert_eq!(report.security_score, 100.0);
        assert!(report.recommendations.is_empty());
        assert!(report.verify_hash());
    }

    #[test]
    fn score_decreases_monotonically_with_successes() {
        let mut previous = 101.0;
        for successes in 0..=4 {
            let outcomes: Vec<AttackOutcome> = (0..4)
                .map(|i| outcome(&format!("s{i}"), AttackSeverity::Medium, i < successes))
                .collect();
            let report = AssessmentReport::generate(outcomes);
            assert!(
                report.security_score < previous
                    || (successes == 0 && report.security_score == 100.0),
                "score did not decrease: {} -> {}",
                previous,
                report.security_score
            );
            previous = report.security_score;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn score_never_negative() {
        let outcomes: Vec<AttackOutcome> = (0..3)
            .map(|i| outcome(&format!("s{i}"), AttackSeverity::Critical, true))
            .collect();
        let report = AssessmentReport::generate(outcomes);
        assert_eq!(report.security_score, 0.0);
    }

    #[test]
    fn critical_successes_demand_immediate_action() {
        let report = AssessmentReport::generate(vec![
            outcome("crit", AttackSeverity::Critical, true),
            outcome("med", AttackSeverity::Medium, true),
        ]);
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(
            report.recommendations[0].priority,
            RecommendationPriority::Immediate
        );
        assert_eq!(
            report.recommendations[1].priority,
            RecommendationPriority::Scheduled
        );
        assert!(report
            .next_steps
            .iter()
            .any(|s| s.contains("Suspend incentive minting")));
    }

    #[test]
    fn mitigations_deduplicated_within_severity() {
        let report = AssessmentReport::generate(vec![
            outcome("one", AttackSeverity::High, true),
            outcome("two", AttackSeverity::High, true),
        ]);
        assert_eq!(report.recommendations.len(), 1);
        // Both outcomes carry the same mitigation; it appears once
        assert_eq!(report.recommendations[0].mitigations.len(), 1);
    }

    #[test]
    fn hash_ignores_generation_time() {
        let outcomes = vec![outcome("a", AttackSeverity::Low, false)];
        let first = AssessmentReport::generate(outcomes.clone());
        let second = AssessmentReport::generate(outcomes);
        assert_eq!(first.report_hash, second.report_hash);
    }

    #[test]
    fn text_rendering_names_breaches() {
        let report = AssessmentReport::generate(vec![
            outcome("contained-one", AttackSeverity::Low, false),
            outcome("breached-one", AttackSeverity::High, true),
        ]);
        let text = report.render_text();
        assert!(text.contains("BREACH"));
        assert!(text.contains("breached-one"));
        assert!(text.contains("Security score"));
    }
}
