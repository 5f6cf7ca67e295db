/// STATISTICAL ANOMALY DETECTION
///
/// Five independent checks against a window of recent events. The window is
/// a read-only snapshot in insertion order (= time order, newest last); the
/// detector never mutates it and holds no state between calls.
///
/// Each check yields zero or one anomaly. Results are concatenated in check
/// order: volume spike, pattern repetition, cross-chain decorrelation,
/// timing regularity, impossible sequence.

use std::collections::HashMap;

use chrono::Duration;
use palisade_core::{Anomaly, AnomalyConfig, AnomalyKind, LiquidationEvent};

pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        AnomalyDetector { config }
    }

    /// Run all five checks over the window. Pure: same window, same result.
    pub fn scan(&self, window: &[LiquidationEvent]) -> Vec<Anomaly> {
        let mut findings = Vec::new();
        if let Some(anomaly) = self.volume_spike(window) {
            findings.push(anomaly);
        }
        if let Some(anomaly) = self.pattern_repetition(window) {
            findings.push(anomaly);
        }
        if let Some(anomaly) = self.cross_chain_decorrelation(window) {
            findings.push(anomaly);
        }
        if let Some(anomaly) = self.timing_regularity(window) {
            findings.push(anomaly);
        }
        if let Some(anomaly) = self.impossible_sequence(window) {
            findings.push(anomaly);
        }
        findings
    }

    /// Trailing 1h event count vs the mean hourly rate over the trailing 24h.
    fn volume_spike(&self, window: &[LiquidationEvent]) -> Option<Anomaly> {
        let newest = window.last()?.timestamp;
        let hour_ago = newest - Duration::hours(1);
        let day_ago = newest - Duration::hours(24);

        let last_hour = window.iter().filter(|e| e.timestamp > hour_ago).count() as f64;
        let last_day = window.iter().filter(|e| e.timestamp > day_ago).count() as f64;
        let hourly_mean = last_day / 24.0;
        if hourly_mean <= 0.0 {
            return None;
        }

        let ratio = last_hour / hourly_mean;
        if ratio <= self.config.volume_spike_multiplier {
            return None;
        }
        Some(anomaly(
            AnomalyKind::VolumeSpike,
            format!(
                "{} events in the last hour vs {:.2}/h mean ({:.1}x)",
                last_hour as u64, hourly_mean, ratio
            ),
            ratio,
            self.config.volume_spike_multiplier,
        ))
    }

    /// Share of the most common behavior pattern across the window.
    fn pattern_repetition(&self, window: &[LiquidationEvent]) -> Option<Anomaly> {
        if window.len() < 2 {
            return None;
        }
        let mut counts: HashMap<String, usize> = HashMap::new();
        for event in window {
            *counts.entry(event.behavior_pattern()).or_insert(0) += 1;
        }
        let (pattern, dominant) = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))?;
        let share = dominant as f64 / window.len() as f64;
        if share <= self.config.pattern_repetition_fraction {
            return None;
        }
        Some(anomaly(
            AnomalyKind::PatternRepetition,
            format!(
                "pattern '{}' covers {:.0}% of {} events",
                pattern,
                share * 100.0,
                window.len()
            ),
            share,
            self.config.pattern_repetition_fraction,
        ))
    }

    /// Mean pairwise correlation of per-chain hourly activity series.
    fn cross_chain_decorrelation(&self, window: &[LiquidationEvent]) -> Option<Anomaly> {
        let mut by_chain: HashMap<&str, Vec<&LiquidationEvent>> = HashMap::new();
        for event in window {
            by_chain.entry(event.chain.as_str()).or_default().push(event);
        }
        if by_chain.len() < 2 {
            return None;
        }

        let start = window.iter().map(|e| e.timestamp).min()?;
        let end = window.iter().map(|e| e.timestamp).max()?;
        let buckets = ((end - start).num_seconds() / 3600) as usize + 1;
        if buckets < 2 {
            return None;
        }

        // Hourly count series per chain over the window span
        let mut chains: Vec<&str> = by_chain.keys().copied().collect();
        chains.sort_unstable();
        let series: Vec<Vec<f64>> = chains
            .iter()
            .map(|chain| {
                let mut counts = vec![0.0; buckets];
                for event in &by_chain[chain] {
                    let bucket = ((event.timestamp - start).num_seconds() / 3600) as usize;
                    counts[bucket] += 1.0;
                }
                counts
            })
            .collect();

        let mut correlation_sum = 0.0;
        let mut pairs = 0usize;
        for i in 0..series.len() {
            for j in (i + 1)..series.len() {
                correlation_sum += pearson(&series[i], &series[j]);
                pairs += 1;
            }
        }
        let mean_correlation = correlation_sum / pairs as f64;
        if mean_correlation >= self.config.correlation_floor {
            return None;
        }
        Some(anomaly(
            AnomalyKind::CrossChainDecorrelation,
            format!(
                "mean correlation {:.2} across {} chain pair(s)",
                mean_correlation, pairs
            ),
            mean_correlation,
            self.config.correlation_floor,
        ))
    }

    /// Dispersion (variance/mean) of inter-event deltas. Too low means
    /// mechanical timing.
    fn timing_regularity(&self, window: &[LiquidationEvent]) -> Option<Anomaly> {
        if window.len() < 3 {
            return None;
        }
        let deltas: Vec<f64> = window
            .windows(2)
            .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_seconds().max(0) as f64)
            .collect();
        let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
        if mean <= 0.0 {
            return None;
        }
        let variance =
            deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / deltas.len() as f64;
        let dispersion = variance / mean;
        if dispersion >= self.config.timing_cv_ceiling {
            return None;
        }
        Some(anomaly(
            AnomalyKind::TimingRegularity,
            format!(
                "inter-event dispersion {:.4} over {} deltas (mean gap {:.0}s)",
                dispersion,
                deltas.len(),
                mean
            ),
            dispersion,
            self.config.timing_cv_ceiling,
        ))
    }

    /// Same wallet, adjacent events: a >10x value jump within seconds is
    /// not organic liquidation behavior.
    fn impossible_sequence(&self, window: &[LiquidationEvent]) -> Option<Anomaly> {
        let mut last_by_wallet: HashMap<&str, &LiquidationEvent> = HashMap::new();
        let mut worst: Option<(f64, String)> = None;
        let mut violations = 0usize;

        for event in window {
            if let Some(prev) = last_by_wallet.get(event.wallet.as_str()) {
                let gap = (event.timestamp - prev.timestamp).num_seconds();
                if prev.value_usd > 0.0
                    && gap >= 0
                    && gap < self.config.sequence_interval_secs
                {
                    let jump = event.value_usd / prev.value_usd;
                    if jump > self.config.sequence_value_multiplier {
                        violations += 1;
                        let detail = format!(
                            "wallet {} jumped {:.1}x within {}s",
                            event.wallet, jump, gap
                        );
                        if worst.as_ref().map_or(true, |(w, _)| jump > *w) {
                            worst = Some((jump, detail));
                        }
                    }
                }
            }
            last_by_wallet.insert(event.wallet.as_str(), event);
        }

        let (jump, detail) = worst?;
        Some(anomaly(
            AnomalyKind::ImpossibleSequence,
            format!("{} ({} violation(s) in window)", detail, violations),
            jump,
            self.config.sequence_value_multiplier,
        ))
    }
}

fn anomaly(kind: AnomalyKind, description: String, observed: f64, threshold: f64) -> Anomaly {
    Anomaly {
        kind,
        severity: kind.severity(),
        description,
        observed,
        threshold,
    }
}

/// Pearson correlation; series with zero variance correlate at 0.
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len()) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a <= 0.0 || var_b <= 0.0 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}
