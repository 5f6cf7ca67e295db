/// CREDIBILITY SCORING
///
/// Reputation-weighted trust in the wallet behind an event. Each component
/// sub-score is a bounded, monotonic function of its profile inputs; the
/// overall score is a fixed-weight linear combination (weights sum to 1.0,
/// enforced at startup).
///
/// The model is a pluggable strategy: the orchestration layer only knows
/// `CredibilityModel`, so the linear model can be swapped for a learned one
/// without touching the pipeline.

use palisade_core::{
    ComponentScores, CredibilityConfig, CredibilityScore, CredibilityTier, LiquidationEvent,
    WalletProfile, WeightedEvent,
};

/// Strategy seam for credibility scoring.
pub trait CredibilityModel: Send + Sync {
    fn score(&self, profile: &WalletProfile) -> CredibilityScore;

    /// Score assigned when no profile is available. Degraded, not failed.
    fn default_score(&self) -> CredibilityScore;

    /// Copy of the event's numeric payload scaled by the credibility
    /// weight. Never mutates the source event.
    fn weight_event(&self, event: &LiquidationEvent, score: &CredibilityScore) -> WeightedEvent;
}

/// The fixed-weight linear model.
pub struct WeightedCredibilityModel {
    config: CredibilityConfig,
}

impl WeightedCredibilityModel {
    pub fn new(config: CredibilityConfig) -> Self {
        WeightedCredibilityModel { config }
    }

    pub fn tier_for(&self, overall: f64) -> CredibilityTier {
        if overall >= self.config.tier_high {
            CredibilityTier::High
        } else if overall >= self.config.tier_medium {
            CredibilityTier::Medium
        } else if overall >= self.config.tier_low {
            CredibilityTier::Low
        } else {
            CredibilityTier::Unreliable
        }
    }

    /// Combine already-clamped components with the configured weights.
    pub fn combine(&self, components: &ComponentScores) -> f64 {
        let w = &self.config.weights;
        let overall = components.age * w.age
            + components.volume * w.volume
            + components.cross_chain * w.cross_chain
            + components.identity * w.identity
            + components.custody * w.custody
            + components.reputation * w.reputation;
        overall.clamp(0.0, 1.0)
    }

    fn component_scores(&self, profile: &WalletProfile) -> ComponentScores {
        let c = &self.config;
        ComponentScores {
            age: saturating_ratio(profile.age_days as f64, c.age_cap_days as f64),
            volume: log_ratio(profile.lifetime_volume_usd, c.volume_reference_usd),
            cross_chain: 0.6 * saturating_ratio(profile.active_chains as f64, c.chain_cap as f64)
                + 0.4 * log_ratio(profile.cross_chain_volume_usd, c.cross_chain_reference_usd),
            identity: saturating_ratio(profile.linked_identities as f64, c.identity_cap as f64),
            custody: if profile.clean_custody { 1.0 } else { 0.0 },
            reputation: profile.protocol_reputation.clamp(0.0, 1.0),
        }
    }
}

impl CredibilityModel for WeightedCredibilityModel {
    fn score(&self, profile: &WalletProfile) -> CredibilityScore {
        let components = self.component_scores(profile);
        let overall = self.combine(&components);
        CredibilityScore {
            overall,
            tier: self.tier_for(overall),
            components,
        }
    }

    fn default_score(&self) -> CredibilityScore {
        let overall = self.config.default_score;
        CredibilityScore {
            overall,
            tier: self.tier_for(overall),
            components: ComponentScores {
                age: overall,
                volume: overall,
                cross_chain: overall,
                identity: overall,
                custody: overall,
                reputation: overall,
            },
        }
    }

    /// The floor keeps low-trust events discounted, never erased.
    fn weight_event(&self, event: &LiquidationEvent, score: &CredibilityScore) -> WeightedEvent {
        let weight = score.overall.max(self.config.weight_floor);
        WeightedEvent {
            wallet: event.wallet.clone(),
            value_usd: event.value_usd * weight,
            raw_value_usd: event.value_usd,
            timestamp: event.timestamp,
            chain: event.chain.clone(),
            asset: event.asset.clone(),
            credibility_weight: weight,
        }
    }
}

/// Linear ramp saturating at `cap`.
fn saturating_ratio(value: f64, cap: f64) -> f64 {
    if cap <= 0.0 {
        return 0.0;
    }
    (value / cap).clamp(0.0, 1.0)
}

/// Log-scaled ratio capped at 1.0: fast growth early, saturation at the
/// reference volume.
fn log_ratio(value: f64, reference: f64) -> f64 {
    if reference <= 0.0 || value <= 0.0 {
        return 0.0;
    }
    ((1.0 + value).ln() / (1.0 + reference).ln()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use palisade_core::CredibilityConfig;
    use proptest::prelude::*;

    fn model() -> WeightedCredibilityModel {
        WeightedCredibilityModel::new(CredibilityConfig::default())
    }

    fn profile() -> WalletProfile {
        WalletProfile {
            wallet: "0x1111111111111111111111111111111111111111".to_string(),
            age_days: 400,
            lifetime_volume_usd: 2_000_000.0,
            trade_count: 800,
            active_chains: 4,
            cross_chain_volume_usd: 250_000.0,
            linked_identities: 2,
            clean_custody: true,
            protocol_reputation: 0.9,
        }
    }

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

    #[test]
    fn seasoned_profile_scores_high() {
        let score = model().score(&profile());
        assert!(score.overall >= 0.7, "overall {}", score.overall);
        assert_eq!(score.tier, CredibilityTier::High);
    }

    #[test]
    fn empty_profile_is_unreliable() {
        let fresh = WalletProfile {
            wallet: "0x2222222222222222222222222222222222222222".to_string(),
            age_days: 1,
            lifetime_volume_usd: 0.0,
            trade_count: 0,
            active_chains: 0,
            cross_chain_volume_usd: 0.0,
            linked_identities: 0,
            clean_custody: false,
            protocol_reputation: 0.0,
        };
        let score = model().score(&fresh);
        assert!(score.overall < 0.2, "overall {}", score.overall);
        assert_eq!(score.tier, CredibilityTier::Unreliable);
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        let m = model();
        assert_eq!(m.tier_for(0.7), CredibilityTier::High);
        assert_eq!(m.tier_for(0.699), CredibilityTier::Medium);
        assert_eq!(m.tier_for(0.4), CredibilityTier::Medium);
        assert_eq!(m.tier_for(0.2), CredibilityTier::Low);
        assert_eq!(m.tier_for(0.199), CredibilityTier::Unreliable);
    }

    #[test]
    fn weighting_by_one_is_identity() {
        let m = model();
        let score = CredibilityScore {
            overall: 1.0,
            tier: CredibilityTier::High,
            components: ComponentScores::default(),
        };
        let weighted = m.weight_event(&event(), &score);
        assert_relative_eq!(weighted.value_usd, 1500.0);
        assert_relative_eq!(weighted.credibility_weight, 1.0);
    }

    #[test]
    fn weighting_by_zero_stops_at_floor() {
        let m = model();
        let score = CredibilityScore {
            overall: 0.0,
            tier: CredibilityTier::Unreliable,
            components: ComponentScores::default(),
        };
        let weighted = m.weight_event(&event(), &score);
        assert_relative_eq!(weighted.credibility_weight, 0.1);
        assert_relative_eq!(weighted.value_usd, 150.0);
        assert!(weighted.value_usd > 0.0);
    }

    #[test]
    fn weighting_never_mutates_the_event() {
        let source = event();
        let score = model().score(&profile());
        let _ = model().weight_event(&source, &score);
        assert_eq!(source.value_usd, 1500.0);
    }

    #[test]
    fn default_score_used_without_profile() {
        let score = model().default_score();
        assert_relative_eq!(score.overall, 0.5);
        assert_eq!(score.tier, CredibilityTier::Medium);
    }

    proptest! {
        #[test]
        fn overall_is_monotone_in_each_component(
            base in 0.0f64..1.0,
            bump in 0.0f64..0.5,
            which in 0usize..6,
        ) {
            fn slot(c: &mut ComponentScores, which: usize) -> &mut f64 {
                match which {
                    0 => &mut c.age,
                    1 => &mut c.volume,
                    2 => &mut c.cross_chain,
                    3 => &mut c.identity,
                    4 => &mut c.custody,
                    _ => &mut c.reputation,
                }
            }
            let m = model();
            let low = ComponentScores {
                age: base, volume: base, cross_chain: base,
                identity: base, custody: base, reputation: base,
            };
            let mut high = low;
            *slot(&mut high, which) = (base + bump).min(1.0);
            prop_assert!(m.combine(&high) >= m.combine(&low));
        }

        #[test]
        fn overall_is_monotone_in_raw_age(
            age in 0u32..2_000,
            extra in 1u32..500,
        ) {
            let m = model();
            let mut younger = profile();
            younger.age_days = age;
            let mut older = younger.clone();
            older.age_days = age + extra;
            prop_assert!(m.score(&older).overall >= m.score(&younger).overall);
        }

        #[test]
        fn overall_stays_in_unit_interval(
            age in 0u32..5_000,
            volume in 0.0f64..1e9,
            chains in 0u32..20,
            reputation in -1.0f64..2.0,
        ) {
            let m = model();
            let mut p = profile();
            p.age_days = age;
            p.lifetime_volume_usd = volume;
            p.active_chains = chains;
            p.protocol_reputation = reputation;
            let score = m.score(&p);
            prop_assert!((0.0..=1.0).contains(&score.overall));
        }
    }
}
