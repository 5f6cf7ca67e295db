/// LIQUIDATION EVENT MODEL
///
/// Events are reported by external data sources and are untrusted until the
/// pipeline has ruled on them. An event is immutable once submitted: the core
/// reads and annotates, it never rewrites source fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One reported liquidation occurrence, as received from an ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    /// Originating wallet address (untrusted identity handle)
    pub wallet: String,
    /// Liquidated value in USD
    pub value_usd: f64,
    /// Age of the wallet in days, as claimed by the source
    pub wallet_age_days: u32,
    /// Lifetime trade count, as claimed by the source
    pub trade_count: u32,
    /// When the liquidation occurred
    pub timestamp: DateTime<Utc>,
    /// Chain / venue the event was observed on
    pub chain: String,
    /// Asset that was liquidated
    pub asset: String,
}

impl LiquidationEvent {
    /// Categorical behavior signature used by pattern-repetition detection.
    ///
    /// Two events share a pattern when they liquidate the same asset on the
    /// same chain at the same order of magnitude.
    pub fn behavior_pattern(&self) -> String {
        let magnitude = if self.value_usd >= 1.0 {
            self.value_usd.log10().floor() as i32
        } else {
            0
        };
        format!("{}:{}:e{}", self.asset, self.chain, magnitude)
    }

    /// Deterministic content hash (same event → same hash).
    pub fn content_hash(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.wallet.as_bytes());
        hasher.update(self.value_usd.to_le_bytes());
        hasher.update(self.wallet_age_days.to_le_bytes());
        hasher.update(self.trade_count.to_le_bytes());
        hasher.update(self.timestamp.timestamp_millis().to_le_bytes());
        hasher.update(self.chain.as_bytes());
        hasher.update(self.asset.as_bytes());
        hasher.finalize().to_vec()
    }
}

/// Copy of an event's numeric payload scaled by credibility, handed to the
/// downstream incentive ledger. The source event is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEvent {
    /// Wallet the weighting applies to
    pub wallet: String,
    /// Value after credibility scaling
    pub value_usd: f64,
    /// Original reported value, carried for audit
    pub raw_value_usd: f64,
    /// Timestamp of the source event
    pub timestamp: DateTime<Utc>,
    /// Chain of the source event
    pub chain: String,
    /// Asset of the source event
    pub asset: String,
    /// The applied weight, `max(overall_score, floor)`
    pub credibility_weight: f64,
}

/// Wallet reputation attributes, supplied by an external profile source.
///
/// Cryptographic identity proofs are opaque here: the profile only records
/// whether linkage signals exist, not how they were verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletProfile {
    /// Wallet address the profile describes
    pub wallet: String,
    /// Verified wallet age in days
    pub age_days: u32,
    /// Lifetime traded volume in USD
    pub lifetime_volume_usd: f64,
    /// Lifetime trade count
    pub trade_count: u32,
    /// Number of chains with observed activity
    pub active_chains: u32,
    /// Volume bridged or traded across chains, USD
    pub cross_chain_volume_usd: f64,
    /// Count of linked social / identity signals
    pub linked_identities: u32,
    /// Custody hygiene: no key reuse or custodial mixing observed
    pub clean_custody: bool,
    /// Externally supplied protocol reputation, [0,1]
    pub protocol_reputation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

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
    fn content_hash_is_deterministic() {
        assert_eq!(event().content_hash(), event().content_hash());
    }

    #[test]
    fn content_hash_changes_with_value() {
        let mut other = event();
        other.value_usd = 1501.0;
        assert_ne!(event().content_hash(), other.content_hash());
    }

    #[test]
    fn behavior_pattern_buckets_by_magnitude() {
        let mut a = event();
        let mut b = event();
        a.value_usd = 1200.0;
        b.value_usd = 9800.0;
        // Same order of magnitude
        assert_eq!(a.behavior_pattern(), b.behavior_pattern());

        b.value_usd = 98_000.0;
        assert_ne!(a.behavior_pattern(), b.behavior_pattern());
    }
}
