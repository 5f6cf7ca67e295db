/// INPUT VALIDATION
///
/// Stateless structural and range checks on a single event. This is the
/// cheapest layer and runs first; later layers never see an event that
/// failed here. Checks short-circuit in a fixed order and every failure
/// carries a stable, machine-checkable reason string.
///
/// The multi-venue check consults an external activity oracle. The oracle is
/// trusted, but a fault from it must not crash validation: it degrades the
/// event toward rejection.

use palisade_core::{AddressGrammar, InputConfig, LiquidationEvent};
use thiserror::Error;

/// Stable reason codes, prefixed onto every rejection reason.
pub mod reason {
    pub const ADDRESS_FORMAT: &str = "wallet_address_format";
    pub const WALLET_AGE: &str = "wallet_age_below_minimum";
    pub const TRADE_COUNT: &str = "trade_count_below_minimum";
    pub const VALUE_BAND: &str = "value_outside_band";
    pub const BLOCKLISTED: &str = "wallet_blocklisted";
    pub const SINGLE_VENUE: &str = "single_venue_activity";
    pub const ORACLE_UNAVAILABLE: &str = "activity_oracle_unavailable";
}

#[derive(Debug, Error)]
pub enum ActivityOracleError {
    #[error("Activity oracle unavailable: {0}")]
    Unavailable(String),
}

/// External collaborator answering "on how many venues is this wallet
/// active?". Treated as a trusted oracle call.
pub trait ActivityOracle: Send + Sync {
    fn active_venue_count(&self, wallet: &str) -> Result<u32, ActivityOracleError>;
}

/// Fixed venue-count table, for deployments that pre-resolve activity and
/// for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticActivityOracle {
    venues: std::collections::HashMap<String, u32>,
}

impl StaticActivityOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(mut self, wallet: &str, venue_count: u32) -> Self {
        self.venues.insert(wallet.to_string(), venue_count);
        self
    }
}

impl ActivityOracle for StaticActivityOracle {
    fn active_venue_count(&self, wallet: &str) -> Result<u32, ActivityOracleError> {
        Ok(self.venues.get(wallet).copied().unwrap_or(0))
    }
}

/// Result of input validation. A rejection is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputVerdict {
    pub valid: bool,
    pub reason: Option<String>,
}

impl InputVerdict {
    fn pass() -> Self {
        InputVerdict {
            valid: true,
            reason: None,
        }
    }

    fn reject(reason: String) -> Self {
        InputVerdict {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Stateless per-event validator. Total over well-formed events: it never
/// panics and never returns an error, only a verdict.
pub struct InputValidator {
    config: InputConfig,
}

impl InputValidator {
    pub fn new(config: InputConfig) -> Self {
        InputValidator { config }
    }

    /// Run all checks in order, short-circuiting on the first failure.
    pub fn check(&self, event: &LiquidationEvent, oracle: &dyn ActivityOracle) -> InputVerdict {
        // 1. Address grammar
        if !self.matches_any_grammar(&event.wallet) {
            return InputVerdict::reject(format!(
                "{}: '{}' matches no configured grammar",
                reason::ADDRESS_FORMAT,
                event.wallet
            ));
        }

        // 2. Wallet age
        if event.wallet_age_days < self.config.min_wallet_age_days {
            return InputVerdict::reject(format!(
                "{}: {}d < {}d",
                reason::WALLET_AGE,
                event.wallet_age_days,
                self.config.min_wallet_age_days
            ));
        }

        // 3. Activity count
        if event.trade_count < self.config.min_trade_count {
            return InputVerdict::reject(format!(
                "{}: {} < {}",
                reason::TRADE_COUNT,
                event.trade_count,
                self.config.min_trade_count
            ));
        }

        // 4. Value band
        if !event.value_usd.is_finite()
            || event.value_usd < self.config.min_value_usd
            || event.value_usd > self.config.max_value_usd
        {
            return InputVerdict::reject(format!(
                "{}: {} outside [{}, {}]",
                reason::VALUE_BAND,
                event.value_usd,
                self.config.min_value_usd,
                self.config.max_value_usd
            ));
        }

        // 5. Blocklist
        if self.config.blocklist.contains(&event.wallet) {
            return InputVerdict::reject(format!("{}: {}", reason::BLOCKLISTED, event.wallet));
        }

        // 6. Multi-venue activity
        match oracle.active_venue_count(&event.wallet) {
            Ok(venues) if venues > 1 => InputVerdict::pass(),
            Ok(venues) => InputVerdict::reject(format!(
                "{}: active on {} venue(s), need more than 1",
                reason::SINGLE_VENUE,
                venues
            )),
            Err(fault) => {
                log::warn!("activity oracle fault for {}: {}", event.wallet, fault);
                InputVerdict::reject(format!("{}: {}", reason::ORACLE_UNAVAILABLE, fault))
            }
        }
    }

    fn matches_any_grammar(&self, wallet: &str) -> bool {
        self.config
            .address_grammars
            .iter()
            .any(|grammar| matches_grammar(*grammar, wallet))
    }
}

fn matches_grammar(grammar: AddressGrammar, wallet: &str) -> bool {
    match grammar {
        AddressGrammar::Evm => {
            wallet.len() == 42
                && wallet.starts_with("0x")
                && wallet[2..].chars().all(|c| c.is_ascii_hexdigit())
        }
        AddressGrammar::Solana => {
            (32..=44).contains(&wallet.len()) && wallet.chars().all(is_base58_char)
        }
        AddressGrammar::Cosmos => {
            wallet.len() == 45
                && wallet.starts_with("cosmos1")
                && wallet[7..].chars().all(is_bech32_char)
        }
    }
}

fn is_base58_char(c: char) -> bool {
    c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
}

fn is_bech32_char(c: char) -> bool {
    // bech32 charset excludes '1', 'b', 'i', 'o'
    matches!(c, 'a'..='z' | '0'..='9') && !matches!(c, '1' | 'b' | 'i' | 'o')
}
