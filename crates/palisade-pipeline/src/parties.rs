/// SIMULATED PARTY CLIENTS
///
/// Deterministic party implementations used by the CLI, the red-team
/// harness, and tests. Real deployments substitute transport-backed
/// `PartyClient` implementations; the consensus layer cannot tell the
/// difference.

use async_trait::async_trait;
use palisade_core::LiquidationEvent;

use crate::consensus::{PartyClient, PartyError};

/// Reports the event's value with a fixed bias in basis points.
#[derive(Debug, Clone)]
pub struct HonestParty {
    id: String,
    bias_bps: i32,
}

impl HonestParty {
    pub fn new(id: &str, bias_bps: i32) -> Self {
        HonestParty {
            id: id.to_string(),
            bias_bps,
        }
    }
}

#[async_trait]
impl PartyClient for HonestParty {
    fn party_id(&self) -> &str {
        &self.id
    }

    async fn observe(&self, event: &LiquidationEvent) -> Result<f64, PartyError> {
        Ok(event.value_usd * (1.0 + self.bias_bps as f64 / 10_000.0))
    }
}

/// Reports a value inflated by a fixed factor, confirming whatever the
/// attacker claims.
#[derive(Debug, Clone)]
pub struct ColludingParty {
    id: String,
    inflation_factor: f64,
}

impl ColludingParty {
    pub fn new(id: &str, inflation_factor: f64) -> Self {
        ColludingParty {
            id: id.to_string(),
            inflation_factor,
        }
    }
}

#[async_trait]
impl PartyClient for ColludingParty {
    fn party_id(&self) -> &str {
        &self.id
    }

    async fn observe(&self, event: &LiquidationEvent) -> Result<f64, PartyError> {
        Ok(event.value_usd * self.inflation_factor)
    }
}

/// Answers honestly, but only after a delay. Exercises the per-party
/// timeout path.
#[derive(Debug, Clone)]
pub struct SlowParty {
    id: String,
    delay_ms: u64,
    bias_bps: i32,
}

impl SlowParty {
    pub fn new(id: &str, delay_ms: u64, bias_bps: i32) -> Self {
        SlowParty {
            id: id.to_string(),
            delay_ms,
            bias_bps,
        }
    }
}

#[async_trait]
impl PartyClient for SlowParty {
    fn party_id(&self) -> &str {
        &self.id
    }

    async fn observe(&self, event: &LiquidationEvent) -> Result<f64, PartyError> {
        tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        Ok(event.value_usd * (1.0 + self.bias_bps as f64 / 10_000.0))
    }
}

/// Always errors. Exercises the discard path.
#[derive(Debug, Clone)]
pub struct FaultyParty {
    id: String,
}

impl FaultyParty {
    pub fn new(id: &str) -> Self {
        FaultyParty { id: id.to_string() }
    }
}

#[async_trait]
impl PartyClient for FaultyParty {
    fn party_id(&self) -> &str {
        &self.id
    }

    async fn observe(&self, _event: &LiquidationEvent) -> Result<f64, PartyError> {
        Err(PartyError::Backend("simulated outage".to_string()))
    }
}

/// Standard five-party honest roster used by the CLI and tests.
pub fn honest_roster() -> Vec<std::sync::Arc<dyn PartyClient>> {
    (0..5)
        .map(|i| {
            std::sync::Arc::new(HonestParty::new(
                &format!("observer-{i}"),
                (i as i32 - 2) * 10,
            )) as std::sync::Arc<dyn PartyClient>
        })
        .collect()
}
