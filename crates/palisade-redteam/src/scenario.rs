/// ATTACK SCENARIO CATALOGUE
///
/// Each scenario synthesizes adversarial events, windows, and profiles
/// designed to slip past one specific pipeline layer. Scenarios are
/// registered as trait objects so new attack kinds can be added without
/// touching the runner loop.
///
/// Generation is seeded: the same seed produces the same cases, so an
/// assessment run is reproducible end to end.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use palisade_core::{LiquidationEvent, WalletProfile};
use palisade_pipeline::{ColludingParty, PartyClient};

/// Attack families the catalogue covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Farms of fresh wallets reporting fabricated liquidations
    FabricatedWalletFarm,
    /// Bot fleet liquidating on a mechanical clock
    CoordinatedTiming,
    /// One confirming party colluding with the reporter
    SinglePartyCollusion,
    /// Self-dealing wash liquidations bouncing between wallets
    WashTradeLoop,
    /// Values probing the edges of the accepted band
    ValueBandProbe,
    /// Activity mirage split across venues that never co-move
    CrossVenueMirage,
    /// Aged wallet dressed up with a hollow profile
    IdentityWash,
}

impl AttackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackKind::FabricatedWalletFarm => "FABRICATED_WALLET_FARM",
            AttackKind::CoordinatedTiming => "COORDINATED_TIMING",
            AttackKind::SinglePartyCollusion => "SINGLE_PARTY_COLLUSION",
            AttackKind::WashTradeLoop => "WASH_TRADE_LOOP",
            AttackKind::ValueBandProbe => "VALUE_BAND_PROBE",
            AttackKind::CrossVenueMirage => "CROSS_VENUE_MIRAGE",
            AttackKind::IdentityWash => "IDENTITY_WASH",
        }
    }
}

/// Which pipeline layer the scenario tries to evade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetLayer {
    Input,
    Anomaly,
    Consensus,
    Credibility,
}

/// Nominal severity if the attack were to land in production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttackSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AttackSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackSeverity::Low => "LOW",
            AttackSeverity::Medium => "MEDIUM",
            AttackSeverity::High => "HIGH",
            AttackSeverity::Critical => "CRITICAL",
        }
    }
}

/// One synthesized adversarial submission: the event plus the context and
/// collaborators it arrives with.
pub struct AttackCase {
    pub label: String,
    pub event: LiquidationEvent,
    pub window: Vec<LiquidationEvent>,
    pub profile: Option<WalletProfile>,
    /// Venue-activity answers the oracle should give for this case
    pub venue_activity: Vec<(String, u32)>,
    /// Party roster override; `None` means the standard honest roster
    pub parties: Option<Vec<Arc<dyn PartyClient>>>,
}

/// A named adversarial generator. The pipeline under test is a black box
/// to scenarios: they produce inputs, nothing else.
pub trait AttackScenario: Send + Sync {
    fn name(&self) -> &'static str;
    fn kind(&self) -> AttackKind;
    fn target_layer(&self) -> TargetLayer;
    fn severity(&self) -> AttackSeverity;

    /// Fraction of cases that may slip through before the attack counts
    /// as successful.
    fn acceptable_success_rate(&self) -> f64 {
        0.05
    }

    fn mitigations(&self) -> Vec<String>;

    fn build_cases(&self, rng: &mut StdRng) -> Vec<AttackCase>;
}

/// The fixed catalogue, in deterministic run order.
pub fn default_catalogue() -> Vec<Box<dyn AttackScenario>> {
    vec![
        Box::new(FabricatedWalletFarm),
        Box::new(CoordinatedTiming),
        Box::new(SinglePartyCollusion),
        Box::new(WashTradeLoop),
        Box::new(ValueBandProbe),
        Box::new(CrossVenueMirage),
        Box::new(IdentityWash),
    ]
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
}

fn random_wallet(rng: &mut StdRng) -> String {
    format!("0x{:040x}", rng.gen::<u128>())
}

fn plain_event(wallet: &str, value: f64, at: DateTime<Utc>, chain: &str) -> LiquidationEvent {
    LiquidationEvent {
        wallet: wallet.to_string(),
        value_usd: value,
        wallet_age_days: 120,
        trade_count: 60,
        timestamp: at,
        chain: chain.to_string(),
        asset: "ETH".to_string(),
    }
}

/// An unremarkable backdrop window: mixed wallets, hours apart.
fn quiet_window(rng: &mut StdRng) -> Vec<LiquidationEvent> {
    let hours = [0i64, 4, 9, 13, 17, 21];
    hours
        .iter()
        .map(|&hour| {
            plain_event(
                &random_wallet(rng),
                rng.gen_range(400.0..8_000.0),
                base_time() + Duration::seconds(hour * 3600 + rng.gen_range(0..1_800)),
                if hour % 2 == 0 { "arbitrum" } else { "base" },
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Fresh wallets with no history report mid-sized liquidations, hoping the
/// sheer count beats per-wallet scrutiny.
pub struct FabricatedWalletFarm;

impl AttackScenario for FabricatedWalletFarm {
    fn name(&self) -> &'static str {
        "fabricated-wallet-farm"
    }
    fn kind(&self) -> AttackKind {
        AttackKind::FabricatedWalletFarm
    }
    fn target_layer(&self) -> TargetLayer {
        TargetLayer::Input
    }
    fn severity(&self) -> AttackSeverity {
        AttackSeverity::High
    }

    fn mitigations(&self) -> Vec<String> {
        vec![
            "Keep minimum wallet age and trade-count thresholds enforced".to_string(),
            "Require multi-venue activity before events earn incentives".to_string(),
            "Rate-limit first-seen wallets at ingestion".to_string(),
        ]
    }

    fn build_cases(&self, rng: &mut StdRng) -> Vec<AttackCase> {
        (0..20)
            .map(|i| {
                let wallet = random_wallet(rng);
                let mut event = plain_event(
                    &wallet,
                    rng.gen_range(500.0..2_000.0),
                    base_time() + Duration::hours(20),
                    "arbitrum",
                );
                event.wallet_age_days = rng.gen_range(0..6);
                event.trade_count = rng.gen_range(0..4);
                AttackCase {
                    label: format!("farm-wallet-{i}"),
                    venue_activity: vec![(wallet, 1)],
                    event,
                    window: quiet_window(rng),
                    profile: None,
                    parties: None,
                }
            })
            .collect()
    }
}

/// A bot fleet liquidates on one venue with a mechanical clock. The event
/// under test rides at the end of the train.
pub struct CoordinatedTiming;

impl AttackScenario for CoordinatedTiming {
    fn name(&self) -> &'static str {
        "coordinated-timing"
    }
    fn kind(&self) -> AttackKind {
        AttackKind::CoordinatedTiming
    }
    fn target_layer(&self) -> TargetLayer {
        TargetLayer::Anomaly
    }
    fn severity(&self) -> AttackSeverity {
        AttackSeverity::High
    }

    fn mitigations(&self) -> Vec<String> {
        vec![
            "Keep timing-regularity and volume-spike checks enabled".to_string(),
            "Tighten the anomaly tolerance for single-venue bursts".to_string(),
        ]
    }

    fn build_cases(&self, rng: &mut StdRng) -> Vec<AttackCase> {
        (0..5)
            .map(|case| {
                // 100 events, ~60s apart with at most 2s of jitter
                let mut at = base_time() + Duration::hours(10);
                let window: Vec<LiquidationEvent> = (0..100)
                    .map(|_| {
                        at = at + Duration::seconds(60 + rng.gen_range(0..=2));
                        plain_event(&random_wallet(rng), 1_200.0, at, "arbitrum")
                    })
                    .collect();
                let wallet = random_wallet(rng);
                let event = plain_event(&wallet, 1_200.0, at + Duration::seconds(61), "arbitrum");
                AttackCase {
                    label: format!("bot-train-{case}"),
                    venue_activity: vec![(wallet, 3)],
                    event,
                    window,
                    profile: None,
                    parties: None,
                }
            })
            .collect()
    }
}

/// The reporter inflates the liquidation value and one corrupted party
/// confirms it; the independent majority observes the true value.
pub struct SinglePartyCollusion;

impl AttackScenario for SinglePartyCollusion {
    fn name(&self) -> &'static str {
        "single-party-collusion"
    }
    fn kind(&self) -> AttackKind {
        AttackKind::SinglePartyCollusion
    }
    fn target_layer(&self) -> TargetLayer {
        TargetLayer::Consensus
    }
    fn severity(&self) -> AttackSeverity {
        AttackSeverity::Critical
    }

    fn mitigations(&self) -> Vec<String> {
        vec![
            "Keep the quorum at 3+ independent parties".to_string(),
            "Use median aggregation, never the mean".to_string(),
            "Rotate party sets so a single compromise cannot persist".to_string(),
        ]
    }

    fn build_cases(&self, rng: &mut StdRng) -> Vec<AttackCase> {
        (0..6)
            .map(|case| {
                let inflation = rng.gen_range(1.5..2.5);
                let wallet = random_wallet(rng);
                let claimed = rng.gen_range(2_000.0..20_000.0);
                let event =
                    plain_event(&wallet, claimed, base_time() + Duration::hours(20), "arbitrum");
                // Independents see the un-inflated value; the colluder
                // confirms the claim verbatim.
                let truth_factor = 1.0 / inflation;
                let mut parties: Vec<Arc<dyn PartyClient>> = (0..4)
                    .map(|i| {
                        Arc::new(ColludingParty::new(
                            &format!("independent-{i}"),
                            truth_factor * (1.0 + (i as f64 - 1.5) * 0.002),
                        )) as Arc<dyn PartyClient>
                    })
                    .collect();
                parties.push(Arc::new(ColludingParty::new("corrupted", 1.0)));
                AttackCase {
                    label: format!("collusion-{case}-x{inflation:.2}"),
                    venue_activity: vec![(wallet, 2)],
                    event,
                    window: quiet_window(rng),
                    profile: None,
                    parties: Some(parties),
                }
            })
            .collect()
    }
}

/// Wallets bounce value between themselves in rapid pairs on a uniform
/// clock: self-dealing dressed up as organic liquidations.
pub struct WashTradeLoop;

impl AttackScenario for WashTradeLoop {
    fn name(&self) -> &'static str {
        "wash-trade-loop"
    }
    fn kind(&self) -> AttackKind {
        AttackKind::WashTradeLoop
    }
    fn target_layer(&self) -> TargetLayer {
        TargetLayer::Anomaly
    }
    fn severity(&self) -> AttackSeverity {
        AttackSeverity::Medium
    }

    fn mitigations(&self) -> Vec<String> {
        vec![
            "Keep the impossible-sequence check on same-wallet value jumps".to_string(),
            "Tighten the anomaly tolerance for single-venue bursts".to_string(),
        ]
    }

    fn build_cases(&self, rng: &mut StdRng) -> Vec<AttackCase> {
        (0..4)
            .map(|case| {
                // 30 wallet pairs, each a 12x jump 55s apart, back to back
                let mut window = Vec::new();
                let mut at = base_time() + Duration::hours(12);
                for _ in 0..30 {
                    let wallet = random_wallet(rng);
                    at = at + Duration::seconds(55);
                    window.push(plain_event(&wallet, 600.0, at, "arbitrum"));
                    at = at + Duration::seconds(55);
                    window.push(plain_event(&wallet, 7_500.0, at, "arbitrum"));
                }
                let wallet = random_wallet(rng);
                let event = plain_event(&wallet, 1_800.0, at + Duration::seconds(55), "arbitrum");
                AttackCase {
                    label: format!("wash-loop-{case}"),
                    venue_activity: vec![(wallet, 2)],
                    event,
                    window,
                    profile: None,
                    parties: None,
                }
            })
            .collect()
    }
}

/// Values at and beyond the band edges, hunting for an off-by-one in the
/// range check.
pub struct ValueBandProbe;

impl AttackScenario for ValueBandProbe {
    fn name(&self) -> &'static str {
        "value-band-probe"
    }
    fn kind(&self) -> AttackKind {
        AttackKind::ValueBandProbe
    }
    fn target_layer(&self) -> TargetLayer {
        TargetLayer::Input
    }
    fn severity(&self) -> AttackSeverity {
        AttackSeverity::Low
    }

    fn mitigations(&self) -> Vec<String> {
        vec![
            "Validate the value band inclusively at both edges".to_string(),
            "Reject non-finite values before any arithmetic".to_string(),
        ]
    }

    fn build_cases(&self, rng: &mut StdRng) -> Vec<AttackCase> {
        let probes: [(&str, f64); 6] = [
            ("zero", 0.0),
            ("dust", 0.01),
            ("below-min", 99.99),
            ("above-max", 10_000_001.0),
            ("absurd", 1e12),
            ("nan", f64::NAN),
        ];
        probes
            .iter()
            .map(|(label, value)| {
                let wallet = random_wallet(rng);
                let event =
                    plain_event(&wallet, *value, base_time() + Duration::hours(20), "arbitrum");
                AttackCase {
                    label: format!("band-{label}"),
                    venue_activity: vec![(wallet, 2)],
                    event,
                    window: quiet_window(rng),
                    profile: None,
                    parties: None,
                }
            })
            .collect()
    }
}

/// Activity split across two venues that never co-move, with the flood
/// concentrated on one of them.
pub struct CrossVenueMirage;

impl AttackScenario for CrossVenueMirage {
    fn name(&self) -> &'static str {
        "cross-venue-mirage"
    }
    fn kind(&self) -> AttackKind {
        AttackKind::CrossVenueMirage
    }
    fn target_layer(&self) -> TargetLayer {
        TargetLayer::Anomaly
    }
    fn severity(&self) -> AttackSeverity {
        AttackSeverity::High
    }

    fn mitigations(&self) -> Vec<String> {
        vec![
            "Keep the cross-venue correlation floor enforced".to_string(),
            "Compare venue activity shares against market baselines".to_string(),
        ]
    }

    fn build_cases(&self, rng: &mut StdRng) -> Vec<AttackCase> {
        (0..4)
            .map(|case| {
                let mut window = Vec::new();
                // Venue A: steady drip through hours 0-8, silent 9-10
                for hour in 0..9i64 {
                    for _ in 0..2 {
                        window.push(plain_event(
                            &random_wallet(rng),
                            2_000.0,
                            base_time() + Duration::seconds(hour * 3600 + rng.gen_range(0..3_500)),
                            "arbitrum",
                        ));
                    }
                }
                // Venue B: wakes up exactly when A sleeps
                for hour in 9..11i64 {
                    for _ in 0..3 {
                        window.push(plain_event(
                            &random_wallet(rng),
                            700.0,
                            base_time() + Duration::seconds(hour * 3600 + rng.gen_range(0..3_500)),
                            "base",
                        ));
                    }
                }
                // Venue A again: 40-event burst in hour 11
                for i in 0..40i64 {
                    window.push(plain_event(
                        &random_wallet(rng),
                        2_000.0,
                        base_time() + Duration::seconds(11 * 3600 + i * 85),
                        "arbitrum",
                    ));
                }
                window.sort_by_key(|e| e.timestamp);
                let wallet = random_wallet(rng);
                let event = plain_event(
                    &wallet,
                    2_000.0,
                    base_time() + Duration::seconds(11 * 3600 + 40 * 85 + 30),
                    "arbitrum",
                );
                AttackCase {
                    label: format!("mirage-{case}"),
                    venue_activity: vec![(wallet, 2)],
                    event,
                    window,
                    profile: None,
                    parties: None,
                }
            })
            .collect()
    }
}

/// A bought aged wallet with a hollow profile: old, but no volume, no
/// footprint, no linkage, dirty custody.
pub struct IdentityWash;

impl AttackScenario for IdentityWash {
    fn name(&self) -> &'static str {
        "identity-wash"
    }
    fn kind(&self) -> AttackKind {
        AttackKind::IdentityWash
    }
    fn target_layer(&self) -> TargetLayer {
        TargetLayer::Credibility
    }
    fn severity(&self) -> AttackSeverity {
        AttackSeverity::High
    }

    fn mitigations(&self) -> Vec<String> {
        vec![
            "Weight cross-venue footprint and custody hygiene, not age alone".to_string(),
            "Keep the minimum-credibility policy threshold enforced".to_string(),
        ]
    }

    fn build_cases(&self, rng: &mut StdRng) -> Vec<AttackCase> {
        (0..8)
            .map(|case| {
                let wallet = random_wallet(rng);
                let mut event = plain_event(
                    &wallet,
                    rng.gen_range(1_000.0..5_000.0),
                    base_time() + Duration::hours(20),
                    "arbitrum",
                );
                event.wallet_age_days = 400;
                event.trade_count = 15;
                let profile = WalletProfile {
                    wallet: wallet.clone(),
                    age_days: 400 + rng.gen_range(0..200),
                    lifetime_volume_usd: rng.gen_range(500.0..4_000.0),
                    trade_count: 15,
                    active_chains: 1,
                    cross_chain_volume_usd: 0.0,
                    linked_identities: 0,
                    clean_custody: false,
                    protocol_reputation: rng.gen_range(0.0..0.1),
                };
                AttackCase {
                    label: format!("washed-identity-{case}"),
                    venue_activity: vec![(wallet, 2)],
                    event,
                    window: quiet_window(rng),
                    profile: Some(profile),
                    parties: None,
                }
            })
            .collect()
    }
}
