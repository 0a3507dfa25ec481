// config.rs
use bigdecimal::BigDecimal;
use std::str::FromStr;

/// Platform-level knobs for the lifecycle engine. Fee fractions and window
/// durations are deliberately configuration, never hard-coded in services.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fraction of the contract amount charged up-front as the deposit leg.
    pub deposit_fraction: BigDecimal,
    /// Platform fee, levied on the deposit leg.
    pub platform_fee_fraction: BigDecimal,
    /// Floor below which bids are rejected outright.
    pub minimum_bid_amount: BigDecimal,
    /// Days the homeowner has to approve or contest a submitted completion.
    pub dispute_window_days: i64,
    /// Hours the contractor has to respond before mediation can be escalated.
    pub mediation_window_hours: i64,
    /// Days a rework resolution stays open before the scheduler may expire it.
    pub rework_window_days: i64,
}

impl Config {
    pub fn init() -> Config {
        let deposit_fraction = std::env::var("DEPOSIT_FRACTION")
            .unwrap_or_else(|_| "0.25".to_string());
        let platform_fee_fraction = std::env::var("PLATFORM_FEE_FRACTION")
            .unwrap_or_else(|_| "0.15".to_string());
        let minimum_bid_amount = std::env::var("MINIMUM_BID_AMOUNT")
            .unwrap_or_else(|_| "50.00".to_string());
        let dispute_window_days = std::env::var("DISPUTE_WINDOW_DAYS")
            .unwrap_or_else(|_| "7".to_string());
        let mediation_window_hours = std::env::var("MEDIATION_WINDOW_HOURS")
            .unwrap_or_else(|_| "48".to_string());
        let rework_window_days = std::env::var("REWORK_WINDOW_DAYS")
            .unwrap_or_else(|_| "7".to_string());

        Config {
            deposit_fraction: BigDecimal::from_str(&deposit_fraction)
                .expect("DEPOSIT_FRACTION must be a decimal"),
            platform_fee_fraction: BigDecimal::from_str(&platform_fee_fraction)
                .expect("PLATFORM_FEE_FRACTION must be a decimal"),
            minimum_bid_amount: BigDecimal::from_str(&minimum_bid_amount)
                .expect("MINIMUM_BID_AMOUNT must be a decimal"),
            dispute_window_days: dispute_window_days
                .parse::<i64>()
                .expect("DISPUTE_WINDOW_DAYS must be an integer"),
            mediation_window_hours: mediation_window_hours
                .parse::<i64>()
                .expect("MEDIATION_WINDOW_HOURS must be an integer"),
            rework_window_days: rework_window_days
                .parse::<i64>()
                .expect("REWORK_WINDOW_DAYS must be an integer"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            deposit_fraction: BigDecimal::from_str("0.25").unwrap(),
            platform_fee_fraction: BigDecimal::from_str("0.15").unwrap(),
            minimum_bid_amount: BigDecimal::from_str("50.00").unwrap(),
            dispute_window_days: 7,
            mediation_window_hours: 48,
            rework_window_days: 7,
        }
    }
}
