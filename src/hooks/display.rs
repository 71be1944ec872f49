//! Conversions from wire records (fixed point, unix seconds) to the float
//! display units the dashboard renders.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::FIXED_POINT_SCALE;
use crate::types::{Auction, UserDomain};

const HOUR_MS: i128 = 60 * 60 * 1000;
const MINUTE_MS: i128 = 60 * 1000;

pub fn from_fixed_point(amount: u64) -> f64 {
    amount as f64 / FIXED_POINT_SCALE
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Countdown to `end_time_secs`. Hours are not rolled into days.
pub fn time_left(end_time_secs: u64, now_ms: u64) -> String {
    let diff = i128::from(end_time_secs) * 1000 - i128::from(now_ms);
    if diff <= 0 {
        return "Ended".to_string();
    }
    let hours = diff / HOUR_MS;
    let minutes = (diff % HOUR_MS) / MINUTE_MS;
    format!("{hours}h {minutes}m")
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayAuction {
    pub id: String,
    pub domain: String,
    pub current_bid: f64,
    pub fmv: f64,
    pub time_left: String,
    pub status: &'static str,
    pub potential_profit: f64,
}

impl DisplayAuction {
    pub fn from_auction(a: &Auction, now_ms: u64) -> Self {
        Self {
            id: a.id.clone(),
            domain: a.domain.clone(),
            current_bid: from_fixed_point(a.current_bid),
            fmv: from_fixed_point(a.fmv),
            time_left: time_left(a.end_time, now_ms),
            status: if a.active { "Active Bid" } else { "Monitoring" },
            potential_profit: a.potential_profit as f64 / FIXED_POINT_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayDomain {
    pub id: String,
    pub domain: String,
    pub purchase_price: f64,
    /// Purchase price with the client-side appreciation applied.
    pub current_value: f64,
    pub collateral_score: u8,
    pub profit: f64,
    pub profit_percent: f64,
}

impl DisplayDomain {
    pub fn from_user_domain(d: &UserDomain, appreciation: f64) -> Self {
        let purchase_price = from_fixed_point(d.purchase_price);
        let current_value = purchase_price * appreciation;
        let profit = current_value - purchase_price;
        let profit_percent = if purchase_price > 0.0 {
            profit / purchase_price * 100.0
        } else {
            0.0
        };
        Self {
            id: d.id.clone(),
            domain: d.name.clone(),
            purchase_price,
            current_value,
            collateral_score: d.collateral_score,
            profit,
            profit_percent,
        }
    }
}
