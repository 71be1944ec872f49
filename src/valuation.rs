//! Every estimate that is not read straight from the upstream goes through
//! [`Valuation`]. Production uses [`RandomValuation`]; tests pin the draw
//! with [`FixedValuation`].

use rand::Rng;

use crate::config::FIXED_POINT_SCALE;

pub const FMV_RANGE: (f64, f64) = (1.15, 1.25);
pub const PURCHASE_DISCOUNT_RANGE: (f64, f64) = (0.70, 0.90);
pub const FINAL_BID_RANGE: (f64, f64) = (1.05, 1.20);
/// Share of historical auctions that end with a buyer.
pub const WINNER_PROBABILITY: f64 = 0.6;
/// Client-side appreciation applied on top of the purchase price.
pub const APPRECIATION_FACTOR: f64 = 1.35;

pub trait Valuation: Send + Sync {
    /// One draw in `[0, 1)`. Every provided method is derived from this.
    fn unit(&self) -> f64;

    fn fmv_multiplier(&self) -> f64 {
        lerp(FMV_RANGE, self.unit())
    }

    fn purchase_discount(&self) -> f64 {
        lerp(PURCHASE_DISCOUNT_RANGE, self.unit())
    }

    fn final_bid_multiplier(&self) -> f64 {
        lerp(FINAL_BID_RANGE, self.unit())
    }

    fn has_winner(&self) -> bool {
        self.unit() < WINNER_PROBABILITY
    }

    /// Index into a collection of `len` items. Returns 0 for an empty one.
    fn pick_index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.unit() * len as f64) as usize).min(len - 1)
    }

    /// Whole-USDC amount in `[min_usdc, max_usdc)`, returned in fixed point.
    fn sample_usdc(&self, min_usdc: u64, max_usdc: u64) -> u64 {
        let span = max_usdc.saturating_sub(min_usdc) as f64;
        let whole = min_usdc + (self.unit() * span).floor() as u64;
        whole * FIXED_POINT_SCALE as u64
    }

    /// Truncated placeholder address such as `0x1a2b3c4d...`.
    fn short_address(&self) -> String {
        let n = (self.unit() * f64::from(u32::MAX)) as u32;
        format!("0x{n:08x}...")
    }

    fn appreciation_factor(&self) -> f64 {
        APPRECIATION_FACTOR
    }

    /// Length-based value estimate for a name with no listed price.
    /// Shorter labels are worth more; the floor is 100 USDC.
    fn estimate_value(&self, name: &str) -> u64 {
        let label_len = name.split('.').next().unwrap_or(name).chars().count() as u64;
        let usdc = 10_000u64.saturating_sub(label_len * 750).max(100);
        usdc * FIXED_POINT_SCALE as u64
    }
}

fn lerp((lo, hi): (f64, f64), t: f64) -> f64 {
    lo + (hi - lo) * t.clamp(0.0, 1.0)
}

/// Thread-local RNG per draw.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomValuation;

impl Valuation for RandomValuation {
    fn unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Always returns the same draw.
#[derive(Debug, Clone, Copy)]
pub struct FixedValuation(pub f64);

impl Valuation for FixedValuation {
    fn unit(&self) -> f64 {
        self.0
    }
}
