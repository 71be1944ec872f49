//! Upstream records → response records. Pure; `now` is always passed in.

use tracing::debug;

use crate::types::{Auction, HistoricalAuction, UserDomain};
use crate::upstream::{Listing, OwnedName};
use crate::valuation::Valuation;

const SECS_PER_MONTH: f64 = 30.0 * 86_400.0;
/// Age contribution saturates at 50 months.
const MAX_AGE_SCORE: f64 = 50.0;

/// Multipliers are applied at parts-per-million precision.
const PPM: u128 = 1_000_000;

/// `floor(amount * factor)` in fixed point, with `factor` rounded to the
/// nearest millionth. Integer arithmetic, so exact for every `u64` amount;
/// saturates at `u64::MAX`.
pub fn scale(amount: u64, factor: f64) -> u64 {
    let factor_ppm = (factor.max(0.0) * PPM as f64).round() as u128;
    let scaled = u128::from(amount).saturating_mul(factor_ppm) / PPM;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

fn profit(fmv: u64, current_bid: u64) -> i64 {
    i64::try_from(fmv.saturating_sub(current_bid)).unwrap_or(i64::MAX)
}

/// Listings with no usable price are dropped. A listing without an expiry
/// is reported as ended (`endTime` 0, inactive).
pub fn to_auction(listing: &Listing, now: u64, valuation: &dyn Valuation) -> Option<Auction> {
    let Some(current_bid) = listing.price.as_ref().and_then(|p| p.to_fixed_point()) else {
        debug!(listing_id = %listing.id, "Skipping listing without a usable price");
        return None;
    };
    let fmv = scale(current_bid, valuation.fmv_multiplier());

    Some(Auction {
        id: listing.id.clone(),
        domain: listing.name.clone(),
        current_bid,
        fmv,
        end_time: listing.expires_at.unwrap_or(0),
        seller: listing.seller.clone(),
        active: listing.expires_at.is_some_and(|end| end > now),
        potential_profit: profit(fmv, current_bid),
    })
}

pub fn to_historical(
    listing: &Listing,
    now: u64,
    valuation: &dyn Valuation,
) -> Option<HistoricalAuction> {
    let current_bid = listing.price.as_ref().and_then(|p| p.to_fixed_point())?;
    let winner = valuation.has_winner().then(|| valuation.short_address());

    Some(HistoricalAuction {
        id: listing.id.clone(),
        domain: listing.name.clone(),
        current_bid,
        final_bid: scale(current_bid, valuation.final_bid_multiplier()),
        end_time: listing.expires_at.or(listing.created_at).unwrap_or(now),
        seller: listing.seller.clone(),
        winner,
        active: false,
    })
}

/// `owner` is stored lower-cased.
pub fn to_user_domain(
    name: &OwnedName,
    owner: &str,
    now: u64,
    valuation: &dyn Valuation,
) -> UserDomain {
    let current_value = name
        .listed_price
        .as_ref()
        .and_then(|p| p.to_fixed_point())
        .unwrap_or_else(|| valuation.estimate_value(&name.name));
    let purchase_price = name
        .purchase_price
        .as_ref()
        .and_then(|p| p.to_fixed_point())
        .unwrap_or_else(|| scale(current_value, valuation.purchase_discount()));
    let token_id = name.token_id.clone().unwrap_or_default();
    let id = if token_id.is_empty() {
        name.name.clone()
    } else {
        token_id.clone()
    };

    UserDomain {
        id,
        token_id,
        name: name.name.clone(),
        owner: owner.to_lowercase(),
        purchase_price,
        current_value,
        created_at: name.created_at,
        collateral_score: collateral_score(&name.name, name.created_at, now),
    }
}

/// `round(0.6 * lengthScore + 0.4 * ageScore)` clamped to `[0, 100]`.
///
/// lengthScore is `100 - 5 * chars`, floored at 0. ageScore is the age in
/// 30-day months, capped at 50; a missing or future `created_at` scores 0.
pub fn collateral_score(name: &str, created_at: Option<u64>, now: u64) -> u8 {
    let len = name.chars().count() as f64;
    let length_score = (100.0 - len * 5.0).max(0.0);
    let age_score = created_at
        .map(|created| {
            let age_secs = now as f64 - created as f64;
            (age_secs / SECS_PER_MONTH).clamp(0.0, MAX_AGE_SCORE)
        })
        .unwrap_or(0.0);

    (length_score * 0.6 + age_score * 0.4).round().clamp(0.0, 100.0) as u8
}
