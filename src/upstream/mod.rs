//! Narrow adapter over the Doma API.
//!
//! The normalizer only sees the neutral types below. Each revision of the
//! upstream GraphQL schema gets its own contract module (`v1`, ...) that
//! translates into them, so schema churn stays inside one file.

pub mod graphql;
pub mod v1;

use std::future::Future;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::config::{DEFAULT_CURRENCY_DECIMALS, FIXED_POINT_DECIMALS};
use crate::error::Result;

pub use graphql::DomaGraphql;

/// Raw upstream amount in the currency's smallest unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Price {
    pub amount: String,
    /// `None` when the upstream omitted the currency; treated as 6.
    pub decimals: Option<u32>,
}

impl Price {
    pub fn new(amount: impl Into<String>, decimals: Option<u32>) -> Self {
        Self { amount: amount.into(), decimals }
    }

    /// `floor(amount / 10^decimals * 1_000_000)`, computed in integers.
    /// `None` for anything but a plain unsigned integer amount, or when the
    /// result does not fit in `u64`.
    pub fn to_fixed_point(&self) -> Option<u64> {
        let amount = self.amount.trim();
        if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let amount = amount.parse::<u128>().ok()?;
        let decimals = self.decimals.unwrap_or(DEFAULT_CURRENCY_DECIMALS);
        let fixed = if decimals <= FIXED_POINT_DECIMALS {
            amount.checked_mul(10u128.checked_pow(FIXED_POINT_DECIMALS - decimals)?)?
        } else {
            match 10u128.checked_pow(decimals - FIXED_POINT_DECIMALS) {
                Some(divisor) => amount / divisor,
                // More decimals than u128 can express: any u128 amount floors to 0.
                None => 0,
            }
        };
        u64::try_from(fixed).ok()
    }
}

/// A name offered for sale.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub price: Option<Price>,
    pub seller: Option<String>,
    /// Unix seconds.
    pub expires_at: Option<u64>,
    /// Unix seconds.
    pub created_at: Option<u64>,
}

/// A name held by the queried account.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedName {
    pub name: String,
    pub token_id: Option<String>,
    /// Unix seconds.
    pub created_at: Option<u64>,
    /// Price of the name's active listing, if any.
    pub listed_price: Option<Price>,
    /// What the owner paid, when the upstream knows.
    pub purchase_price: Option<Price>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingQuery {
    pub take: u32,
    /// Only listings created at or after this unix second.
    pub created_since: Option<u64>,
}

pub trait DomaUpstream: Send + Sync + 'static {
    fn listings(&self, query: ListingQuery) -> impl Future<Output = Result<Vec<Listing>>> + Send;

    /// Names owned by a CAIP-10 account id.
    fn owned_names(&self, owner: &str) -> impl Future<Output = Result<Vec<OwnedName>>> + Send;

    /// Unmodified JSON from the REST `/domains/{domain}` endpoint.
    fn domain_value(&self, domain: &str)
        -> impl Future<Output = Result<serde_json::Value>> + Send;
}

/// RFC 3339 timestamp (offset applied) to unix seconds. Values without an
/// offset, including a bare `YYYY-MM-DD`, are read as UTC. Instants before
/// the epoch are `None`.
pub fn parse_iso_to_unix_secs(s: &str) -> Option<u64> {
    let s = s.trim();
    let secs = if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        dt.timestamp()
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        naive.and_utc().timestamp()
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
            .timestamp()
    };
    u64::try_from(secs).ok()
}

/// Upstream timestamps arrive as ISO strings or as numeric unix seconds.
pub fn timestamp_from_value(v: &serde_json::Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.parse::<u64>().ok()))
        .or_else(|| v.as_str().and_then(parse_iso_to_unix_secs))
}
