//! Placeholder records served when the upstream returns nothing.

use crate::config::{FIXED_POINT_SCALE, MAX_SYNTHETIC_HISTORY};
use crate::normalizer::transform::{collateral_score, scale};
use crate::types::{Auction, HistoricalAuction, UserDomain};
use crate::valuation::Valuation;

const DAY_SECS: u64 = 86_400;

/// Second-level labels used for synthetic history (`<word>.vic`).
pub const SAMPLE_WORDS: [&str; 15] = [
    "crypto", "defi", "web3", "nft", "dao", "meta", "ai", "chain", "block", "token", "swap",
    "yield", "stake", "vault", "ledger",
];

pub const SAMPLE_TLD: &str = "vic";

fn usdc(whole: u64) -> u64 {
    whole * FIXED_POINT_SCALE as u64
}

/// (domain, current bid USDC, fmv USDC, seconds until end, seller)
const SAMPLE_AUCTIONS: [(&str, u64, u64, u64, &str); 5] = [
    ("crypto.vic", 5_200, 6_240, 9_240, "0x1234..."),
    ("defi.vic", 3_100, 3_720, 18_720, "0x5678..."),
    ("web3.vic", 4_500, 5_400, 4_080, "0x9abc..."),
    ("nft.vic", 2_800, 3_360, 12_600, "0xdef0..."),
    ("dao.vic", 3_900, 4_680, 27_000, "0x2468..."),
];

pub fn sample_auctions(now: u64) -> Vec<Auction> {
    SAMPLE_AUCTIONS
        .iter()
        .enumerate()
        .map(|(i, &(domain, bid, fmv, ends_in, seller))| Auction {
            id: (i + 1).to_string(),
            domain: domain.to_string(),
            current_bid: usdc(bid),
            fmv: usdc(fmv),
            end_time: now + ends_in,
            seller: Some(seller.to_string()),
            active: true,
            potential_profit: (usdc(fmv) - usdc(bid)) as i64,
        })
        .collect()
}

/// (name, token id, purchase USDC, current value USDC, age in days)
const SAMPLE_DOMAINS: [(&str, &str, u64, u64, u64); 3] = [
    ("ai.vic", "1001", 4_200, 5_670, 90),
    ("meta.vic", "1002", 3_800, 5_130, 60),
    ("blockchain.vic", "1003", 6_100, 8_235, 120),
];

/// Owned by `address`, lower-cased.
pub fn sample_user_domains(address: &str, now: u64) -> Vec<UserDomain> {
    let owner = address.to_lowercase();
    SAMPLE_DOMAINS
        .iter()
        .enumerate()
        .map(|(i, &(name, token_id, paid, value, age_days))| {
            let created_at = now.saturating_sub(age_days * DAY_SECS);
            UserDomain {
                id: (i + 1).to_string(),
                token_id: token_id.to_string(),
                name: name.to_string(),
                owner: owner.clone(),
                purchase_price: usdc(paid),
                current_value: usdc(value),
                created_at: Some(created_at),
                collateral_score: collateral_score(name, Some(created_at), now),
            }
        })
        .collect()
}

/// `min(days * 2, 50)` closed auctions spread evenly over the last `days`.
pub fn synthetic_history(days: u64, now: u64, valuation: &dyn Valuation) -> Vec<HistoricalAuction> {
    let count = days.saturating_mul(2).min(MAX_SYNTHETIC_HISTORY);
    if count == 0 {
        return Vec::new();
    }
    let window = days.saturating_mul(DAY_SECS);
    let start = now.saturating_sub(window);
    let spacing = window / count;

    (0..count)
        .map(|i| {
            let word = SAMPLE_WORDS[valuation.pick_index(SAMPLE_WORDS.len())];
            let current_bid = valuation.sample_usdc(1_000, 11_000);
            let winner = valuation.has_winner().then(|| valuation.short_address());
            HistoricalAuction {
                id: (i + 1).to_string(),
                domain: format!("{word}.{SAMPLE_TLD}"),
                current_bid,
                final_bid: scale(current_bid, valuation.final_bid_multiplier()),
                end_time: start + i * spacing,
                seller: Some(valuation.short_address()),
                winner,
                active: false,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::{FixedValuation, RandomValuation};

    const NOW: u64 = 1_750_000_000;

    #[test]
    fn five_sample_auctions_with_profit() {
        let auctions = sample_auctions(NOW);
        assert_eq!(auctions.len(), 5);
        assert_eq!(auctions[0].domain, "crypto.vic");
        assert_eq!(auctions[0].current_bid, 5_200_000_000);
        assert_eq!(auctions[0].end_time, NOW + 9_240);
        for a in &auctions {
            assert!(a.active);
            assert!(a.fmv >= a.current_bid);
            assert_eq!(a.potential_profit, (a.fmv - a.current_bid) as i64);
        }
    }

    #[test]
    fn sample_domains_belong_to_caller() {
        let domains = sample_user_domains("0xAbCd", NOW);
        assert_eq!(domains.len(), 3);
        assert!(domains.iter().all(|d| d.owner == "0xabcd"));
        assert_eq!(domains[2].name, "blockchain.vic");
        assert_eq!(domains[0].created_at, Some(NOW - 90 * DAY_SECS));
        assert!(domains.iter().all(|d| d.collateral_score <= 100));
    }

    #[test]
    fn history_count_is_capped() {
        let v = RandomValuation;
        assert_eq!(synthetic_history(30, NOW, &v).len(), 50);
        assert_eq!(synthetic_history(7, NOW, &v).len(), 14);
        assert_eq!(synthetic_history(25, NOW, &v).len(), 50);
        assert!(synthetic_history(0, NOW, &v).is_empty());
    }

    #[test]
    fn history_names_come_from_word_list() {
        for h in synthetic_history(30, NOW, &RandomValuation) {
            let (word, tld) = h.domain.split_once('.').unwrap();
            assert_eq!(tld, "vic");
            assert!(SAMPLE_WORDS.contains(&word), "unexpected word {word}");
            assert!(h.current_bid >= 1_000_000_000 && h.current_bid < 11_000_000_000);
            assert!(h.final_bid >= h.current_bid);
            assert!(!h.active);
            assert!(h.end_time >= NOW - 30 * DAY_SECS && h.end_time < NOW);
        }
    }

    #[test]
    fn history_outcomes_follow_draw() {
        assert!(synthetic_history(3, NOW, &FixedValuation(0.2))
            .iter()
            .all(|h| h.winner.is_some()));
        assert!(synthetic_history(3, NOW, &FixedValuation(0.8))
            .iter()
            .all(|h| h.winner.is_none()));
    }
}
