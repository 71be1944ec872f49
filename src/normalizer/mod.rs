pub mod fallback;
pub mod transform;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;
use tracing::{info, warn};

use crate::config::{Config, FallbackMode};
use crate::error::{AppError, Result};
use crate::types::{Action, ActionRequest, AuctionsData, DataSource, DomainsData};
use crate::upstream::{DomaUpstream, ListingQuery};
use crate::valuation::Valuation;

const DAY_SECS: u64 = 86_400;

/// A successful normalizer result: JSON body plus provenance of its records.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub body: serde_json::Value,
    pub source: DataSource,
}

impl Envelope {
    fn data(data: impl serde::Serialize, source: DataSource) -> Result<Self> {
        Ok(Self {
            body: json!({ "data": serde_json::to_value(data)? }),
            source,
        })
    }
}

/// Stateless across calls: every request does at most one upstream round trip.
pub struct Normalizer<U> {
    cfg: Config,
    upstream: U,
    valuation: Arc<dyn Valuation>,
}

impl<U: DomaUpstream> Normalizer<U> {
    pub fn new(cfg: Config, upstream: U, valuation: Arc<dyn Valuation>) -> Self {
        Self { cfg, upstream, valuation }
    }

    pub fn fallback_mode(&self) -> FallbackMode {
        self.cfg.fallback_mode
    }

    pub async fn handle(&self, req: ActionRequest) -> Result<Envelope> {
        let Some(action) = Action::parse(&req.action) else {
            warn!(action = %req.action, "Rejecting unknown action");
            return Err(AppError::InvalidAction);
        };
        info!(action = %action, "Doma API request: {action}");

        match action {
            Action::GetAuctions => self.get_auctions().await,
            Action::GetUserDomains => {
                let address = required(req.address.as_deref(), "address")?;
                self.get_user_domains(address).await
            }
            Action::GetHistoricalAuctions => {
                let days = req.days.ok_or(AppError::MissingParam("days"))?;
                self.get_historical_auctions(days).await
            }
            Action::GetDomainValue => {
                let domain = required(req.domain.as_deref(), "domain")?;
                self.get_domain_value(domain).await
            }
        }
    }

    async fn get_auctions(&self) -> Result<Envelope> {
        let now = now_secs();
        let listings = self
            .upstream
            .listings(ListingQuery {
                take: self.cfg.listings_page_size,
                created_since: None,
            })
            .await?;
        let auctions: Vec<_> = listings
            .iter()
            .filter_map(|l| transform::to_auction(l, now, self.valuation.as_ref()))
            .collect();

        let (auctions, source) =
            self.substitute(auctions, "auctions", || fallback::sample_auctions(now));
        Envelope::data(AuctionsData { auctions }, source)
    }

    async fn get_user_domains(&self, address: &str) -> Result<Envelope> {
        let now = now_secs();
        let names = self.upstream.owned_names(&self.cfg.caip10(address)).await?;
        let domains: Vec<_> = names
            .iter()
            .map(|n| transform::to_user_domain(n, address, now, self.valuation.as_ref()))
            .collect();

        let (domains, source) = self.substitute(domains, "user domains", || {
            fallback::sample_user_domains(address, now)
        });
        Envelope::data(DomainsData { domains }, source)
    }

    async fn get_historical_auctions(&self, days: u64) -> Result<Envelope> {
        let now = now_secs();
        let cutoff = now.saturating_sub(days.saturating_mul(DAY_SECS));
        let listings = self
            .upstream
            .listings(ListingQuery {
                take: self.cfg.listings_page_size,
                created_since: Some(cutoff),
            })
            .await?;
        let auctions: Vec<_> = listings
            .iter()
            .filter_map(|l| transform::to_historical(l, now, self.valuation.as_ref()))
            .collect();

        let (auctions, source) = self.substitute(auctions, "historical auctions", || {
            fallback::synthetic_history(days, now, self.valuation.as_ref())
        });
        Envelope::data(AuctionsData { auctions }, source)
    }

    async fn get_domain_value(&self, domain: &str) -> Result<Envelope> {
        let body = self.upstream.domain_value(domain).await?;
        info!(domain = %domain, "Domain value fetched");
        Ok(Envelope { body, source: DataSource::Upstream })
    }

    /// An empty upstream result is not an error: in `Sample` mode it is
    /// replaced by placeholder records.
    fn substitute<T>(
        &self,
        records: Vec<T>,
        what: &str,
        sample: impl FnOnce() -> Vec<T>,
    ) -> (Vec<T>, DataSource) {
        if !records.is_empty() {
            return (records, DataSource::Upstream);
        }
        match self.cfg.fallback_mode {
            FallbackMode::Sample => {
                let samples = sample();
                info!(
                    fallback = %self.cfg.fallback_mode,
                    count = samples.len(),
                    "Upstream returned no {what}; returning sample data"
                );
                (samples, DataSource::Synthetic)
            }
            FallbackMode::Empty => {
                info!(fallback = %self.cfg.fallback_mode, "Upstream returned no {what}");
                (records, DataSource::Upstream)
            }
        }
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingParam(name))
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::types::{Auction, HistoricalAuction, UserDomain};
    use crate::upstream::{Listing, OwnedName, Price};
    use crate::valuation::{FixedValuation, RandomValuation};

    /// In-memory upstream. `fail` makes every call return an upstream error.
    #[derive(Default)]
    pub(crate) struct StubUpstream {
        pub listings: Vec<Listing>,
        pub names: Vec<OwnedName>,
        pub fail: Option<String>,
        pub calls: AtomicUsize,
        pub queries: Mutex<Vec<ListingQuery>>,
        pub owners: Mutex<Vec<String>>,
    }

    impl StubUpstream {
        fn check(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fail {
                Some(msg) => Err(AppError::Upstream(msg.clone())),
                None => Ok(()),
            }
        }
    }

    impl DomaUpstream for StubUpstream {
        async fn listings(&self, query: ListingQuery) -> Result<Vec<Listing>> {
            self.check()?;
            self.queries.lock().unwrap().push(query);
            Ok(self.listings.clone())
        }

        async fn owned_names(&self, owner: &str) -> Result<Vec<OwnedName>> {
            self.check()?;
            self.owners.lock().unwrap().push(owner.to_string());
            Ok(self.names.clone())
        }

        async fn domain_value(&self, domain: &str) -> Result<serde_json::Value> {
            self.check()?;
            Ok(json!({ "name": domain, "estimatedValue": 1234 }))
        }
    }

    pub(crate) fn priced_listing(id: &str, name: &str, price: &str) -> Listing {
        Listing {
            id: id.to_string(),
            name: name.to_string(),
            price: Some(Price::new(price, Some(6))),
            seller: None,
            expires_at: Some(now_secs() + 3_600),
            created_at: Some(now_secs() - 60),
        }
    }

    fn normalizer(stub: StubUpstream, mode: FallbackMode) -> Normalizer<StubUpstream> {
        let cfg = Config {
            fallback_mode: mode,
            ..Config::default()
        };
        Normalizer::new(cfg, stub, Arc::new(RandomValuation))
    }

    fn req(action: &str) -> ActionRequest {
        ActionRequest {
            action: action.to_string(),
            ..ActionRequest::default()
        }
    }

    fn auctions(env: &Envelope) -> Vec<Auction> {
        serde_json::from_value(env.body["data"]["auctions"].clone()).unwrap()
    }

    #[tokio::test]
    async fn unknown_action_is_rejected_without_upstream_call() {
        let n = normalizer(StubUpstream::default(), FallbackMode::Sample);
        let err = n.handle(req("placeBid")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidAction));
        assert_eq!(n.upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn auctions_from_upstream_are_transformed() {
        let stub = StubUpstream {
            listings: vec![
                priced_listing("a", "crypto.vic", "5200000000"),
                priced_listing("b", "defi.vic", "3100000000"),
            ],
            ..StubUpstream::default()
        };
        let n = normalizer(stub, FallbackMode::Sample);
        let env = n.handle(req("getAuctions")).await.unwrap();
        assert_eq!(env.source, DataSource::Upstream);

        let list = auctions(&env);
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].current_bid, 3_100_000_000);
        for a in &list {
            assert!(a.fmv >= transform::scale(a.current_bid, 1.15));
            assert!(a.fmv <= transform::scale(a.current_bid, 1.25));
        }
        assert_eq!(n.upstream.queries.lock().unwrap()[0].created_since, None);
    }

    #[tokio::test]
    async fn empty_auctions_fall_back_to_samples() {
        let n = normalizer(StubUpstream::default(), FallbackMode::Sample);
        let env = n.handle(req("getAuctions")).await.unwrap();
        assert_eq!(env.source, DataSource::Synthetic);
        let list = auctions(&env);
        assert_eq!(list.len(), 5);
        assert_eq!(list[0].domain, "crypto.vic");
    }

    #[tokio::test]
    async fn empty_mode_surfaces_no_data() {
        let n = normalizer(StubUpstream::default(), FallbackMode::Empty);
        let env = n.handle(req("getAuctions")).await.unwrap();
        assert_eq!(env.source, DataSource::Upstream);
        assert_eq!(env.body, json!({ "data": { "auctions": [] } }));
    }

    #[tokio::test]
    async fn upstream_failure_is_not_masked_by_fallback() {
        let stub = StubUpstream {
            fail: Some("Cannot query field \"auctions\" on type \"Query\"".to_string()),
            ..StubUpstream::default()
        };
        let n = normalizer(stub, FallbackMode::Sample);
        let err = n.handle(req("getAuctions")).await.unwrap_err();
        assert!(err.to_string().contains("Cannot query field"));
    }

    #[tokio::test]
    async fn user_domains_require_address() {
        let n = normalizer(StubUpstream::default(), FallbackMode::Sample);
        for address in [None, Some(""), Some("   ")] {
            let mut r = req("getUserDomains");
            r.address = address.map(str::to_string);
            let err = n.handle(r).await.unwrap_err();
            assert!(matches!(err, AppError::MissingParam("address")));
        }
        assert_eq!(n.upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn user_domains_query_by_caip10_and_fall_back() {
        let n = normalizer(StubUpstream::default(), FallbackMode::Sample);
        let mut r = req("getUserDomains");
        r.address = Some("0xABC".to_string());
        let env = n.handle(r).await.unwrap();

        assert_eq!(n.upstream.owners.lock().unwrap()[0], "eip155:97476:0xABC");
        assert_eq!(env.source, DataSource::Synthetic);
        let domains: Vec<UserDomain> =
            serde_json::from_value(env.body["data"]["domains"].clone()).unwrap();
        assert_eq!(domains.len(), 3);
        assert!(domains.iter().all(|d| d.owner == "0xabc"));
    }

    #[tokio::test]
    async fn user_domains_from_upstream() {
        let stub = StubUpstream {
            names: vec![OwnedName {
                name: "ai.vic".to_string(),
                token_id: Some("77".to_string()),
                created_at: Some(now_secs() - 30 * DAY_SECS),
                listed_price: Some(Price::new("1000000000", Some(6))),
                purchase_price: None,
            }],
            ..StubUpstream::default()
        };
        let cfg = Config::default();
        let n = Normalizer::new(cfg, stub, Arc::new(FixedValuation(0.0)));
        let mut r = req("getUserDomains");
        r.address = Some("0xabc".to_string());
        let env = n.handle(r).await.unwrap();
        assert_eq!(env.source, DataSource::Upstream);

        let domains: Vec<UserDomain> =
            serde_json::from_value(env.body["data"]["domains"].clone()).unwrap();
        assert_eq!(domains[0].token_id, "77");
        assert_eq!(domains[0].current_value, 1_000_000_000);
        assert_eq!(domains[0].purchase_price, transform::scale(1_000_000_000, 0.7));
    }

    #[tokio::test]
    async fn historical_requires_days() {
        let n = normalizer(StubUpstream::default(), FallbackMode::Sample);
        let err = n.handle(req("getHistoricalAuctions")).await.unwrap_err();
        assert!(matches!(err, AppError::MissingParam("days")));
    }

    #[tokio::test]
    async fn historical_thirty_days_yields_fifty_synthetic_records() {
        let n = normalizer(StubUpstream::default(), FallbackMode::Sample);
        let mut r = req("getHistoricalAuctions");
        r.days = Some(30);
        let env = n.handle(r).await.unwrap();
        assert_eq!(env.source, DataSource::Synthetic);

        let list: Vec<HistoricalAuction> =
            serde_json::from_value(env.body["data"]["auctions"].clone()).unwrap();
        assert_eq!(list.len(), 50);
        for h in &list {
            let word = h.domain.strip_suffix(".vic").unwrap();
            assert!(fallback::SAMPLE_WORDS.contains(&word));
        }

        let since = n.upstream.queries.lock().unwrap()[0].created_since.unwrap();
        let expected = now_secs() - 30 * DAY_SECS;
        assert!(since.abs_diff(expected) <= 2, "cutoff {since} vs {expected}");
    }

    #[tokio::test]
    async fn historical_from_upstream_keeps_ids() {
        let stub = StubUpstream {
            listings: vec![priced_listing("h1", "swap.vic", "2000000")],
            ..StubUpstream::default()
        };
        let n = normalizer(stub, FallbackMode::Sample);
        let mut r = req("getHistoricalAuctions");
        r.days = Some(7);
        let env = n.handle(r).await.unwrap();
        let list: Vec<HistoricalAuction> =
            serde_json::from_value(env.body["data"]["auctions"].clone()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "h1");
        assert!(list[0].final_bid >= 2_000_000);
    }

    #[tokio::test]
    async fn domain_value_passes_through_without_envelope() {
        let n = normalizer(StubUpstream::default(), FallbackMode::Sample);
        let mut r = req("getDomainValue");
        r.domain = Some("crypto.vic".to_string());
        let env = n.handle(r).await.unwrap();
        assert_eq!(env.body, json!({ "name": "crypto.vic", "estimatedValue": 1234 }));
        assert!(env.body.get("data").is_none());
    }
}
