use std::sync::Arc;

use tracing::warn;

use crate::hooks::client::NormalizerClient;
use crate::hooks::display::DisplayDomain;
use crate::hooks::FeedState;
use crate::valuation::Valuation;

/// Domains owned by one wallet. Fetched once per address change.
pub struct UserDomainsFeed {
    client: NormalizerClient,
    valuation: Arc<dyn Valuation>,
    address: Option<String>,
    state: FeedState<DisplayDomain>,
}

impl UserDomainsFeed {
    pub fn new(client: NormalizerClient, valuation: Arc<dyn Valuation>) -> Self {
        Self {
            client,
            valuation,
            address: None,
            state: FeedState::loading(),
        }
    }

    pub fn state(&self) -> &FeedState<DisplayDomain> {
        &self.state
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Points the feed at `address`. A missing or blank address clears the
    /// feed without calling the normalizer; the same address as last time is
    /// a no-op.
    pub async fn load(&mut self, address: Option<&str>) -> &FeedState<DisplayDomain> {
        let address = address.map(str::trim).filter(|a| !a.is_empty());
        let Some(address) = address else {
            self.address = None;
            self.state = FeedState::idle();
            return &self.state;
        };
        if self.address.as_deref() == Some(address) && !self.state.loading {
            return &self.state;
        }
        self.address = Some(address.to_string());
        self.fetch().await
    }

    /// Re-fetches the current address, if any.
    pub async fn refresh(&mut self) -> &FeedState<DisplayDomain> {
        if self.address.is_none() {
            self.state = FeedState::idle();
            return &self.state;
        }
        self.fetch().await
    }

    async fn fetch(&mut self) -> &FeedState<DisplayDomain> {
        let Some(address) = self.address.clone() else {
            return &self.state;
        };
        self.state.loading = true;
        let appreciation = self.valuation.appreciation_factor();
        let result = self.client.user_domains(&address).await.map(|domains| {
            domains
                .iter()
                .map(|d| DisplayDomain::from_user_domain(d, appreciation))
                .collect()
        });
        if let Err(e) = &result {
            warn!(address = %address, "Error fetching user domains: {e}");
        }
        self.state.settle(result);
        &self.state
    }
}
