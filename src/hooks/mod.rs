//! Client side of the normalizer: a thin HTTP client plus the three data
//! feeds the dashboard renders. Every feed exposes the same
//! [`FeedState`] shape.

pub mod auctions;
pub mod client;
pub mod display;
pub mod historical;
pub mod portfolio;

pub use auctions::AuctionFeed;
pub use client::NormalizerClient;
pub use display::{time_left, DisplayAuction, DisplayDomain};
pub use historical::{BacktestSummary, HistoricalData};
pub use portfolio::UserDomainsFeed;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedState<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> FeedState<T> {
    /// State before the first fetch has completed.
    pub fn loading() -> Self {
        Self {
            data: Vec::new(),
            loading: true,
            error: None,
        }
    }

    pub fn idle() -> Self {
        Self {
            data: Vec::new(),
            loading: false,
            error: None,
        }
    }

    /// Applies a fetch outcome. A failed fetch keeps the previous data.
    pub(crate) fn settle(&mut self, result: crate::error::Result<Vec<T>>) {
        match result {
            Ok(data) => {
                self.data = data;
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        self.loading = false;
    }
}
