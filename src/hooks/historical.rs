use tracing::{info, warn};

use crate::hooks::client::NormalizerClient;
use crate::hooks::display::from_fixed_point;
use crate::hooks::FeedState;
use crate::types::HistoricalAuction;

/// Closed auctions over a trailing window, fetched only on request.
pub struct HistoricalData {
    client: NormalizerClient,
    days: u64,
    state: FeedState<HistoricalAuction>,
}

impl HistoricalData {
    pub fn new(client: NormalizerClient, days: u64) -> Self {
        Self {
            client,
            days,
            state: FeedState::idle(),
        }
    }

    pub fn days(&self) -> u64 {
        self.days
    }

    pub fn state(&self) -> &FeedState<HistoricalAuction> {
        &self.state
    }

    pub async fn fetch_historical_data(&mut self) -> &FeedState<HistoricalAuction> {
        self.state.loading = true;
        let result = self.client.historical_auctions(self.days).await;
        match &result {
            Ok(records) => info!(days = self.days, count = records.len(), "Historical auctions loaded"),
            Err(e) => warn!(days = self.days, "Error fetching historical data: {e}"),
        }
        self.state.settle(result);
        &self.state
    }

    pub fn summary(&self) -> BacktestSummary {
        BacktestSummary::from_records(&self.state.data)
    }
}

/// Aggregate view of a backtest window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestSummary {
    pub auctions: usize,
    /// Auctions that closed with a winner.
    pub sold: usize,
    pub sell_through_pct: f64,
    /// Mean of `(finalBid - currentBid) / currentBid` over sold auctions, in percent.
    pub avg_uplift_pct: f64,
    /// Sum of final bids of sold auctions, display units.
    pub sold_volume: f64,
}

impl BacktestSummary {
    pub fn from_records(records: &[HistoricalAuction]) -> Self {
        let sold: Vec<&HistoricalAuction> = records.iter().filter(|r| r.winner.is_some()).collect();
        if records.is_empty() {
            return Self::default();
        }

        let uplifts: Vec<f64> = sold
            .iter()
            .filter(|r| r.current_bid > 0)
            .map(|r| (r.final_bid as f64 - r.current_bid as f64) / r.current_bid as f64 * 100.0)
            .collect();
        let avg_uplift_pct = if uplifts.is_empty() {
            0.0
        } else {
            uplifts.iter().sum::<f64>() / uplifts.len() as f64
        };

        Self {
            auctions: records.len(),
            sold: sold.len(),
            sell_through_pct: sold.len() as f64 / records.len() as f64 * 100.0,
            avg_uplift_pct,
            sold_volume: sold.iter().map(|r| from_fixed_point(r.final_bid)).sum(),
        }
    }
}
