use doma_autobidder::hooks::{
    BacktestSummary, DisplayAuction, DisplayDomain, FeedState, HistoricalData, UserDomainsFeed,
};

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

impl ConnectionStatus {
    pub fn of<T>(state: &FeedState<T>) -> Self {
        match &state.error {
            Some(e) => ConnectionStatus::Error(e.clone()),
            None if state.loading && state.data.is_empty() => ConnectionStatus::Connecting,
            None => ConnectionStatus::Connected,
        }
    }
}

pub struct AppState {
    pub auctions: FeedState<DisplayAuction>,
    pub portfolio: UserDomainsFeed,
    pub history: HistoricalData,
    pub backtest: Option<BacktestSummary>,
    pub wallet: Option<String>,
}

impl AppState {
    pub fn new(portfolio: UserDomainsFeed, history: HistoricalData, wallet: Option<String>) -> Self {
        Self {
            auctions: FeedState::loading(),
            portfolio,
            history,
            backtest: None,
            wallet,
        }
    }

    pub fn domains(&self) -> &[DisplayDomain] {
        &self.portfolio.state().data
    }

    pub async fn load_portfolio(&mut self) {
        self.portfolio.load(self.wallet.as_deref()).await;
    }

    pub async fn refresh_portfolio(&mut self) {
        self.portfolio.refresh().await;
    }

    pub async fn run_backtest(&mut self) {
        self.history.fetch_historical_data().await;
        if self.history.state().error.is_none() {
            self.backtest = Some(self.history.summary());
        }
    }

    pub fn portfolio_value(&self) -> f64 {
        self.domains().iter().map(|d| d.current_value).sum()
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_usdc(v: f64) -> String {
    format!("${v:.2}")
}

pub fn format_percent(v: f64) -> String {
    format!("{v:+.1}%")
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
