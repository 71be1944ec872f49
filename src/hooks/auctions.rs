use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::hooks::client::NormalizerClient;
use crate::hooks::display::{now_ms, DisplayAuction};
use crate::hooks::FeedState;

/// Live auction list, re-polled on a fixed period by a background task.
///
/// The first fetch starts immediately. Polls run one at a time; a tick that
/// fires while a request is still in flight is skipped. Dropping the feed
/// aborts the task together with any request it is awaiting.
pub struct AuctionFeed {
    state: watch::Receiver<FeedState<DisplayAuction>>,
    task: JoinHandle<()>,
}

impl AuctionFeed {
    pub fn spawn(client: NormalizerClient, period: Duration) -> Self {
        let (tx, rx) = watch::channel(FeedState::loading());
        let task = tokio::spawn(poll(client, period, tx));
        Self { state: rx, task }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FeedState<DisplayAuction> {
        self.state.borrow().clone()
    }

    /// Another handle on the same state, for consumers that outlive a borrow.
    pub fn subscribe(&self) -> watch::Receiver<FeedState<DisplayAuction>> {
        self.state.clone()
    }

    /// Waits until the next completed fetch (success or failure).
    pub async fn settled(&mut self) -> FeedState<DisplayAuction> {
        if let Ok(state) = self.state.wait_for(|s| !s.loading).await {
            return state.clone();
        }
        self.state.borrow().clone()
    }
}

impl Drop for AuctionFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll(
    client: NormalizerClient,
    period: Duration,
    tx: watch::Sender<FeedState<DisplayAuction>>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if tx.is_closed() {
            break;
        }
        tx.send_modify(|s| s.loading = true);

        let result = client.auctions().await.map(|auctions| {
            let now = now_ms();
            auctions
                .iter()
                .map(|a| DisplayAuction::from_auction(a, now))
                .collect::<Vec<_>>()
        });
        match &result {
            Ok(list) => debug!(count = list.len(), "Auction feed refreshed"),
            Err(e) => warn!("Error fetching auctions: {e}"),
        }
        tx.send_modify(|s| s.settle(result));
    }
}
