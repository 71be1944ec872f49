use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::types::{
    Action, ActionRequest, Auction, AuctionsData, DomainsData, HistoricalAuction, UserDomain,
};

/// Calls the normalizer over HTTP and unwraps its `{data}` / `{error}` envelope.
#[derive(Debug, Clone)]
pub struct NormalizerClient {
    client: reqwest::Client,
    url: String,
}

impl NormalizerClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Raw response body, with `{error}` and non-2xx statuses turned into errors.
    async fn post(&self, req: &ActionRequest) -> Result<Value> {
        let resp = self.client.post(&self.url).json(req).send().await?;
        let status = resp.status();
        let body: Value = resp.json().await?;

        if let Some(msg) = body.get("error").and_then(Value::as_str) {
            return Err(AppError::Remote(msg.to_string()));
        }
        if !status.is_success() {
            return Err(AppError::Remote(format!("normalizer returned {status}")));
        }
        Ok(body)
    }

    /// Decodes the `data` member of a successful response.
    pub async fn invoke<T: DeserializeOwned>(&self, req: &ActionRequest) -> Result<T> {
        let body = self.post(req).await?;
        match body.get("data") {
            Some(data) => Ok(T::deserialize(data)?),
            None => Err(AppError::Remote("response had no data".to_string())),
        }
    }

    pub async fn auctions(&self) -> Result<Vec<Auction>> {
        let data: AuctionsData<Auction> = self.invoke(&ActionRequest::new(Action::GetAuctions)).await?;
        Ok(data.auctions)
    }

    pub async fn user_domains(&self, address: &str) -> Result<Vec<UserDomain>> {
        let req = ActionRequest {
            address: Some(address.to_string()),
            ..ActionRequest::new(Action::GetUserDomains)
        };
        let data: DomainsData = self.invoke(&req).await?;
        Ok(data.domains)
    }

    pub async fn historical_auctions(&self, days: u64) -> Result<Vec<HistoricalAuction>> {
        let req = ActionRequest {
            days: Some(days),
            ..ActionRequest::new(Action::GetHistoricalAuctions)
        };
        let data: AuctionsData<HistoricalAuction> = self.invoke(&req).await?;
        Ok(data.auctions)
    }

    /// The upstream body is returned as-is; it has no `data` envelope.
    pub async fn domain_value(&self, domain: &str) -> Result<Value> {
        let req = ActionRequest {
            domain: Some(domain.to_string()),
            ..ActionRequest::new(Action::GetDomainValue)
        };
        self.post(&req).await
    }
}
