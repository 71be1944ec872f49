use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::upstream::v1::{self, GraphqlResponse, ListingsData, NamesData};
use crate::upstream::{DomaUpstream, Listing, ListingQuery, OwnedName};

/// Doma API client speaking the `v1` contract.
#[derive(Debug, Clone)]
pub struct DomaGraphql {
    client: reqwest::Client,
    graphql_url: String,
    api_url: Url,
    api_key: Option<String>,
    names_page_size: u32,
}

impl DomaGraphql {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.upstream_timeout_secs))
            .build()?;
        let api_url = Url::parse(&cfg.doma_api_url)
            .map_err(|e| AppError::Config(format!("DOMA_API_URL is not a valid URL: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(AppError::Config("DOMA_API_URL must be an http(s) base URL".to_string()));
        }

        Ok(Self {
            client,
            graphql_url: cfg.doma_graphql_url.clone(),
            api_url,
            api_key: cfg.doma_api_key.clone(),
            names_page_size: cfg.listings_page_size,
        })
    }

    fn with_key(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Api-Key", key),
            None => req,
        }
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T> {
        let body = json!({ "query": query, "variables": variables });
        let req = self.with_key(self.client.post(&self.graphql_url).json(&body));
        let resp: GraphqlResponse<T> = req.send().await?.json().await?;
        resp.into_result()
    }
}

impl DomaUpstream for DomaGraphql {
    async fn listings(&self, query: ListingQuery) -> Result<Vec<Listing>> {
        let created_since = query.created_since.map(unix_to_iso);
        let data: ListingsData = self
            .query(
                v1::LISTINGS_QUERY,
                json!({ "take": query.take, "createdSince": created_since }),
            )
            .await?;
        let listings = data.into_listings();
        debug!(
            schema = v1::SCHEMA_VERSION,
            count = listings.len(),
            "Fetched {} listings",
            listings.len()
        );
        Ok(listings)
    }

    async fn owned_names(&self, owner: &str) -> Result<Vec<OwnedName>> {
        let data: NamesData = self
            .query(
                v1::OWNED_NAMES_QUERY,
                json!({ "ownedBy": [owner], "take": self.names_page_size }),
            )
            .await?;
        let names = data.into_owned_names();
        debug!(
            schema = v1::SCHEMA_VERSION,
            owner = %owner,
            count = names.len(),
            "Fetched {} owned names",
            names.len()
        );
        Ok(names)
    }

    async fn domain_value(&self, domain: &str) -> Result<serde_json::Value> {
        let mut url = self.api_url.clone();
        // Checked in `new`, so the URL always has segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("domains").push(domain);
        }
        let req = self
            .with_key(self.client.get(url))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        let value: serde_json::Value = req.send().await?.json().await?;
        Ok(value)
    }
}

/// Unix seconds to `YYYY-MM-DDTHH:MM:SSZ`.
pub fn unix_to_iso(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, routing::{get, post}, Json, Router};

    use super::*;
    use crate::error::AppError;
    use crate::upstream::parse_iso_to_unix_secs;

    type Seen = Arc<Mutex<Vec<serde_json::Value>>>;

    /// Serves `reply` for every GraphQL POST and records request bodies.
    async fn stub_upstream(reply: serde_json::Value) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/graphql",
                post(|State((seen, reply)): State<(Seen, serde_json::Value)>, Json(body): Json<serde_json::Value>| async move {
                    seen.lock().unwrap().push(body);
                    Json(reply)
                }),
            )
            .route(
                "/domains/:name",
                get(|axum::extract::Path(name): axum::extract::Path<String>| async move {
                    Json(json!({ "name": name, "value": "1234" }))
                }),
            )
            .with_state((Arc::clone(&seen), reply));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), seen)
    }

    fn client_for(base: &str) -> DomaGraphql {
        DomaGraphql::new(&Config {
            doma_api_url: base.to_string(),
            doma_graphql_url: format!("{base}/graphql"),
            doma_api_key: Some("test-key".to_string()),
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn iso_round_trips_through_parser() {
        for secs in [0u64, 951_782_400, 1_704_067_200, 1_767_225_599] {
            assert_eq!(parse_iso_to_unix_secs(&unix_to_iso(secs)), Some(secs));
        }
        assert_eq!(unix_to_iso(1_704_067_200), "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn listings_send_variables_and_parse_items() {
        let (base, seen) = stub_upstream(json!({
            "data": {"listings": {"items": [
                {"id": "1", "name": "crypto.vic", "price": "5200000000", "currency": {"decimals": 6}}
            ]}}
        }))
        .await;
        let client = client_for(&base);

        let listings = client
            .listings(ListingQuery { take: 10, created_since: Some(1_704_067_200) })
            .await
            .unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "crypto.vic");

        let bodies = seen.lock().unwrap();
        assert_eq!(bodies[0]["variables"]["take"], 10);
        assert_eq!(bodies[0]["variables"]["createdSince"], "2024-01-01T00:00:00Z");
        assert!(bodies[0]["query"].as_str().unwrap().contains("listings("));
    }

    #[tokio::test]
    async fn owned_names_filter_by_caip10() {
        let (base, seen) = stub_upstream(json!({ "data": {"names": {"items": []}} })).await;
        let client = client_for(&base);

        let names = client.owned_names("eip155:97476:0xabc").await.unwrap();
        assert!(names.is_empty());
        let bodies = seen.lock().unwrap();
        assert_eq!(bodies[0]["variables"]["ownedBy"][0], "eip155:97476:0xabc");
    }

    #[tokio::test]
    async fn graphql_errors_surface() {
        let (base, _) = stub_upstream(json!({ "errors": [{"message": "boom"}] })).await;
        let err = client_for(&base)
            .listings(ListingQuery { take: 1, created_since: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref m) if m == "boom"), "{err:?}");
    }

    #[tokio::test]
    async fn domain_value_is_passed_through() {
        let (base, _) = stub_upstream(json!({})).await;
        let value = client_for(&base).domain_value("crypto.vic").await.unwrap();
        assert_eq!(value, json!({ "name": "crypto.vic", "value": "1234" }));
    }

    #[tokio::test]
    async fn domain_is_sent_as_one_path_segment() {
        let (base, _) = stub_upstream(json!({})).await;
        let value = client_for(&base).domain_value("a/b?c#d.vic").await.unwrap();
        assert_eq!(value["name"], "a/b?c#d.vic");
    }

    #[tokio::test]
    async fn api_url_with_trailing_slash() {
        let (base, _) = stub_upstream(json!({})).await;
        let value = client_for(&format!("{base}/")).domain_value("ai.vic").await.unwrap();
        assert_eq!(value["name"], "ai.vic");
    }

    #[test]
    fn invalid_api_url_is_config_error() {
        let err = DomaGraphql::new(&Config {
            doma_api_url: "not a url".to_string(),
            ..Config::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)), "{err:?}");
    }

    #[test]
    fn iso_output_is_utc_seconds() {
        assert_eq!(unix_to_iso(0), "1970-01-01T00:00:00Z");
        assert_eq!(unix_to_iso(1_704_060_010), "2023-12-31T22:00:10Z");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_http_error() {
        let client = client_for("http://127.0.0.1:9");
        let err = client
            .listings(ListingQuery { take: 1, created_since: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Http(_)), "{err:?}");
    }
}
