//! Contract for the Doma testnet GraphQL schema as of the `listings` /
//! `names(ownedBy:)` revision.

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::upstream::{timestamp_from_value, Listing, OwnedName, Price};

pub const SCHEMA_VERSION: &str = "v1";

pub const LISTINGS_QUERY: &str = r#"
query Listings($take: Int, $createdSince: DateTime) {
  listings(take: $take, createdSince: $createdSince) {
    items {
      id
      externalId
      name
      price
      offererAddress
      expiresAt
      createdAt
      currency { symbol decimals }
    }
  }
}"#;

pub const OWNED_NAMES_QUERY: &str = r#"
query OwnedNames($ownedBy: [AddressCAIP10!], $take: Int) {
  names(ownedBy: $ownedBy, take: $take) {
    items {
      name
      tokenizedAt
      tokens {
        tokenId
        createdAt
        listings { price currency { decimals } }
      }
    }
  }
}"#;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

impl<T> GraphqlResponse<T> {
    /// A non-empty `errors` array wins over any partial `data`.
    pub fn into_result(self) -> Result<T> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            let joined = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::Upstream(joined));
        }
        self.data
            .ok_or_else(|| AppError::Upstream("GraphQL response had no data".to_string()))
    }
}

// ---------------------------------------------------------------------------
// listings
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListingsData {
    pub listings: Option<Page<ListingItem>>,
}

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingItem {
    pub id: Option<serde_json::Value>,
    pub external_id: Option<String>,
    pub name: Option<String>,
    pub price: Option<serde_json::Value>,
    pub offerer_address: Option<String>,
    pub expires_at: Option<serde_json::Value>,
    pub created_at: Option<serde_json::Value>,
    pub currency: Option<Currency>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Currency {
    pub symbol: Option<String>,
    pub decimals: Option<u32>,
}

impl ListingsData {
    /// Items without a name are dropped; nothing downstream can display them.
    pub fn into_listings(self) -> Vec<Listing> {
        self.listings
            .map(|p| p.items)
            .unwrap_or_default()
            .into_iter()
            .filter_map(ListingItem::into_listing)
            .collect()
    }
}

impl ListingItem {
    fn into_listing(self) -> Option<Listing> {
        let name = self.name.filter(|n| !n.is_empty())?;
        let id = self
            .id
            .as_ref()
            .and_then(value_to_string)
            .or(self.external_id)
            .unwrap_or_else(|| name.clone());
        let price = self.price.as_ref().and_then(value_to_string).map(|amount| Price {
            amount,
            decimals: self.currency.as_ref().and_then(|c| c.decimals),
        });

        Some(Listing {
            id,
            name,
            price,
            seller: self.offerer_address,
            expires_at: self.expires_at.as_ref().and_then(timestamp_from_value),
            created_at: self.created_at.as_ref().and_then(timestamp_from_value),
        })
    }
}

// ---------------------------------------------------------------------------
// names(ownedBy:)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NamesData {
    pub names: Option<Page<NameItem>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameItem {
    pub name: Option<String>,
    pub tokenized_at: Option<serde_json::Value>,
    #[serde(default)]
    pub tokens: Vec<TokenItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenItem {
    pub token_id: Option<serde_json::Value>,
    pub created_at: Option<serde_json::Value>,
    #[serde(default)]
    pub listings: Vec<TokenListing>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenListing {
    pub price: Option<serde_json::Value>,
    pub currency: Option<Currency>,
}

impl NamesData {
    pub fn into_owned_names(self) -> Vec<OwnedName> {
        self.names
            .map(|p| p.items)
            .unwrap_or_default()
            .into_iter()
            .filter_map(NameItem::into_owned_name)
            .collect()
    }
}

impl NameItem {
    fn into_owned_name(self) -> Option<OwnedName> {
        let name = self.name.filter(|n| !n.is_empty())?;
        let token = self.tokens.into_iter().next();

        let token_id = token
            .as_ref()
            .and_then(|t| t.token_id.as_ref())
            .and_then(value_to_string);
        let created_at = token
            .as_ref()
            .and_then(|t| t.created_at.as_ref())
            .and_then(timestamp_from_value)
            .or_else(|| self.tokenized_at.as_ref().and_then(timestamp_from_value));
        let listed_price = token
            .and_then(|t| t.listings.into_iter().next())
            .and_then(|l| {
                let amount = l.price.as_ref().and_then(value_to_string)?;
                Some(Price {
                    amount,
                    decimals: l.currency.and_then(|c| c.decimals),
                })
            });

        Some(OwnedName {
            name,
            token_id,
            created_at,
            listed_price,
            // This schema revision carries no sale history.
            purchase_price: None,
        })
    }
}

/// Ids and amounts show up as strings or as bare numbers depending on the field.
fn value_to_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_map_to_neutral_type() {
        let raw = r#"{
            "data": {"listings": {"items": [
                {"id": 17, "name": "crypto.vic", "price": "5200000000",
                 "offererAddress": "0xabc", "expiresAt": "2024-01-01T00:00:00Z",
                 "createdAt": "2023-12-31T00:00:00Z",
                 "currency": {"symbol": "USDC", "decimals": 6}},
                {"externalId": "ext-2", "name": "defi.vic", "price": 1000000000000000000,
                 "currency": {"symbol": "ETH", "decimals": 18}},
                {"id": "3", "name": ""}
            ]}}
        }"#;
        let resp: GraphqlResponse<ListingsData> = serde_json::from_str(raw).unwrap();
        let listings = resp.into_result().unwrap().into_listings();
        assert_eq!(listings.len(), 2);

        assert_eq!(listings[0].id, "17");
        assert_eq!(listings[0].seller.as_deref(), Some("0xabc"));
        assert_eq!(listings[0].expires_at, Some(1_704_067_200));
        assert_eq!(listings[0].price, Some(Price::new("5200000000", Some(6))));

        assert_eq!(listings[1].id, "ext-2");
        assert_eq!(listings[1].price.as_ref().and_then(Price::to_fixed_point), Some(1_000_000));
    }

    #[test]
    fn graphql_errors_are_joined() {
        let raw = r#"{"data": null, "errors": [{"message": "Cannot query field \"auctions\""}, {"message": "bad take"}]}"#;
        let resp: GraphqlResponse<ListingsData> = serde_json::from_str(raw).unwrap();
        match resp.into_result() {
            Err(AppError::Upstream(msg)) => {
                assert_eq!(msg, "Cannot query field \"auctions\"; bad take");
            }
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }

    #[test]
    fn empty_errors_array_is_not_an_error() {
        let raw = r#"{"data": {"listings": null}, "errors": []}"#;
        let resp: GraphqlResponse<ListingsData> = serde_json::from_str(raw).unwrap();
        assert!(resp.into_result().unwrap().into_listings().is_empty());
    }

    #[test]
    fn owned_names_take_first_token() {
        let raw = r#"{"data": {"names": {"items": [
            {"name": "ai.vic", "tokenizedAt": "2024-01-01T00:00:00Z",
             "tokens": [{"tokenId": "1001", "createdAt": 1700000000,
                         "listings": [{"price": "4200000000", "currency": {"decimals": 6}}]}]},
            {"name": "meta.vic", "tokenizedAt": "2024-01-01T00:00:00Z", "tokens": []}
        ]}}}"#;
        let resp: GraphqlResponse<NamesData> = serde_json::from_str(raw).unwrap();
        let names = resp.into_result().unwrap().into_owned_names();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].token_id.as_deref(), Some("1001"));
        assert_eq!(names[0].created_at, Some(1_700_000_000));
        assert_eq!(names[0].listed_price, Some(Price::new("4200000000", Some(6))));
        assert_eq!(names[1].token_id, None);
        assert_eq!(names[1].created_at, Some(1_704_067_200));
        assert_eq!(names[1].listed_price, None);
    }
}
