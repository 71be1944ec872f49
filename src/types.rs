use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of every normalizer call. Parameters are per action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Missing is treated like any other unknown action.
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl ActionRequest {
    pub fn new(action: Action) -> Self {
        Self {
            action: action.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GetAuctions,
    GetUserDomains,
    GetHistoricalAuctions,
    GetDomainValue,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "getAuctions" => Some(Action::GetAuctions),
            "getUserDomains" => Some(Action::GetUserDomains),
            "getHistoricalAuctions" => Some(Action::GetHistoricalAuctions),
            "getDomainValue" => Some(Action::GetDomainValue),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::GetAuctions => "getAuctions",
            Action::GetUserDomains => "getUserDomains",
            Action::GetHistoricalAuctions => "getHistoricalAuctions",
            Action::GetDomainValue => "getDomainValue",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Response records
//
// Fixed-point amounts and timestamps travel as decimal strings, the way the
// browser client has always parsed them.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: String,
    pub domain: String,
    #[serde(with = "string_int")]
    pub current_bid: u64,
    #[serde(with = "string_int")]
    pub fmv: u64,
    #[serde(with = "string_int")]
    pub end_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
    pub active: bool,
    pub potential_profit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalAuction {
    pub id: String,
    pub domain: String,
    #[serde(with = "string_int")]
    pub current_bid: u64,
    #[serde(with = "string_int")]
    pub final_bid: u64,
    #[serde(with = "string_int")]
    pub end_time: u64,
    #[serde(default)]
    pub seller: Option<String>,
    /// `None` when the auction closed without a buyer.
    pub winner: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDomain {
    pub id: String,
    pub token_id: String,
    pub name: String,
    pub owner: String,
    #[serde(with = "string_int")]
    pub purchase_price: u64,
    #[serde(with = "string_int")]
    pub current_value: u64,
    #[serde(default, with = "string_int::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    pub collateral_score: u8,
}

/// Payload of `{data: {auctions: [...]}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuctionsData<T> {
    #[serde(default = "Vec::new")]
    pub auctions: Vec<T>,
}

/// Payload of `{data: {domains: [...]}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainsData {
    #[serde(default)]
    pub domains: Vec<UserDomain>,
}

/// Where the records in a response came from. Sent as `x-data-source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Upstream,
    Synthetic,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Upstream => "upstream",
            DataSource::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serde adapter: integers written as JSON strings, read from either form.
pub mod string_int {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    fn from_raw<E: serde::de::Error>(raw: Raw) -> Result<u64, E> {
        match raw {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => s.trim().parse::<u64>().map_err(E::custom),
        }
    }

    pub fn serialize<S: Serializer>(v: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        from_raw(Raw::deserialize(d)?)
    }

    pub mod option {
        use super::{from_raw, Raw};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(v: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
            match v {
                Some(n) => s.collect_str(n),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
            Option::<Raw>::deserialize(d)?.map(from_raw).transpose()
        }
    }
}
