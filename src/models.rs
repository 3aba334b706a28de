/// Data models for Bitkub API responses.
///
/// Monetary values are [`Decimal`] and decode leniently, since the exchange
/// sends them as numbers on some endpoints and as strings on others.
use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::decode::{coerce_decimal, coerce_i64, coerce_string, lenient, positional};
use crate::errors::BitkubError;

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Seconds since the Unix epoch, UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Sub-second precision is discarded.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant.timestamp())
    }

    pub const fn from_unix(secs: i64) -> Self {
        Self(secs)
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub const fn unix(&self) -> i64 {
        self.0
    }

    /// `None` when the value is outside chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }

    pub fn set(&mut self, instant: DateTime<Utc>) {
        self.0 = instant.timestamp();
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::new(instant)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(instant: SystemTime) -> Self {
        Self::new(DateTime::<Utc>::from(instant))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
            None => write!(f, "{}", self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        coerce_i64(value.as_ref(), "timestamp")
            .map(Timestamp)
            .map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Health of one API surface, as reported by `/api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointStatus {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl EndpointStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// A public trade, sent on the wire as `[timestamp, rate, amount, side]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeEntry {
    pub timestamp: Timestamp,
    pub rate: Decimal,
    pub amount: Decimal,
    /// `BUY` or `SELL`.
    pub side: String,
}

impl TradeEntry {
    pub const ARITY: usize = 4;

    pub fn from_value(value: &Value) -> Result<Self, BitkubError> {
        let items = positional(value, Self::ARITY, "trade")?;
        Ok(Self {
            timestamp: Timestamp(coerce_i64(Some(&items[0]), "trade.timestamp")?),
            rate: coerce_decimal(Some(&items[1]), "trade.rate")?,
            amount: coerce_decimal(Some(&items[2]), "trade.amount")?,
            side: coerce_string(Some(&items[3]), "trade.side")?,
        })
    }
}

impl<'de> Deserialize<'de> for TradeEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(D::Error::custom)
    }
}

impl Serialize for TradeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.timestamp, self.rate, self.amount, &self.side).serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Deposits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatDeposit {
    #[serde(rename = "txn_id")]
    pub transaction_id: String,
    pub currency: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub amount: Decimal,
    pub status: String,
    #[serde(default)]
    pub time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoDeposit {
    pub hash: String,
    pub currency: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub amount: Decimal,
    /// A plain string for most coins, an object for memo-tagged ones.
    #[serde(default)]
    pub address: Value,
    #[serde(default, deserialize_with = "lenient::int")]
    pub confirmations: i64,
    pub status: String,
    #[serde(default)]
    pub time: Timestamp,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub deposit: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub withdraw: Decimal,
}

/// Limits granted by the account's KYC level. Crypto values are in BTC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycLimits {
    #[serde(default)]
    pub crypto: Limit,
    #[serde(default)]
    pub fiat: Limit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoUsage {
    #[serde(flatten)]
    pub limit: Limit,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub deposit_percentage: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub withdraw_percentage: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub deposit_thb_equivalent: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub withdraw_thb_equivalent: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatUsage {
    #[serde(flatten)]
    pub limit: Limit,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub deposit_percentage: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub withdraw_percentage: Decimal,
}

/// Today's usage against the KYC limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub crypto: CryptoUsage,
    #[serde(default)]
    pub fiat: FiatUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLimits {
    #[serde(default)]
    pub limits: KycLimits,
    #[serde(default)]
    pub usage: Usage,
    /// THB rate used for the BTC equivalents.
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub rate: Decimal,
}
