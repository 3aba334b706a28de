/// High-level BitkubClient exposing the exchange's resources as services.
///
/// Each service is a thin borrow of the shared [`BitkubApi`]; it only knows
/// its endpoint paths and response types, and routes every call through the
/// envelope transport or the pagination driver.
use std::collections::BTreeMap;

use log::debug;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::api::{BitkubApi, CallOptions, QueryParams, NO_PAYLOAD};
use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::decode::coerce_decimal;
use crate::errors::BitkubError;
use crate::models::{CryptoDeposit, EndpointStatus, FiatDeposit, TradeEntry, UserLimits};
use crate::pagination::PageInfo;

const STATUS: &str = "/api/status";
const MARKET_TRADES: &str = "/api/market/trades";
const MARKET_WALLET: &str = "/api/market/wallet";
const FIAT_DEPOSIT_HISTORY: &str = "/api/fiat/deposit-history";
const CRYPTO_DEPOSIT_HISTORY: &str = "/api/crypto/deposit-history";
const USER_LIMITS: &str = "/api/user/limits";
const USER_TRADING_CREDITS: &str = "/api/user/trading-credits";

/// The high-level Bitkub client.
#[derive(Debug, Clone)]
pub struct BitkubClient {
    pub api: BitkubApi,
}

impl BitkubClient {
    /// A client for the production API without credentials.
    pub fn new() -> Result<Self, BitkubError> {
        Self::with_config(ClientConfig::default())
    }

    /// A client for the production API signing with `credentials`.
    pub fn with_credentials(credentials: Credentials) -> Result<Self, BitkubError> {
        Self::with_config(ClientConfig::default().with_credentials(credentials))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, BitkubError> {
        Ok(Self {
            api: BitkubApi::new(config)?,
        })
    }

    pub fn server(&self) -> ServerService<'_> {
        ServerService { api: &self.api }
    }

    pub fn market(&self) -> MarketService<'_> {
        MarketService { api: &self.api }
    }

    pub fn fiat(&self) -> FiatService<'_> {
        FiatService { api: &self.api }
    }

    pub fn crypto(&self) -> CryptoService<'_> {
        CryptoService { api: &self.api }
    }

    pub fn user(&self) -> UserService<'_> {
        UserService { api: &self.api }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

pub struct ServerService<'a> {
    api: &'a BitkubApi,
}

impl ServerService<'_> {
    /// Per-surface API health. This endpoint is not enveloped.
    pub async fn status(&self, opts: &CallOptions) -> Result<Vec<EndpointStatus>, BitkubError> {
        self.api.fetch_raw(STATUS, None, opts).await
    }
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

pub struct MarketService<'a> {
    api: &'a BitkubApi,
}

impl MarketService<'_> {
    /// Recent public trades for `symbol`, e.g. `THB_BTC`.
    pub async fn trades(
        &self,
        symbol: &str,
        limit: u32,
        opts: &CallOptions,
    ) -> Result<Vec<TradeEntry>, BitkubError> {
        let query = QueryParams::new().with("sym", symbol).with("lmt", limit);
        self.api.fetch(MARKET_TRADES, Some(&query), opts).await
    }

    /// Available balance per currency.
    pub async fn wallet(&self, opts: &CallOptions) -> Result<BTreeMap<String, Decimal>, BitkubError> {
        let raw: Map<String, Value> = self.api.fetch_secure(MARKET_WALLET, NO_PAYLOAD, opts).await?;
        debug!("market.wallet currencies={}", raw.len());
        raw.iter()
            .map(|(currency, value)| {
                coerce_decimal(Some(value), currency).map(|amount| (currency.clone(), amount))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Fiat
// ---------------------------------------------------------------------------

pub struct FiatService<'a> {
    api: &'a BitkubApi,
}

impl FiatService<'_> {
    /// One page of fiat deposits; `page` advances on success.
    pub async fn deposit_history(
        &self,
        page: &mut PageInfo,
        opts: &CallOptions,
    ) -> Result<Vec<FiatDeposit>, BitkubError> {
        self.api
            .fetch_secure_list(FIAT_DEPOSIT_HISTORY, page, NO_PAYLOAD, opts)
            .await
    }
}

// ---------------------------------------------------------------------------
// Crypto
// ---------------------------------------------------------------------------

pub struct CryptoService<'a> {
    api: &'a BitkubApi,
}

impl CryptoService<'_> {
    /// One page of crypto deposits; `page` advances on success.
    pub async fn deposit_history(
        &self,
        page: &mut PageInfo,
        opts: &CallOptions,
    ) -> Result<Vec<CryptoDeposit>, BitkubError> {
        self.api
            .fetch_secure_list(CRYPTO_DEPOSIT_HISTORY, page, NO_PAYLOAD, opts)
            .await
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

pub struct UserService<'a> {
    api: &'a BitkubApi,
}

impl UserService<'_> {
    pub async fn limits(&self, opts: &CallOptions) -> Result<UserLimits, BitkubError> {
        self.api.fetch_secure(USER_LIMITS, NO_PAYLOAD, opts).await
    }

    pub async fn trading_credits(&self, opts: &CallOptions) -> Result<Decimal, BitkubError> {
        let raw: Value = self
            .api
            .fetch_secure(USER_TRADING_CREDITS, NO_PAYLOAD, opts)
            .await?;
        coerce_decimal(Some(&raw), "trading_credits")
    }
}
