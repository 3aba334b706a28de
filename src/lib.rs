//! Bitkub exchange SDK for Rust.
//!
//! A REST client core for the Bitkub exchange: HMAC-signed requests, a
//! tolerant response decoder, the shared response envelope, page-number
//! pagination and the exchange's error catalog.
//!
//! # What This SDK Provides
//!
//! - High-level client with per-resource services: [`BitkubClient`]
//! - Low-level envelope transport: [`BitkubApi`]
//! - Byte-exact request signing: [`signing::EnvelopeBuilder`]
//! - Pagination cursors that survive across calls: [`PageInfo`], [`Pages`]
//! - Typed errors carrying the exchange's error codes: [`BitkubError`], [`ApiError`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bitkub_sdk::{BitkubClient, CallOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bitkub_sdk::BitkubError> {
//!     let client = BitkubClient::new()?;
//!     let opts = CallOptions::new();
//!
//!     for endpoint in client.server().status(&opts).await? {
//!         println!("{}: {}", endpoint.name, endpoint.status);
//!     }
//!
//!     let trades = client.market().trades("THB_BTC", 10, &opts).await?;
//!     println!("{} recent trades", trades.len());
//!     Ok(())
//! }
//! ```
//!
//! # Signed Calls and Pagination
//!
//! ```rust,no_run
//! use bitkub_sdk::{BitkubClient, CallOptions, Credentials, PageInfo};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bitkub_sdk::BitkubError> {
//!     let client = BitkubClient::with_credentials(Credentials::from_env()?)?;
//!     let opts = CallOptions::new();
//!
//!     let balances = client.market().wallet(&opts).await?;
//!     println!("THB: {:?}", balances.get("THB"));
//!
//!     let mut page = PageInfo::new().with_limit(50);
//!     while !page.is_done() {
//!         let deposits = client.fiat().deposit_history(&mut page, &opts).await?;
//!         println!("{} deposits", deposits.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Per-call Options
//!
//! [`CallOptions`] carries an optional credentials override, a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) and a deadline.
//! The override applies to that one call only.
//!
//! # Logging
//!
//! This crate emits debug-level logs through the [`log`](https://docs.rs/log/) facade
//! for API calls and pagination. Configure any compatible logger in your binary, then
//! set `RUST_LOG=debug` to inspect request flow. Secrets are never logged.
//!
//! # Errors
//!
//! All fallible operations return [`BitkubError`]:
//!
//! - Non-zero envelope codes (`Api`, see [`BitkubError::error_code`])
//! - Missing credentials (`Unauthenticated`), raised before any request is sent
//! - Decoding failures naming the field or endpoint (`Decode`)
//! - Transport failures (`Http`, `HttpStatus`, `Cancelled`, `Timeout`)
pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod decode;
pub mod error_codes;
pub mod errors;
pub mod models;
pub mod pagination;
pub mod signing;

// Re-export primary types for convenience.
pub use api::{BitkubApi, CallOptions, QueryParams, Response, NO_PAYLOAD};
pub use client::BitkubClient;
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use errors::{ApiError, BitkubError};
pub use models::*;
pub use pagination::{PageInfo, Pages};
