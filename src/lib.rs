//! Client for the WeChat mini-program backend API.
//!
//! [`ApiClient`] exposes the three backend operations used by a mini-program server:
//! fetching the service access token, exchanging a `wx.login` code for a session and
//! resolving a user's phone number. The access token is held by a [`TokenCache`] that
//! fetches it on first use and refreshes it in the background ahead of expiry.

pub mod client;
pub mod config;
pub mod errors;
pub mod telemetry;
pub mod token;
mod request_context;
mod types;

pub use client::ApiClient;
pub use config::{Config, ConfigLocation};
pub use errors::{Error, OperationKind};
pub use token::{RefreshPolicy, Token, TokenCache, TokenSupplier};
pub use types::{ApiStatus, PhoneInfo, PhoneResult, SessionResult, Watermark};
