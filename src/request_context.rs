use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::Config;
use crate::errors::{Error, OperationKind};
use crate::types::ApiStatus;

const USER_AGENT: &str = concat!("wechat-miniprogram-rust/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP plumbing for every backend call: one attempt, envelope check, typed decode.
#[derive(Clone)]
pub(crate) struct RequestDispatchContext {
    http_client: Client,
    base_url: String,
}

impl RequestDispatchContext {
    pub fn build(config: &Config) -> Result<Self, Error> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        // Validate the base URL before any network call is attempted
        Url::parse(&base_url).map_err(|e| {
            Error::Config(format!("Invalid API base URL '{}': {}", base_url, e))
        })?;
        let http_client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn dispatch<T: DeserializeOwned>(
        &self,
        operation: OperationKind,
        request: RequestBuilder,
    ) -> Result<T, Error> {
        debug!(operation = %operation, "sending request");
        let resp = request
            .send()
            .await
            .map_err(|source| Error::Transport { operation, source })?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|source| Error::Transport { operation, source })?;
        debug!(
            operation = %operation,
            status = %status,
            bytes = body.len(),
            "received response"
        );

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            error!(operation = %operation, status = %status, body = %body, "request failed");
            return Err(Error::Http {
                operation,
                status,
                body,
            });
        }

        let envelope: ApiStatus = serde_json::from_slice(&body)
            .map_err(|source| Error::Decode { operation, source })?;
        if !envelope.is_success() {
            error!(
                operation = %operation,
                errcode = envelope.code,
                errmsg = %envelope.message,
                "backend reported an error"
            );
        }
        envelope.check(operation)?;

        serde_json::from_slice(&body).map_err(|source| Error::Decode { operation, source })
    }
}
