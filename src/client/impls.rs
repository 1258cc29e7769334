use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::{
    ApiClient,
    client::AccessTokenSupplier,
    config::Config,
    errors::{Error, OperationKind},
    request_context::RequestDispatchContext,
    token::{Token, TokenCache},
    types::{PhoneResult, SessionResult},
};

const CODE_TO_SESSION_PATH: &str = "/sns/jscode2session";
const PHONE_NUMBER_PATH: &str = "/wxa/business/getuserphonenumber";

impl ApiClient {
    /// Create a new ApiClient
    /// # Arguments
    /// * `config` - Explicit configuration (`Config`), typically loaded via `Config::from_file` or `Config::from_env`.
    ///
    /// No request is sent here; the first access token is fetched on first use.
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;
        let policy = config.refresh_policy()?;
        let context = RequestDispatchContext::build(&config)?;
        let supplier = AccessTokenSupplier::new(
            config.app_id.clone(),
            config.secret.clone(),
            context.clone(),
        );
        Ok(ApiClient {
            app_id: config.app_id,
            secret: config.secret,
            context,
            tokens: Arc::new(TokenCache::new(supplier, policy)),
        })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Returns the cached service access token, fetching it on first use.
    pub async fn fetch_service_token(&self) -> Result<Token, Error> {
        self.tokens.get_value().await
    }

    /// Exchanges a `wx.login` code for the user's session.
    pub async fn exchange_login_code(&self, code: &str) -> Result<SessionResult, Error> {
        let code = require_code(code)?;
        let request = self
            .context
            .http_client()
            .get(self.context.endpoint(CODE_TO_SESSION_PATH))
            .query(&[
                ("grant_type", "authorization_code"),
                ("appid", self.app_id.as_str()),
                ("secret", self.secret.as_str()),
                ("js_code", code),
            ]);
        let session: SessionResult = self
            .context
            .dispatch(OperationKind::CodeToSession, request)
            .await?;
        info!(open_id = %session.open_id, "login code exchanged");
        Ok(session)
    }

    /// Resolves the phone number bound to a `getPhoneNumber` code.
    pub async fn resolve_phone_number(&self, code: &str) -> Result<PhoneResult, Error> {
        let code = require_code(code)?;
        let token = self.tokens.get_value().await?;
        let request = self
            .context
            .http_client()
            .post(self.context.endpoint(PHONE_NUMBER_PATH))
            .query(&[("access_token", token.credential())])
            .json(&json!({ "code": code }));
        let phone: PhoneResult = self
            .context
            .dispatch(OperationKind::GetPhoneNumber, request)
            .await?;
        info!("phone number resolved");
        Ok(phone)
    }

    /// Stops the background token refresh. Once the cached token expires the next call
    /// fetches a new one and restarts the refresh.
    pub fn close(&self) {
        self.tokens.shutdown();
    }
}

fn require_code(code: &str) -> Result<&str, Error> {
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::InvalidArgument("code must not be blank".into()));
    }
    Ok(code)
}
