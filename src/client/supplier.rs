use std::time::Duration;

use tracing::debug;

use crate::errors::{Error, OperationKind};
use crate::request_context::RequestDispatchContext;
use crate::token::{Token, TokenSupplier};
use crate::types::AccessTokenResponse;

const ACCESS_TOKEN_PATH: &str = "/cgi-bin/token";

/// Fetches service access tokens with the client-credential grant.
pub struct AccessTokenSupplier {
    app_id: String,
    secret: String,
    context: RequestDispatchContext,
}

impl AccessTokenSupplier {
    pub(crate) fn new(app_id: String, secret: String, context: RequestDispatchContext) -> Self {
        Self {
            app_id,
            secret,
            context,
        }
    }

    async fn request_token(&self) -> Result<Token, Error> {
        let operation = OperationKind::GetAccessToken;
        let request = self
            .context
            .http_client()
            .get(self.context.endpoint(ACCESS_TOKEN_PATH))
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", self.app_id.as_str()),
                ("secret", self.secret.as_str()),
            ]);
        let resp: AccessTokenResponse = self.context.dispatch(operation, request).await?;
        debug!(
            app_id = %self.app_id,
            expires_in = resp.expires_in,
            "access token acquired"
        );
        Token::expiring_in(resp.access_token, Duration::from_secs(resp.expires_in))
    }
}

impl TokenSupplier for AccessTokenSupplier {
    fn fetch(&self) -> impl Future<Output = Result<Token, Error>> + Send {
        self.request_token()
    }
}
