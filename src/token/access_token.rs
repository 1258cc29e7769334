use std::fmt;
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};

use crate::errors::Error;

/// Short-lived backend credential plus the instant it stops being accepted.
///
/// Tokens are never mutated; a refresh produces a new value that replaces the old one.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    credential: String,
    expires_at: Timestamp,
}

impl Token {
    /// Builds a token, rejecting a blank credential or a missing expiry.
    pub fn new(
        credential: impl Into<String>,
        expires_at: impl Into<Option<Timestamp>>,
    ) -> Result<Self, Error> {
        let credential = credential.into();
        if credential.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "access token must not be blank".into(),
            ));
        }
        let expires_at = expires_at
            .into()
            .ok_or_else(|| Error::InvalidArgument("access token expiry is required".into()))?;
        Ok(Self {
            credential,
            expires_at,
        })
    }

    /// Builds a token that expires `ttl` from now, as reported by `expires_in`.
    pub fn expiring_in(credential: impl Into<String>, ttl: Duration) -> Result<Self, Error> {
        let ttl = SignedDuration::try_from(ttl)
            .map_err(|e| Error::InvalidArgument(format!("token lifetime out of range: {e}")))?;
        let expires_at = Timestamp::now()
            .checked_add(ttl)
            .map_err(|e| Error::InvalidArgument(format!("token expiry out of range: {e}")))?;
        Self::new(credential, expires_at)
    }

    /// The raw credential suitable for the `access_token` query parameter.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    /// Time left until expiry; negative once the token has expired.
    pub fn remaining(&self, now: Timestamp) -> SignedDuration {
        self.expires_at.duration_since(now)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("credential", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
