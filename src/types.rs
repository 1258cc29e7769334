use jiff::Timestamp;
use serde::{Deserialize, Deserializer};

use crate::errors::{Error, OperationKind};

/// The `{errcode, errmsg}` pair every backend response carries.
///
/// Successful responses frequently omit both fields, so they default to success.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiStatus {
    #[serde(rename = "errcode")]
    pub code: i64,
    #[serde(rename = "errmsg")]
    pub message: String,
}

impl ApiStatus {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    pub fn check(self, operation: OperationKind) -> Result<(), Error> {
        if self.is_success() {
            Ok(())
        } else {
            Err(Error::Api {
                operation,
                code: self.code,
                message: self.message,
            })
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Result of exchanging a `wx.login` code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionResult {
    #[serde(rename = "openid")]
    pub open_id: String,
    pub session_key: String,
    /// Only present when the app is bound to an open-platform account.
    #[serde(rename = "unionid", default)]
    pub union_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhoneResult {
    pub phone_info: PhoneInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneInfo {
    /// Number including the country prefix when outside mainland China.
    pub phone_number: String,
    pub pure_phone_number: String,
    #[serde(deserialize_with = "string_or_number")]
    pub country_code: String,
    pub watermark: Watermark,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Watermark {
    #[serde(with = "jiff::fmt::serde::timestamp::second::required")]
    pub timestamp: Timestamp,
    #[serde(rename = "appid")]
    pub app_id: String,
}

// The backend has sent `countryCode` both as "86" and as 86.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
