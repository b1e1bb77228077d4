//! Boundary to the remote CRM service.
//!
//! [`CrmService`] is the only seam through which the session manager and the
//! query catalog reach the network. [`HttpCrmService`] talks to the real
//! service; tests substitute counting stubs.

pub mod http;
pub mod soap;

use serde::Deserialize;
use serde_json::Value;

use crate::crm::lookup::error::Result;
use crate::crm::lookup::model::{Credentials, RecordSet, Session};

pub use http::HttpCrmService;

/// Tokens returned by the OAuth token endpoint.
#[derive(Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub instance_url: String,
    /// Identity URL of the authenticated user.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Subset of the identity endpoint payload the tool displays.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct UserInfo {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

/// Calls the lookup tool makes against the remote CRM.
pub trait CrmService {
    /// Direct-credential login; the password and security token are sent as-is.
    fn login_with_credentials(&self, credentials: &Credentials) -> Result<Session>;

    /// Exchanges an OAuth authorization code for tokens.
    fn exchange_code(&self, code: &str) -> Result<TokenGrant>;

    /// Fetches identity information for a bearer token.
    fn user_info(&self, access_token: &str) -> Result<UserInfo>;

    /// Runs a query and returns at most [`MAX_RECORDS`](crate::crm::lookup::model::MAX_RECORDS)
    /// records, following continuation pages as needed.
    fn query(&self, session: &Session, soql: &str) -> Result<RecordSet>;
}

/// Extracts a readable message from an error body returned by the service.
///
/// REST calls answer with `[{"message": …, "errorCode": …}]`, the OAuth
/// endpoints with `{"error": …, "error_description": …}`. Anything else is
/// returned trimmed.
pub fn error_message(body: &str) -> String {
    let fallback = || {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "empty response".to_string()
        } else {
            trimmed.to_string()
        }
    };

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    let entry = match &value {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(&value),
        _ => None,
    };
    let Some(entry) = entry else {
        return fallback();
    };

    let text = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);

    match (text("errorCode"), text("message")) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (None, Some(message)) => message,
        _ => text("error_description")
            .or_else(|| text("error"))
            .unwrap_or_else(fallback),
    }
}
