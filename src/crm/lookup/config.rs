//! Connected-app registration used by both login strategies.
//!
//! There is no configuration file. The compiled-in defaults can be overridden
//! per field through `CRM_LOOKUP_*` environment variables, e.g.
//! `CRM_LOOKUP_CLIENT_ID` or `CRM_LOOKUP_LOGIN_URL`.

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::crm::lookup::error::Result;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "CRM_LOOKUP_";

const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
const DEFAULT_API_VERSION: &str = "59.0";

fn default_scopes() -> Vec<String> {
    ["api", "refresh_token", "offline_access"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Static OAuth parameters and API settings for the remote CRM.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
pub struct AppRegistration {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Base URL of the login host, without a trailing slash.
    pub login_url: String,
    pub scopes: Vec<String>,
    /// REST and SOAP API version, e.g. `59.0`.
    pub api_version: String,
}

impl Default for AppRegistration {
    fn default() -> Self {
        Self {
            client_id: "YOUR_CONSUMER_KEY_HERE".to_string(),
            client_secret: "YOUR_CONSUMER_SECRET_HERE".to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            scopes: default_scopes(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl std::fmt::Debug for AppRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRegistration")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("login_url", &self.login_url)
            .field("scopes", &self.scopes)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl AppRegistration {
    /// Loads the registration from defaults layered with environment overrides.
    pub fn load() -> Result<Self> {
        Ok(Self::figment().extract()?)
    }

    /// Provider chain: built-in defaults, then `CRM_LOOKUP_*` variables.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    fn login_base(&self) -> &str {
        self.login_url.trim_end_matches('/')
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}/services/oauth2/authorize", self.login_base())
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/services/oauth2/token", self.login_base())
    }

    pub fn userinfo_endpoint(&self) -> String {
        format!("{}/services/oauth2/userinfo", self.login_base())
    }

    /// SOAP partner endpoint used by the credential login.
    pub fn soap_login_endpoint(&self) -> String {
        format!("{}/services/Soap/u/{}", self.login_base(), self.api_version)
    }
}
