use serde_json::{Map, Value};

/// Server-side cap on the number of records a single query returns.
pub const MAX_RECORDS: usize = 200;

/// One raw record as returned by the remote query call: field name → value.
///
/// Values are scalars or nested objects (relationship fields and the
/// `attributes` envelope).
pub type Record = Map<String, Value>;

/// Ordered records returned by a query, never longer than [`MAX_RECORDS`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    /// Builds a record set, dropping anything beyond [`MAX_RECORDS`].
    pub fn new(mut records: Vec<Record>) -> Self {
        records.truncate(MAX_RECORDS);
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

/// Authenticated handle to the remote CRM service.
///
/// Owned by the shell; its lifetime is bounded by login and logout.
#[derive(Clone, PartialEq)]
pub struct Session {
    instance_url: String,
    access_token: String,
    display_name: Option<String>,
}

impl Session {
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        display_name: Option<String>,
    ) -> Self {
        let instance_url: String = instance_url.into();
        Self {
            instance_url: instance_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            display_name,
        }
    }

    /// Base URL of the CRM instance, without a trailing slash.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Bearer credential (OAuth access token or SOAP session id).
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Human label for the logged-in user; empty when unknown.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Inputs of the direct-credential login. No client-side validation is done.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub security_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("security_token", &"<redacted>")
            .finish()
    }
}
