#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use crm_lookup_tools::model::{Credentials, Record, RecordSet, Session};
use crm_lookup_tools::remote::{CrmService, TokenGrant, UserInfo};
use crm_lookup_tools::session::{Browser, Prompt};
use crm_lookup_tools::{LookupError, Result};
use serde_json::Value;
use url::Url;

pub const INSTANCE_URL: &str = "https://acme.my.salesforce.com";
pub const ACCEPTED_PASSWORD: &str = "correct-horse";

/// Converts `json!` object fixtures into records.
pub fn records(values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .map(|value| match value {
            Value::Object(map) => map,
            other => panic!("fixture must be an object, got {other}"),
        })
        .collect()
}

pub fn session() -> Session {
    Session::new(INSTANCE_URL, "00D000000000001!token", Some("Dana S.".to_string()))
}

/// Remote service double that counts every call.
pub struct StubService {
    pub records: RefCell<Vec<Record>>,
    pub query_fails: Cell<bool>,
    pub reject_exchange: bool,
    pub user_info: Option<UserInfo>,
    pub query_calls: Cell<usize>,
    pub login_calls: Cell<usize>,
    pub exchange_calls: Cell<usize>,
    pub user_info_calls: Cell<usize>,
    pub last_soql: RefCell<Option<String>>,
    pub last_code: RefCell<Option<String>>,
}

impl Default for StubService {
    fn default() -> Self {
        Self {
            records: RefCell::new(Vec::new()),
            query_fails: Cell::new(false),
            reject_exchange: false,
            user_info: Some(UserInfo {
                given_name: Some("Dana".to_string()),
                family_name: Some("Smith".to_string()),
                preferred_username: Some("dana@acme.test".to_string()),
            }),
            query_calls: Cell::new(0),
            login_calls: Cell::new(0),
            exchange_calls: Cell::new(0),
            user_info_calls: Cell::new(0),
            last_soql: RefCell::new(None),
            last_code: RefCell::new(None),
        }
    }
}

impl StubService {
    pub fn with_records(values: Vec<Value>) -> Self {
        let stub = Self::default();
        stub.set_records(values);
        stub
    }

    pub fn set_records(&self, values: Vec<Value>) {
        *self.records.borrow_mut() = records(values);
    }

    pub fn remote_calls(&self) -> usize {
        self.query_calls.get()
            + self.login_calls.get()
            + self.exchange_calls.get()
            + self.user_info_calls.get()
    }
}

impl CrmService for StubService {
    fn login_with_credentials(&self, credentials: &Credentials) -> Result<Session> {
        self.login_calls.set(self.login_calls.get() + 1);
        if credentials.password == ACCEPTED_PASSWORD {
            Ok(Session::new(INSTANCE_URL, "sid", Some("Dana Smith".to_string())))
        } else {
            Err(LookupError::AuthenticationFailure(
                "INVALID_LOGIN: Invalid username, password, security token; or user locked out."
                    .to_string(),
            ))
        }
    }

    fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        self.exchange_calls.set(self.exchange_calls.get() + 1);
        *self.last_code.borrow_mut() = Some(code.to_string());
        if self.reject_exchange {
            return Err(LookupError::Remote {
                status: 400,
                message: "expired authorization code".to_string(),
            });
        }
        Ok(TokenGrant {
            access_token: "00D000000000001!oauth".to_string(),
            refresh_token: Some("5Aep861".to_string()),
            instance_url: INSTANCE_URL.to_string(),
            id: None,
            token_type: Some("Bearer".to_string()),
        })
    }

    fn user_info(&self, _access_token: &str) -> Result<UserInfo> {
        self.user_info_calls.set(self.user_info_calls.get() + 1);
        self.user_info.clone().ok_or_else(|| LookupError::Remote {
            status: 403,
            message: "Bad_OAuth_Token".to_string(),
        })
    }

    fn query(&self, _session: &Session, soql: &str) -> Result<RecordSet> {
        self.query_calls.set(self.query_calls.get() + 1);
        *self.last_soql.borrow_mut() = Some(soql.to_string());
        if self.query_fails.get() {
            return Err(LookupError::Remote {
                status: 400,
                message: "MALFORMED_QUERY: unexpected token".to_string(),
            });
        }
        Ok(RecordSet::new(self.records.borrow().clone()))
    }
}

/// What the fake user pastes back after the browser step.
pub enum Paste {
    /// A well-formed redirect echoing the state from the opened URL.
    Redirect { code: String },
    /// Exactly this text.
    Text(String),
    /// Dismisses the prompt.
    Cancel,
}

/// Browser and prompt double standing in for the person at the keyboard.
pub struct FakeUser {
    pub paste: Paste,
    pub browser_works: bool,
    pub confirm_answer: bool,
    pub opened: RefCell<Vec<String>>,
    pub notices: RefCell<Vec<String>>,
    pub confirm_calls: Cell<usize>,
}

impl FakeUser {
    pub fn pasting(paste: Paste) -> Self {
        Self {
            paste,
            browser_works: true,
            confirm_answer: true,
            opened: RefCell::new(Vec::new()),
            notices: RefCell::new(Vec::new()),
            confirm_calls: Cell::new(0),
        }
    }

    pub fn confirming(answer: bool) -> Self {
        Self {
            confirm_answer: answer,
            ..Self::pasting(Paste::Cancel)
        }
    }

    fn opened_state(&self) -> String {
        let opened = self.opened.borrow();
        let url = opened.last().expect("browser opened before paste");
        Url::parse(url)
            .expect("authorize URL parses")
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("state parameter present")
    }
}

impl Browser for FakeUser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        self.opened.borrow_mut().push(url.to_string());
        if self.browser_works {
            Ok(())
        } else {
            Err(std::io::Error::other("no browser available"))
        }
    }
}

impl Prompt for FakeUser {
    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }

    fn ask_line(&self, _message: &str) -> Option<String> {
        match &self.paste {
            Paste::Redirect { code } => Some(format!(
                "http://localhost:8080/callback?code={code}&state={}",
                self.opened_state()
            )),
            Paste::Text(text) => Some(text.clone()),
            Paste::Cancel => None,
        }
    }

    fn confirm(&self, _question: &str) -> bool {
        self.confirm_calls.set(self.confirm_calls.get() + 1);
        self.confirm_answer
    }
}
