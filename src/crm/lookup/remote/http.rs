use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::crm::lookup::config::AppRegistration;
use crate::crm::lookup::error::{LookupError, Result};
use crate::crm::lookup::model::{Credentials, MAX_RECORDS, Record, RecordSet, Session};
use crate::crm::lookup::remote::{CrmService, TokenGrant, UserInfo, error_message, soap};

/// Blocking HTTP client for the remote CRM.
///
/// Timeouts are the transport defaults; there is no retry layer.
#[derive(Debug, Clone)]
pub struct HttpCrmService {
    client: Client,
    registration: AppRegistration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPage {
    #[serde(default)]
    total_size: u64,
    #[serde(default = "page_done_default")]
    done: bool,
    #[serde(default)]
    next_records_url: Option<String>,
    #[serde(default)]
    records: Vec<Record>,
}

fn page_done_default() -> bool {
    true
}

impl HttpCrmService {
    pub fn new(registration: AppRegistration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("crm-lookup-tools/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            registration,
        })
    }

    fn query_endpoint(&self, session: &Session) -> String {
        format!(
            "{}/services/data/v{}/query",
            session.instance_url(),
            self.registration.api_version
        )
    }

    fn fetch_page(&self, request: RequestBuilder) -> Result<QueryPage> {
        let response = request.send()?;
        let response = ensure_success(response)?;
        Ok(response.json()?)
    }
}

impl CrmService for HttpCrmService {
    #[instrument(level = "info", skip_all, fields(username = %credentials.username))]
    fn login_with_credentials(&self, credentials: &Credentials) -> Result<Session> {
        let secret = format!("{}{}", credentials.password, credentials.security_token);
        let envelope = soap::login_envelope(&credentials.username, &secret);

        let response = self
            .client
            .post(self.registration.soap_login_endpoint())
            .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
            .header("SOAPAction", "login")
            .body(envelope)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        debug!(status = status.as_u16(), "SOAP login answered");

        let login = soap::parse_login_response(&body)?;
        let instance_url = login.instance_url()?;
        Ok(Session::new(instance_url, login.session_id, login.user_full_name))
    }

    #[instrument(level = "info", skip_all)]
    fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        let registration = &self.registration;
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", registration.client_id.as_str()),
            ("client_secret", registration.client_secret.as_str()),
            ("redirect_uri", registration.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(registration.token_endpoint())
            .form(&form)
            .send()?;
        let response = ensure_success(response).map_err(into_auth_failure)?;
        let grant: TokenGrant = response.json()?;
        debug!(instance_url = %grant.instance_url, "authorization code exchanged");
        Ok(grant)
    }

    #[instrument(level = "info", skip_all)]
    fn user_info(&self, access_token: &str) -> Result<UserInfo> {
        let response = self
            .client
            .get(self.registration.userinfo_endpoint())
            .bearer_auth(access_token)
            .send()?;
        let response = ensure_success(response).map_err(into_auth_failure)?;
        Ok(response.json()?)
    }

    #[instrument(level = "info", skip_all, fields(instance = %session.instance_url()))]
    fn query(&self, session: &Session, soql: &str) -> Result<RecordSet> {
        let first = self
            .client
            .get(self.query_endpoint(session))
            .bearer_auth(session.access_token())
            .query(&[("q", soql)]);
        let mut page = self.fetch_page(first)?;
        debug!(total_size = page.total_size, "query answered");

        let mut records = std::mem::take(&mut page.records);
        while !page.done && records.len() < MAX_RECORDS {
            let Some(next) = page.next_records_url.take() else {
                warn!("query page not done but carries no continuation URL");
                break;
            };
            let request = self
                .client
                .get(format!("{}{next}", session.instance_url()))
                .bearer_auth(session.access_token());
            page = self.fetch_page(request)?;
            records.append(&mut page.records);
        }

        Ok(RecordSet::new(records))
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(LookupError::Remote {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn into_auth_failure(error: LookupError) -> LookupError {
    match error {
        LookupError::Remote { status, message } if status == StatusCode::UNAUTHORIZED.as_u16() => {
            LookupError::AuthenticationFailure(format!("unauthorized: {message}"))
        }
        LookupError::Remote { message, .. } => LookupError::AuthenticationFailure(message),
        other => other,
    }
}
