//! SOAP `login` call used by the direct-credential strategy.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use url::Url;

use crate::crm::lookup::error::{LookupError, Result};

/// Successful answer to the SOAP `login` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapLogin {
    pub server_url: String,
    pub session_id: String,
    pub user_full_name: Option<String>,
}

impl SoapLogin {
    /// Scheme and host of `serverUrl`, which is the instance the REST API lives on.
    pub fn instance_url(&self) -> Result<String> {
        let url = Url::parse(&self.server_url).map_err(|error| {
            LookupError::AuthenticationFailure(format!(
                "invalid server URL '{}': {error}",
                self.server_url
            ))
        })?;
        Ok(url.origin().ascii_serialization())
    }
}

/// Builds the request envelope. The password must already carry the security
/// token appended to it.
pub fn login_envelope(username: &str, password_and_token: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope
        xmlns:xsd="http://www.w3.org/2001/XMLSchema"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xmlns:env="http://schemas.xmlsoap.org/soap/envelope/"
        xmlns:urn="urn:partner.soap.sforce.com">
    <env:Header>
        <urn:CallOptions>
            <urn:client>crm-lookup-tools</urn:client>
        </urn:CallOptions>
    </env:Header>
    <env:Body>
        <n1:login xmlns:n1="urn:partner.soap.sforce.com">
            <n1:username>{username}</n1:username>
            <n1:password>{password}</n1:password>
        </n1:login>
    </env:Body>
</env:Envelope>"#,
        username = escape(username),
        password = escape(password_and_token),
    )
}

/// Parses a `login` response or SOAP fault.
///
/// A fault becomes [`LookupError::AuthenticationFailure`] carrying the
/// `faultstring` text.
pub fn parse_login_response(xml: &str) -> Result<SoapLogin> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut current: Option<String> = None;
    let mut server_url = None;
    let mut session_id = None;
    let mut user_full_name = None;
    let mut fault = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                current = Some(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
            }
            Event::End(_) => current = None,
            Event::Text(text) => {
                let value = text.unescape()?.into_owned();
                match current.as_deref() {
                    Some("serverUrl") => server_url = Some(value),
                    Some("sessionId") => session_id = Some(value),
                    Some("userFullName") => user_full_name = Some(value),
                    Some("faultstring") => fault = Some(value),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(fault) = fault {
        return Err(LookupError::AuthenticationFailure(fault));
    }

    match (server_url, session_id) {
        (Some(server_url), Some(session_id)) => Ok(SoapLogin {
            server_url,
            session_id,
            user_full_name,
        }),
        _ => Err(LookupError::Xml(
            "login response is missing serverUrl or sessionId".to_string(),
        )),
    }
}
