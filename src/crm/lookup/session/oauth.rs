//! Authorization-code login with a manual redirect paste step.
//!
//! 1. Build the authorization URL (with a random `state`) and open it.
//! 2. Block on the prompt until the user pastes the redirected URL.
//! 3. Exchange the code from that URL for tokens.
//! 4. Fetch identity info and derive the display name.

use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::crm::lookup::config::AppRegistration;
use crate::crm::lookup::error::{LookupError, Result};
use crate::crm::lookup::model::Session;
use crate::crm::lookup::remote::{CrmService, UserInfo};
use crate::crm::lookup::session::interaction::{Browser, Prompt};

const BROWSER_NOTICE: &str = "Please complete login in your browser. When finished, copy and paste \
the full redirected URL below.";
const PASTE_QUESTION: &str = "Paste the full redirected URL here:";

/// Everything the OAuth strategy needs besides the remote service.
#[derive(Clone, Copy)]
pub struct OAuthFlow<'a> {
    pub registration: &'a AppRegistration,
    pub browser: &'a dyn Browser,
    pub prompt: &'a dyn Prompt,
}

/// Builds the URL the user authorizes the app at.
pub fn authorization_url(registration: &AppRegistration, state: &str) -> Result<Url> {
    let scope = registration.scopes.join(" ");
    Url::parse_with_params(
        &registration.authorize_endpoint(),
        [
            ("response_type", "code"),
            ("client_id", registration.client_id.as_str()),
            ("redirect_uri", registration.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|error| LookupError::AuthenticationFailure(format!("invalid authorize URL: {error}")))
}

/// Pulls the authorization code out of the pasted redirect URL.
///
/// The `state` parameter must echo the one sent with the authorization URL.
/// An `error` parameter from the authorization server is reported as-is.
pub fn parse_redirect(pasted: &str, expected_state: &str) -> Result<String> {
    let url = Url::parse(pasted.trim()).map_err(|error| {
        LookupError::AuthenticationFailure(format!("malformed redirect URL: {error}"))
    })?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(LookupError::AuthenticationFailure(
            error_description.unwrap_or(error),
        ));
    }
    if state.as_deref() != Some(expected_state) {
        return Err(LookupError::AuthenticationFailure(
            "state mismatch in redirect URL".to_string(),
        ));
    }
    code.filter(|code| !code.is_empty()).ok_or_else(|| {
        LookupError::AuthenticationFailure(
            "redirect URL carries no authorization code".to_string(),
        )
    })
}

/// Given name followed by the family initial, e.g. `Dana S.`.
///
/// Without a family name only the given name is used; with neither the label
/// is empty.
pub fn display_name(info: &UserInfo) -> String {
    let given = info.given_name.as_deref().unwrap_or_default().trim();
    let initial = info
        .family_name
        .as_deref()
        .and_then(|family| family.trim().chars().next());

    match initial {
        Some(initial) => format!("{given} {initial}.").trim_start().to_string(),
        None => given.to_string(),
    }
}

/// Runs the whole flow. Any failure leaves no session behind.
pub fn login(service: &dyn CrmService, flow: &OAuthFlow<'_>) -> Result<Session> {
    let state = Uuid::new_v4().simple().to_string();
    let url = authorization_url(flow.registration, &state)?;

    if let Err(error) = flow.browser.open(url.as_str()) {
        warn!(%error, "could not launch browser");
        flow.prompt
            .notify(&format!("Open this URL in your browser to continue:\n{url}"));
    }
    flow.prompt.notify(BROWSER_NOTICE);

    let pasted = flow
        .prompt
        .ask_line(PASTE_QUESTION)
        .filter(|line| !line.trim().is_empty())
        .ok_or(LookupError::UserCancelled)?;

    let code = parse_redirect(&pasted, &state)?;
    debug!("authorization code received");

    let grant = service.exchange_code(&code)?;
    let identity = service.user_info(&grant.access_token)?;
    let name = display_name(&identity);
    info!(instance_url = %grant.instance_url, user = %name, "OAuth login complete");

    let display = (!name.is_empty()).then_some(name);
    Ok(Session::new(grant.instance_url, grant.access_token, display))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(given: Option<&str>, family: Option<&str>) -> UserInfo {
        UserInfo {
            given_name: given.map(str::to_string),
            family_name: family.map(str::to_string),
            preferred_username: None,
        }
    }

    #[test]
    fn display_name_uses_family_initial() {
        assert_eq!(display_name(&info(Some("Dana"), Some("Smith"))), "Dana S.");
    }

    #[test]
    fn display_name_without_family_is_given_only() {
        assert_eq!(display_name(&info(Some("Dana"), Some(""))), "Dana");
        assert_eq!(display_name(&info(Some("Dana"), None)), "Dana");
    }

    #[test]
    fn display_name_with_no_names_is_empty() {
        assert_eq!(display_name(&info(None, None)), "");
        assert_eq!(display_name(&info(Some(""), Some(""))), "");
    }

    #[test]
    fn authorization_url_carries_registration() {
        let registration = AppRegistration::default();
        let url = authorization_url(&registration, "abc123").expect("url");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.path(), "/services/oauth2/authorize");
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("state".into(), "abc123".into())));
        assert!(pairs.contains(&(
            "scope".into(),
            "api refresh_token offline_access".into()
        )));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:8080/callback".into()
        )));
    }

    #[test]
    fn redirect_with_matching_state_yields_code() {
        let code = parse_redirect(
            "http://localhost:8080/callback?code=aPrx%3D%3D&state=s1",
            "s1",
        )
        .expect("code");
        assert_eq!(code, "aPrx==");
    }

    #[test]
    fn redirect_with_wrong_state_is_rejected() {
        let error = parse_redirect("http://localhost:8080/callback?code=x&state=other", "s1")
            .expect_err("mismatch");
        assert!(error.to_string().contains("state mismatch"));
    }

    #[test]
    fn redirect_error_is_reported() {
        let error = parse_redirect(
            "http://localhost:8080/callback?error=access_denied&error_description=end-user+denied+authorization&state=s1",
            "s1",
        )
        .expect_err("denied");
        assert!(error.to_string().contains("end-user denied authorization"));
    }

    #[test]
    fn malformed_redirect_is_authentication_failure() {
        let error = parse_redirect("not a url", "s1").expect_err("malformed");
        assert!(matches!(error, LookupError::AuthenticationFailure(_)));
    }

    #[test]
    fn redirect_without_code_is_rejected() {
        let error =
            parse_redirect("http://localhost:8080/callback?state=s1", "s1").expect_err("no code");
        assert!(error.to_string().contains("no authorization code"));
    }
}
