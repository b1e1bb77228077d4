//! Session manager: establishes the single authenticated session.

pub mod interaction;
pub mod oauth;

use tracing::{info, instrument, warn};

use crate::crm::lookup::error::{LookupError, Result};
use crate::crm::lookup::model::{Credentials, Session};
use crate::crm::lookup::remote::CrmService;

pub use interaction::{Browser, Prompt, SystemBrowser, TerminalPrompt};
pub use oauth::OAuthFlow;

/// The two mutually exclusive login strategies.
pub enum LoginMode<'a> {
    /// Username, password and security token.
    Credentials(Credentials),
    /// Browser-based authorization code flow.
    OAuth(OAuthFlow<'a>),
}

impl LoginMode<'_> {
    fn label(&self) -> &'static str {
        match self {
            LoginMode::Credentials(_) => "credentials",
            LoginMode::OAuth(_) => "oauth",
        }
    }
}

/// Logs in with the chosen strategy.
///
/// Every failure is reported as [`LookupError::AuthenticationFailure`], except
/// a dismissed prompt which stays [`LookupError::UserCancelled`].
#[instrument(level = "info", skip_all, fields(mode = mode.label()))]
pub fn login(service: &dyn CrmService, mode: LoginMode<'_>) -> Result<Session> {
    let result = match mode {
        LoginMode::Credentials(credentials) => service.login_with_credentials(&credentials),
        LoginMode::OAuth(flow) => oauth::login(service, &flow),
    };

    match result {
        Ok(session) => {
            info!(instance_url = session.instance_url(), "session established");
            Ok(session)
        }
        Err(error) => {
            warn!(%error, "login failed");
            Err(as_login_error(error))
        }
    }
}

/// Collects the direct-credential inputs. Password and security token are
/// asked for without echo; dismissing any question cancels the login.
pub fn ask_credentials(prompt: &dyn Prompt) -> Result<Credentials> {
    let username = prompt
        .ask_line("Username:")
        .ok_or(LookupError::UserCancelled)?;
    let password = prompt
        .ask_secret("Password:")
        .ok_or(LookupError::UserCancelled)?;
    let security_token = prompt
        .ask_secret("Security token:")
        .ok_or(LookupError::UserCancelled)?;
    Ok(Credentials {
        username,
        password,
        security_token,
    })
}

fn as_login_error(error: LookupError) -> LookupError {
    match error {
        LookupError::AuthenticationFailure(_) | LookupError::UserCancelled => error,
        other => LookupError::AuthenticationFailure(other.to_string()),
    }
}
