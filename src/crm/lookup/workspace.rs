//! State owned by the presentation shell: at most one session and the most
//! recent result table.
//!
//! Failed actions never corrupt what is already there. A failed query or
//! export leaves the previous table in place; a failed login leaves no
//! session.

use std::path::Path;

use tracing::info;

use crate::crm::lookup::error::{LookupError, Result};
use crate::crm::lookup::flatten::Table;
use crate::crm::lookup::io::{self, ExportFormat};
use crate::crm::lookup::model::Session;
use crate::crm::lookup::query::{self, QueryKind, SearchTerms};
use crate::crm::lookup::remote::CrmService;
use crate::crm::lookup::session::{self, LoginMode, Prompt};

const LOGOUT_QUESTION: &str = "Are you sure you want to log out?";

/// Result of a query as seen by the user.
#[derive(Debug, PartialEq)]
pub enum QueryOutcome<'a> {
    /// The query matched records; the table is now the current one.
    Rows(&'a Table),
    /// Nothing matched. The previous table, if any, is kept.
    NoResults,
}

/// Result of a logout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// There was no session; nothing was asked or changed.
    NotLoggedIn,
    /// The user declined the confirmation.
    Kept,
    LoggedOut,
}

/// Session and result state behind the shell's buttons.
#[derive(Debug)]
pub struct Workspace<S> {
    service: S,
    session: Option<Session>,
    table: Option<Table>,
}

impl<S: CrmService> Workspace<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            session: None,
            table: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Most recent non-empty query result.
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Replaces the current session with a new login.
    ///
    /// The previous session is discarded before the attempt, so a failure
    /// leaves the workspace unauthenticated.
    pub fn login(&mut self, mode: LoginMode<'_>) -> Result<&Session> {
        self.session = None;
        let session = session::login(&self.service, mode)?;
        Ok(&*self.session.insert(session))
    }

    pub fn run_query(&mut self, kind: QueryKind, terms: &SearchTerms) -> Result<QueryOutcome<'_>> {
        let table = query::run_query(self.session.as_ref(), &self.service, kind, terms)?;
        if table.is_empty() {
            return Ok(QueryOutcome::NoResults);
        }
        Ok(QueryOutcome::Rows(&*self.table.insert(table)))
    }

    /// Exports the current table.
    pub fn export(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let table = self.table.as_ref().ok_or(LookupError::NothingToExport)?;
        io::export_table(table, path, format)
    }

    /// Discards the session after the user confirms.
    ///
    /// Without a session this is a no-op and the user is not asked.
    pub fn logout(&mut self, prompt: &dyn Prompt) -> LogoutOutcome {
        if self.session.is_none() {
            return LogoutOutcome::NotLoggedIn;
        }
        if !prompt.confirm(LOGOUT_QUESTION) {
            return LogoutOutcome::Kept;
        }
        self.session = None;
        info!("session discarded");
        LogoutOutcome::LoggedOut
    }
}
