//! The fixed catalog of record searches.
//!
//! Search text is matched with `LIKE '%…%'`, so the remote service performs a
//! "contains" match. User text is escaped as a SOQL string literal before it
//! is placed in the filter; `%` and `_` keep their wildcard meaning.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, instrument};

use crate::crm::lookup::error::{LookupError, Result};
use crate::crm::lookup::flatten::{Table, flatten};
use crate::crm::lookup::model::{MAX_RECORDS, Session};
use crate::crm::lookup::remote::CrmService;

/// Service type the phone-line search is restricted to.
pub const HOSTED_VOIP: &str = "Hosted VOIP";

/// The searches a user can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    PartQuoteRequest,
    InsideWiringSurvey,
    PhoneLineDetails,
}

impl QueryKind {
    pub const ALL: [QueryKind; 3] = [
        QueryKind::PartQuoteRequest,
        QueryKind::InsideWiringSurvey,
        QueryKind::PhoneLineDetails,
    ];

    /// Label shown to users.
    pub fn label(self) -> &'static str {
        self.spec().label
    }

    /// Command-line friendly name.
    pub fn slug(self) -> &'static str {
        match self {
            QueryKind::PartQuoteRequest => "part-quote-request",
            QueryKind::InsideWiringSurvey => "inside-wiring-survey",
            QueryKind::PhoneLineDetails => "phone-line-details",
        }
    }

    fn short(self) -> &'static str {
        match self {
            QueryKind::PartQuoteRequest => "pqr",
            QueryKind::InsideWiringSurvey => "iws",
            QueryKind::PhoneLineDetails => "pld",
        }
    }

    pub fn spec(self) -> &'static QuerySpec {
        match self {
            QueryKind::PartQuoteRequest => &PART_QUOTE_REQUEST,
            QueryKind::InsideWiringSurvey => &INSIDE_WIRING_SURVEY,
            QueryKind::PhoneLineDetails => &PHONE_LINE_DETAILS,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QueryKind {
    type Err = String;

    /// Accepts the label, the slug or the three-letter abbreviation, in any case.
    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = input.trim().to_ascii_lowercase();
        QueryKind::ALL
            .into_iter()
            .find(|kind| {
                wanted == kind.slug()
                    || wanted == kind.short()
                    || wanted == kind.label().to_ascii_lowercase()
            })
            .ok_or_else(|| {
                let known: Vec<&str> = QueryKind::ALL.iter().map(|kind| kind.slug()).collect();
                format!("unknown query '{input}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Match predicate applied to the search terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// `Address__c` contains the address term.
    AddressContains,
    /// Hosted VOIP lines whose address contains the address term or whose
    /// phone number contains the phone term.
    HostedVoipAddressOrPhone,
}

/// Immutable search template: entity, projected fields and filter.
#[derive(Debug, PartialEq, Eq)]
pub struct QuerySpec {
    pub label: &'static str,
    pub entity: &'static str,
    pub fields: &'static [&'static str],
    pub filter: Filter,
}

pub static PART_QUOTE_REQUEST: QuerySpec = QuerySpec {
    label: "Part Quote Request",
    entity: "Construction__c",
    fields: &[
        "Name",
        "Opportunity__r.Name",
        "Stage__c",
        "Quote_Status__c",
        "Transport__c",
        "Final_Coax_Cost__c",
        "Final_Fiber_Cost__c",
        "Network_Cost__c",
        "Address__c",
    ],
    filter: Filter::AddressContains,
};

pub static INSIDE_WIRING_SURVEY: QuerySpec = QuerySpec {
    label: "Inside Wiring Survey",
    entity: "Sales_Request__c",
    fields: &[
        "Name",
        "SRQ_Status__c",
        "SRQ_Type__c",
        "Assigned_To__c",
        "Fiber_Costs__c",
        "Coax_Costs__c",
        "Address__c",
    ],
    filter: Filter::AddressContains,
};

pub static PHONE_LINE_DETAILS: QuerySpec = QuerySpec {
    label: "Phone Line Details",
    entity: "Phone_Line_Detail__c",
    fields: &[
        "Name",
        "Phone_Number__c",
        "Customer_Name__c",
        "Hunt_Group__c",
        "Auto_Attendant__c",
        "Address__c",
    ],
    filter: Filter::HostedVoipAddressOrPhone,
};

/// User-entered search text.
///
/// The second field doubles as zip code and phone fragment; only the phone
/// line search reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    pub address: String,
    pub zip_or_phone: String,
}

impl SearchTerms {
    pub fn new(address: impl Into<String>, zip_or_phone: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            zip_or_phone: zip_or_phone.into(),
        }
    }
}

impl QuerySpec {
    /// Renders the SOQL statement for the given search terms.
    pub fn soql(&self, terms: &SearchTerms) -> String {
        let address = contains_pattern(&terms.address);
        let predicate = match self.filter {
            Filter::AddressContains => format!("Address__c LIKE {address}"),
            Filter::HostedVoipAddressOrPhone => format!(
                "(Service_Type__c = {service}) AND (Address__c LIKE {address} OR Phone_Number__c LIKE {phone})",
                service = quote_literal(HOSTED_VOIP),
                phone = contains_pattern(&terms.zip_or_phone),
            ),
        };

        format!(
            "SELECT {fields} FROM {entity} WHERE {predicate} LIMIT {MAX_RECORDS}",
            fields = self.fields.join(", "),
            entity = self.entity,
        )
    }
}

/// Escapes text for use inside a single-quoted SOQL literal.
pub fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{8}' => escaped.push_str("\\b"),
            '\u{c}' => escaped.push_str("\\f"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", escape_literal(text))
}

fn contains_pattern(term: &str) -> String {
    format!("'%{}%'", escape_literal(term))
}

/// Runs a catalog query and flattens the result.
///
/// Without a session nothing is sent and [`LookupError::Unauthenticated`] is
/// returned. An empty table is a valid "no matching records" outcome.
#[instrument(level = "info", skip_all, fields(kind = %kind))]
pub fn run_query(
    session: Option<&Session>,
    service: &dyn CrmService,
    kind: QueryKind,
    terms: &SearchTerms,
) -> Result<Table> {
    let session = session.ok_or(LookupError::Unauthenticated)?;
    let soql = kind.spec().soql(terms);
    debug!(%soql, "executing query");

    let records = service.query(session, &soql)?;
    let table = flatten(&records);
    info!(
        record_count = records.len(),
        column_count = table.columns().len(),
        "query complete"
    );
    Ok(table)
}
