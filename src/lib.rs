//! Core library for the crm-lookup-tools command line application.
//!
//! The library covers everything behind the interactive shell: the session
//! manager with its two login strategies under [`crm::lookup::session`], the
//! fixed query catalog in [`crm::lookup::query`], the record flattener in
//! [`crm::lookup::flatten`] and the CSV/Excel export sink under
//! [`crm::lookup::io`]. Network access goes through the
//! [`crm::lookup::remote::CrmService`] trait.

pub mod crm;

pub use crm::lookup::{
    LookupError, Result, config, error, flatten, io, logging, model, query, remote, render,
    session, workspace,
};
