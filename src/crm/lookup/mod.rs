pub mod config;
pub mod error;
pub mod flatten;
pub mod io;
pub mod logging;
pub mod model;
pub mod query;
pub mod remote;
pub mod render;
pub mod session;
pub mod workspace;

pub use error::{LookupError, Result};
