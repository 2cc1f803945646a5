// Library surface shared by the CLI and the integration tests.
pub mod aggregate;
pub mod app_dirs;
pub mod archive;
pub mod badges;
pub mod cause;
pub mod config;
pub mod error;
pub mod finalize;
pub mod parse;
pub mod radar;
pub mod report;
pub mod scanner;
pub mod session;
pub mod util;

pub use aggregate::{Scope, SummaryAggregate};
pub use report::Report;
pub use session::{Outcome, SessionRecord};
