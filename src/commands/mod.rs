//! CLI command implementations for layoutmap.
//!
//! Available commands:
//! - **compare**: Compare a project against the suggestion documents
//! - **status**: Inspect or edit the implementation status ledger
//! - **init**: Initialize a new layoutmap configuration file

pub mod compare;
pub mod init;
pub mod status;

pub use compare::{run_compare, CompareConfig};
pub use init::init_config;
pub use status::handle_status;
