//! CLI command handlers. Each command is in its own file.

mod checksums;
mod link;
mod link_pdb;
mod options;
mod verify;

pub use checksums::run_checksums;
pub use link::run_link;
pub use link_pdb::run_link_pdb;
pub use verify::run_verify;
