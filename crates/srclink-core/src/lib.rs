pub mod config;
pub mod logging;

pub mod batch;
pub mod checksum;
pub mod error;
pub mod extract;
pub mod linker;
pub mod path_resolver;
pub mod provider;
pub mod srcsrv;
pub mod verify;

pub use error::{Result, SrcLinkError};
