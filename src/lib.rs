//! Strata - content-addressed stage signatures for container builds
//!
//! Computes a deterministic signature for every stage of a build plan
//! from the instruction text, checksums of the files it pulls in, and
//! the signature of the stage before it.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod instruction;
pub mod plan;
pub mod signature;
pub mod stage;
pub mod store;
pub mod ui;

pub use error::{StrataError, StrataResult};
