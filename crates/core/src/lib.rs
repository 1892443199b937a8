//! Core domain types for vecsync
//!
//! This crate contains the table registry, record and report types shared
//! across all other crates.

mod env_config;
mod outcome;
mod record;
mod table_spec;

pub use env_config::*;
pub use outcome::*;
pub use record::*;
pub use table_spec::*;
