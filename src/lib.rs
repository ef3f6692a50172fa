//! Joules power-analysis flow: turns report requests into a TCL script for the
//! tool and parses the reports it writes into CSV or JSON.

pub use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use tera::Tera;

pub mod batch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod parse;
pub mod paths;
pub mod script;
pub mod stimulus;
pub mod units;

lazy_static! {
    pub static ref TEMPLATES: Tera =
        match Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/*")) {
            Ok(t) => t,
            Err(e) => panic!("Error parsing templates: {e}"),
        };
}
