//! letras - incremental lyrics harvester for letras.mus.br
//!
//! Fetches the gospel artist catalogue, filters out undesired material,
//! reconciles against a SQLite store and packages newly accepted lyrics
//! into a dated release archive.

pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod parse;
pub mod pipeline;
pub mod reconcile;
pub mod release;
pub mod scrape;

pub use crate::error::{Error, Result};
