//! Core logic for the subscription-info bot.
//!
//! Header scraping, usage classification and the query workflow live here.
//! Telegram and HTTP sit behind ports (traits) so the workflow can be tested
//! with in-memory fakes.

pub mod cleanup;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fetch;
pub mod formatting;
pub mod links;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod query;
pub mod render;
pub mod subscription;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
