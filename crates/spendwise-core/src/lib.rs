//! Core domain + application logic for the SpendWise Telegram bridge.
//!
//! This crate is intentionally framework-agnostic. Telegram and the SpendWise
//! HTTP backend live behind ports (traits) implemented in adapter crates.

pub mod backend;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod expense;
pub mod formatting;
pub mod identity;
pub mod logging;
pub mod messaging;
pub mod security;
pub mod service;

pub use errors::{Error, Result};
