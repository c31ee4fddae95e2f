//! ditop - live database health monitor library.
//!
//! This library provides the core functionality shared between:
//! - `ditop` - interactive terminal dashboard
//! - `ditopd` - headless frame recorder
//! - `ditop-report` - frame log summary

pub mod collector;
pub mod config;
pub mod fmt;
pub mod provider;
pub mod rates;
pub mod report;
pub mod storage;
#[cfg(feature = "tui")]
pub mod tui;
