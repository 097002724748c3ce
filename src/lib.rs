//! `lunch_and_learn` - issue service client and schema migrator
//!
//! This crate provides the core functionality for the `lal` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`client`] - Blocking HTTP client for the issue service
//! - [`model`] - Data types (Issue, Priority)
//! - [`storage`] - `SQLite` schema migration, backups and seeding
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling
//! - [`format`] - Output formatting (table, JSON, simple) and CSV reading
//! - [`logging`] - `tracing` subscriber setup

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod model;
pub mod storage;

pub use error::{LalError, Result, StructuredError};
