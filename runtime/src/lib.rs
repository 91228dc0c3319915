// Copyright 2026 Tankobon Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tankobon runtime library: a pluggable content-retrieval client.
//!
//! Site modules implement [`provider::Provider`]; the engine supplies
//! fetching, on-disk caching, retries, the headless-browser fallback and
//! ordered picture downloads.

#![allow(clippy::new_without_default)]

pub mod acquisition;
pub mod cache;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod model;
pub mod provider;
pub mod renderer;

pub use error::{FetchError, Result};
