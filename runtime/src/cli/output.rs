// Copyright 2026 Tankobon Contributors
// SPDX-License-Identifier: Apache-2.0

//! Output mode flags shared by all subcommands.
//!
//! `main` mirrors the global `--json`/`--quiet` flags into environment
//! variables so any command can check them without threading arguments.

pub const JSON_ENV: &str = "TANKOBON_JSON";
pub const QUIET_ENV: &str = "TANKOBON_QUIET";

pub fn is_json() -> bool {
    std::env::var_os(JSON_ENV).is_some()
}

pub fn is_quiet() -> bool {
    std::env::var_os(QUIET_ENV).is_some()
}

/// Pretty-print a JSON value on stdout.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to serialize output: {e}"),
    }
}
