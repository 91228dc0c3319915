// Copyright 2026 Tankobon Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "tankobon=debug"
    } else {
        "tankobon=info"
    }
}

/// Install the global subscriber. Logs go to stderr.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(verbose: bool, json: bool, no_color: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "tankobon=info");
        assert_eq!(default_directive(true), "tankobon=debug");
        assert!(default_directive(true).parse::<tracing_subscriber::filter::Directive>().is_ok());
    }
}
