// SPDX-License-Identifier: PMPL-1.0-or-later

//! Logger setup.

use chrono::Utc;
use env_logger::{Builder, Env};
use std::io::Write;

/// Initialise `env_logger` with UTC timestamps. `RUST_LOG` overrides `level`.
pub fn init_logger(level: &str) {
    let _ = Builder::from_env(Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}

/// Pick the filter: `--verbose` beats the config file, which beats `info`.
pub fn level_for(verbose: bool, configured: Option<&str>) -> String {
    if verbose {
        return "debug".to_string();
    }
    match configured.map(str::to_lowercase).as_deref() {
        Some(level @ ("trace" | "debug" | "info" | "warn" | "error" | "off")) => level.to_string(),
        _ => "info".to_string(),
    }
}
