// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Civic - multi-tenant WhatsApp webhook engine for citizen services.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use civic_config::{CivicConfig, ConfigError};

/// Civic - multi-tenant WhatsApp webhook engine for citizen services.
#[derive(Parser, Debug)]
#[command(name = "civic", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server.
    Serve,
    /// Validate configuration and print a summary.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<CivicConfig, Vec<ConfigError>> {
    match path {
        Some(path) => civic_config::load_and_validate_path(path),
        None => civic_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            civic_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("civic: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            println!("{}", summary(&config));
        }
        None => {
            println!("civic: use --help for available commands");
        }
    }
}

fn summary(config: &CivicConfig) -> String {
    let active = config.tenants.iter().filter(|t| t.active).count();
    format!(
        "civic: configuration OK\n  listen: {}:{}{}\n  sessions: {:?}\n  tenants: {} ({} active)",
        config.gateway.host,
        config.gateway.port,
        config.gateway.webhook_path,
        config.session.backend,
        config.tenants.len(),
        active,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn summary_counts_active_tenants() {
        let config = civic_config::load_and_validate_str(
            r#"
[[tenants]]
id = "a"
name = "A"
channel_id = "PN1"

[[tenants]]
id = "b"
name = "B"
channel_id = "PN2"
active = false
"#,
        )
        .unwrap();
        let text = summary(&config);
        assert!(text.contains("tenants: 2 (1 active)"));
        assert!(text.contains("127.0.0.1:8080/webhook"));
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::parse_from(["civic", "--config", "x.toml", "check-config"]);
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
