mod config;
mod error;
mod exec;
mod identity;
mod logging;
mod platform;
mod probe;
mod strategy;
mod truststore;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use exec::{CommandRunner, DryRunRunner, SystemRunner};
use logging::LogLevel;
use probe::SystemProber;
use strategy::TrustAnchorStrategy;
use truststore::{Placement, Truststore};

/// trustanchor - install a local development root CA into the system trust store
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Configuration file path (default: ~/.config/trustanchor/config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the commands that would run instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Override the configured log level (error, info, debug)
    #[arg(long, global = true, value_parser = LogLevel::parse)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add the PEM root certificate to the system trust store
    Install {
        /// PEM-encoded root certificate
        cert: PathBuf,
    },
    /// Remove the PEM root certificate (and any legacy copy) from the system trust store
    Uninstall {
        /// PEM-encoded root certificate
        cert: PathBuf,
    },
    /// Show which trust layout this host uses, and where a certificate would go
    Strategy {
        /// PEM-encoded root certificate
        cert: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    logging::init(cli.log_level.unwrap_or(config.log_level));
    logging::debug(
        "CONFIG",
        &format!(
            "loaded anchors={} elevation={}",
            config.anchors.len(),
            config.elevation.as_str()
        ),
    );

    let result = if cli.dry_run {
        run(&cli.command, config.anchors, DryRunRunner)
    } else {
        run(
            &cli.command,
            config.anchors,
            SystemRunner::new(config.elevation),
        )
    };

    if let Err(err) = &result {
        logging::error(
            "TRUST",
            &format!("command={} status=failed err={:#}", cli.command.name(), err),
        );
    }
    result
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Install { .. } => "install",
            Self::Uninstall { .. } => "uninstall",
            Self::Strategy { .. } => "strategy",
        }
    }
}

fn run<R: CommandRunner>(
    command: &Command,
    anchors: Vec<strategy::AnchorCandidate>,
    runner: R,
) -> Result<()> {
    let store = Truststore::new(anchors, SystemProber, runner);

    match command {
        Command::Install { cert } => {
            let installed = store
                .install(cert)
                .with_context(|| format!("failed to install {}", cert.display()))?;
            println!("trustanchor: installed {}", installed.display());
        }
        Command::Uninstall { cert } => {
            let report = store
                .uninstall(cert)
                .with_context(|| format!("failed to uninstall {}", cert.display()))?;
            println!("trustanchor: removed {}", report.removed.display());
            if let Some(legacy) = report.legacy_removed {
                println!("trustanchor: removed legacy {}", legacy.display());
            }
        }
        Command::Strategy { cert } => print_strategy(&store, cert.as_deref())?,
    }

    Ok(())
}

fn print_strategy<R: CommandRunner>(
    store: &Truststore<SystemProber, R>,
    cert: Option<&Path>,
) -> Result<()> {
    let report = match cert {
        None => describe_strategy(&store.strategy()?, None),
        Some(cert) => {
            let placement = store
                .locate(cert)
                .with_context(|| format!("failed to locate {}", cert.display()))?;
            describe_strategy(&placement.strategy, Some(&placement))
        }
    };
    print!("{}", report);
    Ok(())
}

fn describe_strategy(strategy: &TrustAnchorStrategy, placement: Option<&Placement>) -> String {
    let mut lines = vec![
        "trustanchor: trust layout".to_string(),
        format!("  pattern : {}", strategy.roots_pattern()),
        format!("  refresh : {}", strategy.refresh_command().join(" ")),
    ];
    if let Some(placement) = placement {
        lines.push(format!("  serial  : {}", placement.identity.serial_number()));
        lines.push(format!("  target  : {}", placement.target.display()));
        lines.push(format!("  legacy  : {}", placement.legacy.display()));
    }
    lines.join("\n") + "\n"
}
