//! licence-gen - issue signed licences from the command line.
//!
//! Prints the licence details followed by the transport string on stdout.
//! Diagnostics and logs go to stderr. Exits with 1 on any failure.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Duration, Utc};
use clap::Parser;

use licence::config::{init_config, LicenceConfig};
use licence::errors::{LicenceError, LicenceResult};
use licence::logging::init_logging;
use licence::{keys, render, Licence};

const APP_TITLE: &str = "Netviper licence generator";

/// Issue a signed licence
#[derive(Parser, Debug)]
#[command(name = "licence-gen", about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Path to the hex-encoded PKCS#1 private key
    #[arg(long, value_name = "PATH")]
    key: Option<PathBuf>,

    /// Licence length in days, starting now
    #[arg(long, value_name = "DAYS", conflicts_with = "runduration")]
    duration: Option<i64>,

    /// Trial run period in minutes, starting at first verification
    #[arg(long, value_name = "MINUTES")]
    runduration: Option<i64>,

    /// Usage ceiling carried by the licence (0 = unlimited)
    #[arg(long, value_name = "N")]
    maxcount: Option<u64>,

    /// Configuration file (defaults to ./licence.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print version information
    #[arg(long)]
    version: bool,
}

/// Version number, build hash and build time.
fn version_str() -> String {
    format!(
        "{APP_TITLE} Version Information:\nVersion:\t{}\nBuild hash:\t{}\nBuild time:\t{}\n",
        env!("CARGO_PKG_VERSION"),
        option_env!("LICENCE_BUILD_HASH").unwrap_or("Not set"),
        option_env!("LICENCE_BUILD_TIME").unwrap_or("Not set"),
    )
}

/// Issue the licence described by `cli` and return the stdout text.
fn run(cli: &Cli, config: &LicenceConfig) -> LicenceResult<String> {
    let key_path = cli
        .key
        .clone()
        .or_else(|| config.issuer.key_path.as_ref().map(PathBuf::from))
        .ok_or_else(|| LicenceError::KeyError("private key path not specified".to_string()))?;
    let signer = keys::load_signer(&key_path)?;
    let max_count = cli.maxcount.unwrap_or(config.issuer.default_max_count);

    let licence = match cli.runduration {
        Some(minutes) if minutes > 0 => {
            let run_period = Duration::try_minutes(minutes).ok_or_else(|| {
                LicenceError::InvalidTerms(format!("run duration of {minutes} minutes is out of range"))
            })?;
            Licence::issue_trial(&signer, run_period, max_count)?
        }
        Some(_) => {
            return Err(LicenceError::InvalidTerms(
                "run duration must be a positive integer".to_string(),
            ))
        }
        None => {
            let days = cli.duration.unwrap_or(0);
            if days <= 0 {
                return Err(LicenceError::InvalidTerms(
                    "duration must be a positive integer".to_string(),
                ));
            }
            Licence::issue_for_days(&signer, Utc::now(), days, max_count)?
        }
    };

    let transport = licence.to_transport()?;
    Ok(format!("{}\nKey:\n{}", render(&licence), transport))
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if cli.version {
        eprintln!("{}", version_str());
        return ExitCode::SUCCESS;
    }

    let config = match init_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Could not load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Could not initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli, config) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Could not generate licence: {e}");
            ExitCode::FAILURE
        }
    }
}
