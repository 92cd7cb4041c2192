// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! mtmod CLI - load a CommonJS-style module tree from a directory or URL

mod config;
mod host;

use clap::Parser;
use config::Config;
use mtmod_loader::Value;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mtmod",
    about = "Dependency-ordered CommonJS-style module loader",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Entry module identifier, without suffix
    entry: Option<String>,

    /// Module base directory or http(s) URL
    #[arg(short, long)]
    base: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Start loading without waiting for the base to become available
    #[arg(long)]
    no_wait: bool,

    /// Seconds to wait for the base before giving up
    #[arg(long, value_name = "SECS")]
    ready_timeout: Option<u64>,

    /// Suffix appended to module names
    #[arg(long)]
    suffix: Option<String>,

    /// Config file (defaults to ./mtmod.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the entry module's exports as JSON
    #[arg(long)]
    print_exports: bool,
}

impl Cli {
    /// Layer CLI flags over file and environment configuration
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(entry) = self.entry {
            config.entry = Some(entry);
        }
        if let Some(base) = self.base {
            config.base = base;
        }
        if let Some(secs) = self.ready_timeout {
            config.ready_timeout = secs;
        }
        if let Some(suffix) = self.suffix {
            config.suffix = suffix;
        }
        config.debug |= self.debug;
        config.print_exports |= self.print_exports;
        if self.no_wait {
            config.wait_for_ready = false;
        }

        Ok(config)
    }
}

fn init_logging(debug: bool) {
    let default = if debug {
        "mtmod=debug,mtmod_loader=debug"
    } else {
        "mtmod=warn,mtmod_loader=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(err: &anyhow::Error) -> ! {
    tracing::error!("{:#}", err);
    eprintln!("{}: {:#}", "Error".red().bold(), err);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    init_logging(config.debug);
    for warning in config.take_warnings() {
        tracing::warn!("{}", warning);
    }

    match host::run(&config).await {
        Ok(exports) => {
            if config.print_exports {
                let json = Value::Object(exports).to_json();
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }
        Err(e) => fail(&e),
    }

    Ok(())
}
