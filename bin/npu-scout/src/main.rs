// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # npu-scout
//!
//! Command-line interface for NPU utilization reporting and selection.
//!
//! ## Usage
//! ```bash
//! # Utilization table for all visible NPUs
//! npu-scout list --wide
//!
//! # Ids of devices below 50% core load and 50% HBM utilization
//! npu-scout available --limit 4
//!
//! # Block until a device frees up (12 attempts, 5 minutes apart)
//! npu-scout acquire --policy by-free-hbm --attempts 12 --interval-secs 300
//! ```

mod commands;
mod config;

use clap::{Args, Parser, Subcommand};
use config::ScoutConfig;
use npu_query::{AvailabilityQuery, SelectionPolicy, SmiClient};

#[derive(Parser)]
#[command(
    name = "npu-scout",
    about = "Utilization reporting and availability-based selection for Ascend NPUs",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file with default thresholds.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Diagnostic binary to invoke instead of `npu-smi` on PATH.
    #[arg(long, global = true, value_name = "PATH")]
    smi_command: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a utilization table for all visible NPUs.
    List {
        /// Show the full column set (type, chip, bus id, power, HBM detail).
        #[arg(short, long)]
        wide: bool,

        /// Comma-separated column list (overrides --wide), e.g.
        /// "id,power,temperature,hbm-util".
        #[arg(long, value_name = "COLS")]
        columns: Option<String>,
    },

    /// Print the ids of devices that satisfy the availability thresholds.
    Available {
        #[command(flatten)]
        thresholds: ThresholdArgs,

        /// Selection policy: first, last, random, by-free-hbm.
        #[arg(short, long)]
        policy: Option<String>,

        /// Maximum number of device ids to print.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Poll until a device becomes available and print its id.
    Acquire {
        #[command(flatten)]
        thresholds: ThresholdArgs,

        /// Selection policy: first, last, random, by-free-hbm.
        #[arg(short, long)]
        policy: Option<String>,

        /// Number of attempts before giving up.
        #[arg(long)]
        attempts: Option<u32>,

        /// Seconds to sleep between attempts.
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

/// Availability thresholds shared by `available` and `acquire`.
#[derive(Args)]
struct ThresholdArgs {
    /// Maximum AI-Core load ratio (0.0-1.0).
    #[arg(long)]
    max_core_load: Option<f64>,

    /// Maximum HBM utilization ratio (0.0-1.0).
    #[arg(long)]
    max_hbm_util: Option<f64>,

    /// Minimum free HBM in megabytes.
    #[arg(long)]
    min_hbm_free: Option<f64>,

    /// Treat NaN readings (unsupported metrics) as available.
    #[arg(long)]
    include_nan: bool,

    /// Device id to exclude (repeatable).
    #[arg(long = "exclude-id", value_name = "ID")]
    exclude_ids: Vec<u32>,

    /// Bus id to exclude (repeatable).
    #[arg(long = "exclude-bus-id", value_name = "BUS_ID")]
    exclude_bus_ids: Vec<String>,
}

impl ThresholdArgs {
    /// Applies flag overrides on top of the configured defaults.
    fn resolve(&self, config: &ScoutConfig) -> AvailabilityQuery {
        let mut query = config.availability_query();
        if let Some(v) = self.max_core_load {
            query.max_core_load = v;
        }
        if let Some(v) = self.max_hbm_util {
            query.max_hbm_util = v;
        }
        if let Some(v) = self.min_hbm_free {
            query.min_hbm_free_mb = v;
        }
        if self.include_nan {
            query.include_nan = true;
        }
        query.excluded_ids.extend(self.exclude_ids.iter().copied());
        query
            .excluded_bus_ids
            .extend(self.exclude_bus_ids.iter().cloned());
        query
    }
}

fn resolve_policy(flag: Option<&str>, config: &ScoutConfig) -> anyhow::Result<SelectionPolicy> {
    match flag {
        Some(name) => Ok(name.parse()?),
        None => Ok(config.selection_policy()?),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => ScoutConfig::from_file(path)?,
        None => ScoutConfig::default(),
    };

    let command = cli
        .smi_command
        .or_else(|| config.smi_command.clone())
        .unwrap_or_else(|| "npu-smi".into());
    let client = SmiClient::with_command(command);

    match cli.command {
        Commands::List { wide, columns } => {
            commands::list::execute(&client, wide, columns.as_deref())
        }
        Commands::Available {
            thresholds,
            policy,
            limit,
        } => {
            let query = thresholds.resolve(&config);
            let policy = resolve_policy(policy.as_deref(), &config)?;
            commands::available::execute(&client, &query, policy, limit.unwrap_or(config.limit))
        }
        Commands::Acquire {
            thresholds,
            policy,
            attempts,
            interval_secs,
        } => {
            let query = thresholds.resolve(&config);
            let policy = resolve_policy(policy.as_deref(), &config)?;
            let attempts = attempts.unwrap_or(config.attempts);
            let interval = interval_secs
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| config.interval());
            commands::acquire::execute(&client, &query, policy, attempts, interval)
        }
    }
}
