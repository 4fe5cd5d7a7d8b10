// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Invocation of the vendor diagnostic tool.
//!
//! [`SmiClient`] spawns `npu-smi info`, reads its stdout, and hands the
//! text to the scanner. A missing or failing tool is a *soft* failure:
//! the snapshot is simply empty, because "no devices visible" is the
//! honest answer on a host without the driver stack.
//!
//! Selection logic depends on [`SnapshotSource`] rather than on the
//! client directly, so tests (and alternative collectors) can supply
//! canned records.

use crate::record::records_from_report;
use crate::NpuRecord;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Default diagnostic command; resolved through `PATH`.
const SMI_COMMAND: &str = "npu-smi";

/// Anything that can produce a point-in-time set of device records.
pub trait SnapshotSource {
    /// Takes a fresh snapshot. Implementations must not cache.
    fn snapshot(&self) -> Vec<NpuRecord>;
}

/// Snapshot source backed by the `npu-smi` command-line tool.
#[derive(Debug, Clone)]
pub struct SmiClient {
    command: PathBuf,
}

impl SmiClient {
    /// Client for the `npu-smi` found on `PATH`.
    pub fn new() -> Self {
        Self::with_command(SMI_COMMAND)
    }

    /// Client for an explicit binary (absolute path or alternate name).
    pub fn with_command(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The binary this client invokes.
    pub fn command(&self) -> &Path {
        &self.command
    }
}

impl Default for SmiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for SmiClient {
    /// Runs `<command> info` and parses the output.
    ///
    /// Blocks until the child exits; no timeout is applied, so a wedged
    /// tool wedges the caller. The exit status is ignored — whatever
    /// device table made it to stdout is still worth parsing.
    fn snapshot(&self) -> Vec<NpuRecord> {
        let output = match Command::new(&self.command).arg("info").output() {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(
                    "failed to run '{} info': {e}; reporting no devices",
                    self.command.display()
                );
                return Vec::new();
            }
        };

        let text = String::from_utf8_lossy(&output.stdout);
        records_from_report(&text)
    }
}
