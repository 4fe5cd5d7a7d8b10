// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for NPU queries.
//!
//! Parsing and per-field failures never show up here — they degrade to
//! dropped rows or `NaN` fields. Only an exhausted retry budget or an
//! unresolvable caller request is worth an error.

/// Errors surfaced by the query and selection API.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The retry wrapper ran out of attempts without finding a device.
    #[error(
        "could not find an available NPU after {attempts} attempts with {} seconds interval",
        .interval.as_secs()
    )]
    NoDeviceAvailable {
        attempts: u32,
        interval: std::time::Duration,
    },

    /// A selection-policy name was not recognized.
    #[error("unknown selection policy '{0}'; expected 'first', 'last', 'random', or 'by-free-hbm'")]
    UnknownPolicy(String),

    /// A display column name was not recognized.
    #[error("unknown display column '{0}'")]
    UnknownColumn(String),
}
