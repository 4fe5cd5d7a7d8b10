// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Polling acquisition of a single available device.
//!
//! Hardware availability changes externally and slowly, so this is a
//! plain blocking attempt/sleep loop — up to `attempts × interval` of
//! wall-clock time on the calling thread. Callers that need cancellation
//! must wrap the call with their own timeout handling.

use crate::availability::AvailabilityQuery;
use crate::client::SnapshotSource;
use crate::select::{select, SelectionPolicy};
use crate::QueryError;
use std::time::Duration;

/// Repeatedly snapshots `source` until one device passes `query`, or the
/// attempt budget runs out.
///
/// Sleeps `interval` between failed attempts (never after the last one)
/// and returns [`QueryError::NoDeviceAvailable`] on exhaustion.
pub fn first_available<S: SnapshotSource>(
    source: &S,
    policy: SelectionPolicy,
    query: &AvailabilityQuery,
    attempts: u32,
    interval: Duration,
) -> Result<u32, QueryError> {
    for attempt in 1..=attempts {
        tracing::info!("attempt {attempt}/{attempts}: looking for an available NPU");

        let found = select(&source.snapshot(), query, policy, 1);
        if let Some(&id) = found.first() {
            tracing::info!("NPU {id} located");
            return Ok(id);
        }

        if attempt != attempts {
            std::thread::sleep(interval);
        }
    }

    Err(QueryError::NoDeviceAvailable { attempts, interval })
}
