// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # npu-query
//!
//! Queries utilization statistics for Ascend NPUs by invoking the vendor
//! `npu-smi` diagnostic tool, parsing its two-line-per-device table
//! output, and selecting devices that satisfy resource thresholds.
//!
//! # Reported Metrics
//! - **AI-Core load** — percentage load on the compute cores.
//! - **HBM usage** — used/total onboard memory, the metric that decides
//!   whether a workload fits.
//! - **Power, temperature, hugepages** — informational readings.
//!
//! # Graceful Degradation
//! One snapshot is one blocking `npu-smi info` invocation. A missing
//! tool, a malformed table, or a placeholder metric never raises: the
//! snapshot comes back empty, the row is dropped, or the field is `NaN`.
//! The only hard errors are an exhausted retry budget and unresolvable
//! caller input ([`QueryError`]).
//!
//! # Example
//! ```no_run
//! use npu_query::{AvailabilityQuery, SelectionPolicy};
//!
//! for npu in npu_query::list_devices() {
//!     println!("NPU {}: {:.0}% HBM used", npu.id, npu.hbm_util_ratio() * 100.0);
//! }
//!
//! // Pick the least-loaded device with at least 8 GB of HBM free.
//! let query = AvailabilityQuery {
//!     min_hbm_free_mb: 8192.0,
//!     ..Default::default()
//! };
//! let ids = npu_query::list_available(SelectionPolicy::ByFreeHbm, 1, &query);
//! ```

mod acquire;
mod availability;
mod client;
mod error;
mod record;
mod select;
pub mod display;
pub mod table;

pub use acquire::first_available;
pub use availability::{availability_mask, is_available, AvailabilityQuery};
pub use client::{SmiClient, SnapshotSource};
pub use display::{compact_columns, render_utilization, wide_columns, Column};
pub use error::QueryError;
pub use record::{records_from_report, NpuRecord};
pub use select::{select, SelectionPolicy};
pub use table::{RawRow, ReportScan};

use std::time::Duration;

/// Takes one snapshot with the default `npu-smi` client.
///
/// Returns an empty vec when the tool is missing or its output is
/// unparsable.
pub fn list_devices() -> Vec<NpuRecord> {
    SmiClient::new().snapshot()
}

/// Snapshots the default client and returns up to `limit` available
/// device ids, ordered per `policy`.
pub fn list_available(
    policy: SelectionPolicy,
    limit: usize,
    query: &AvailabilityQuery,
) -> Vec<u32> {
    select(&list_devices(), query, policy, limit)
}

/// Polls the default client until a device passes `query`, sleeping
/// `interval` between attempts.
///
/// See [`first_available`] for the source-parameterized form.
pub fn find_first_available(
    policy: SelectionPolicy,
    query: &AvailabilityQuery,
    attempts: u32,
    interval: Duration,
) -> Result<u32, QueryError> {
    first_available(&SmiClient::new(), policy, query, attempts, interval)
}

/// Snapshots the default client and renders a utilization table with the
/// given columns.
pub fn utilization_table(columns: &[Column]) -> String {
    render_utilization(&list_devices(), columns)
}
