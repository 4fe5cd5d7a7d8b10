// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Threshold-based availability filtering.
//!
//! A device is available when its free HBM, HBM utilization, and AI-Core
//! load all pass the caller's thresholds and it is not explicitly
//! excluded. Unreported metrics are `NaN`, and every comparison against
//! `NaN` is false — so by default a device with an unsupported metric is
//! *not* available. Callers that want such devices anyway opt in with
//! [`AvailabilityQuery::include_nan`].

use crate::NpuRecord;
use std::collections::HashSet;

/// Resource thresholds and exclusions for availability checks.
///
/// The exclusion sets are owned by each query value and default to empty;
/// build one with `AvailabilityQuery::default()` and override the fields
/// you care about.
#[derive(Debug, Clone)]
pub struct AvailabilityQuery {
    /// Maximum AI-Core load as a fraction in `[0.0, 1.0]`. The device's
    /// percentage reading must be strictly below `max_core_load * 100`.
    pub max_core_load: f64,
    /// Maximum HBM utilization as a fraction in `[0.0, 1.0]`, strict.
    pub max_hbm_util: f64,
    /// Minimum free HBM in megabytes.
    pub min_hbm_free_mb: f64,
    /// Treat `NaN` AI-Core and HBM-utilization readings as passing their
    /// threshold checks.
    pub include_nan: bool,
    /// Device ids that must never be selected.
    pub excluded_ids: HashSet<u32>,
    /// Bus ids that must never be selected (stable across reboots).
    pub excluded_bus_ids: HashSet<String>,
}

impl Default for AvailabilityQuery {
    fn default() -> Self {
        Self {
            max_core_load: 0.5,
            max_hbm_util: 0.5,
            min_hbm_free_mb: 0.0,
            include_nan: false,
            excluded_ids: HashSet::new(),
            excluded_bus_ids: HashSet::new(),
        }
    }
}

/// Returns a boolean mask aligned positionally with `records`.
pub fn availability_mask(records: &[NpuRecord], query: &AvailabilityQuery) -> Vec<bool> {
    records.iter().map(|npu| is_available(npu, query)).collect()
}

/// Checks a single record against the query thresholds.
pub fn is_available(npu: &NpuRecord, query: &AvailabilityQuery) -> bool {
    let core_ok = npu.aicore_percent < query.max_core_load * 100.0
        || (query.include_nan && npu.aicore_percent.is_nan());

    let ratio = npu.hbm_util_ratio();
    let hbm_ok = ratio < query.max_hbm_util || (query.include_nan && ratio.is_nan());

    npu.hbm_free_mb() >= query.min_hbm_free_mb
        && core_ok
        && hbm_ok
        && !query.excluded_ids.contains(&npu.id)
        && !query.excluded_bus_ids.contains(&npu.bus_id)
}
