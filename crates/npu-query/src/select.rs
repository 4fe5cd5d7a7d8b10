// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Policy-based ordering and selection of available devices.

use crate::availability::{availability_mask, AvailabilityQuery};
use crate::{NpuRecord, QueryError};
use rand::seq::SliceRandom;

/// How the filtered candidate set is ordered before truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Lowest device id first.
    First,
    /// Highest device id first.
    Last,
    /// Uniformly random order.
    Random,
    /// Least-utilized HBM first; devices with an unreported ratio sort last.
    ByFreeHbm,
}

impl SelectionPolicy {
    /// Canonical name, accepted back by [`FromStr`](std::str::FromStr).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Random => "random",
            Self::ByFreeHbm => "by-free-hbm",
        }
    }
}

impl std::str::FromStr for SelectionPolicy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "random" => Ok(Self::Random),
            // "memory" is the historical name for this order.
            "by-free-hbm" | "memory" => Ok(Self::ByFreeHbm),
            other => Err(QueryError::UnknownPolicy(other.to_string())),
        }
    }
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters `records` against `query`, orders the candidates per `policy`,
/// and returns at most `limit` device ids in final order.
///
/// Asking for more devices than are available is not an error — you get
/// the ones that exist.
pub fn select(
    records: &[NpuRecord],
    query: &AvailabilityQuery,
    policy: SelectionPolicy,
    limit: usize,
) -> Vec<u32> {
    let mask = availability_mask(records, query);
    let mut candidates: Vec<&NpuRecord> = records
        .iter()
        .zip(&mask)
        .filter(|(_, available)| **available)
        .map(|(npu, _)| npu)
        .collect();

    order_candidates(&mut candidates, policy);
    candidates.into_iter().take(limit).map(|npu| npu.id).collect()
}

fn order_candidates(candidates: &mut [&NpuRecord], policy: SelectionPolicy) {
    match policy {
        SelectionPolicy::First => candidates.sort_by_key(|npu| npu.id),
        SelectionPolicy::Last => candidates.sort_by(|a, b| b.id.cmp(&a.id)),
        SelectionPolicy::Random => candidates.shuffle(&mut rand::thread_rng()),
        SelectionPolicy::ByFreeHbm => candidates.sort_by(|a, b| {
            nan_last(a.hbm_util_ratio()).total_cmp(&nan_last(b.hbm_util_ratio()))
        }),
    }
}

/// Sort key that pushes unreported ratios to the end of an ascending order.
fn nan_last(v: f64) -> f64 {
    if v.is_nan() {
        f64::INFINITY
    } else {
        v
    }
}
