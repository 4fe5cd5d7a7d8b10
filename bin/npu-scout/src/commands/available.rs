// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `npu-scout available` command: print ids of devices that pass the
//! availability thresholds, one per line.
//!
//! Only ids go to stdout, so the output composes with shell scripts
//! (`export ASCEND_RT_VISIBLE_DEVICES=$(npu-scout available)`).

use npu_query::{select, AvailabilityQuery, SelectionPolicy, SmiClient, SnapshotSource};

pub fn execute(
    client: &SmiClient,
    query: &AvailabilityQuery,
    policy: SelectionPolicy,
    limit: usize,
) -> anyhow::Result<()> {
    let ids = select(&client.snapshot(), query, policy, limit);

    if ids.is_empty() {
        tracing::info!("no NPU satisfies the availability thresholds");
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
