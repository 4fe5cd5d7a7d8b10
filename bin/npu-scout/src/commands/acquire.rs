// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `npu-scout acquire` command: poll until a device becomes available.
//!
//! Blocks the calling shell for up to `attempts × interval`; exhaustion
//! exits nonzero with the attempt budget in the message.

use npu_query::{first_available, AvailabilityQuery, SelectionPolicy, SmiClient};
use std::time::Duration;

pub fn execute(
    client: &SmiClient,
    query: &AvailabilityQuery,
    policy: SelectionPolicy,
    attempts: u32,
    interval: Duration,
) -> anyhow::Result<()> {
    let id = first_available(client, policy, query, attempts, interval)?;
    println!("{id}");
    Ok(())
}
