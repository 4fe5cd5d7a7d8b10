// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `npu-scout list` command: print a utilization table.

use npu_query::{display, Column, SmiClient, SnapshotSource};

pub fn execute(client: &SmiClient, wide: bool, columns: Option<&str>) -> anyhow::Result<()> {
    let columns: Vec<Column> = match columns {
        Some(spec) => spec
            .split(',')
            .map(|name| name.trim().parse())
            .collect::<Result<_, _>>()?,
        None if wide => display::wide_columns(),
        None => display::compact_columns(),
    };

    let devices = client.snapshot();
    if devices.is_empty() {
        println!(
            "No NPUs visible to '{}'. Is the driver stack installed?",
            client.command().display()
        );
        return Ok(());
    }

    print!("{}", display::render_utilization(&devices, &columns));
    Ok(())
}
