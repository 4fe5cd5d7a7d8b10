// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scanner for the `npu-smi info` device table.
//!
//! The tool prints one device per *two* physical lines, wrapped in a
//! pipe-and-border ASCII frame:
//!
//! ```text
//! +===========================+===============+==============================================+
//! | 0     910B                | OK            | 65.0        32              0/0              |
//! | 910B                      | 0000:01:00.0  | 12          5               1024/ 32768      |
//! +===========================+===============+==============================================+
//! ```
//!
//! Scanning starts after the first `===` separator and stops at the
//! process-listing section (`Process id`). Border and blank lines are
//! skipped without advancing the two-line cursor. A pair that does not
//! match the expected shape is dropped and counted — the scanner itself
//! never fails, so a format drift in the vendor tool degrades to an
//! empty or truncated row set instead of an error.

/// One device row flattened to its 12 raw string fields, in table order.
///
/// All fields are trimmed but otherwise unconverted; numeric conversion
/// (including the NaN fallback for placeholder text) happens in
/// [`crate::NpuRecord::from_raw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub id: String,
    pub kind: String,
    pub health: String,
    pub power: String,
    pub temperature: String,
    pub hugepages: String,
    pub chip: String,
    pub bus_id: String,
    pub aicore: String,
    pub memory_util: String,
    pub hbm_used: String,
    pub hbm_total: String,
}

/// Result of scanning one report: the rows that matched, plus a count of
/// two-line pairs that were dropped as malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportScan {
    pub rows: Vec<RawRow>,
    pub skipped_pairs: usize,
}

/// Scans raw `npu-smi info` output into flat device rows.
///
/// If the text contains no `===` separator at all, scanning starts at the
/// first line — the row-shape requirements below reject anything that is
/// not a device pair anyway.
pub fn scan(text: &str) -> ReportScan {
    let lines: Vec<&str> = text.lines().collect();

    let mut i = lines
        .iter()
        .position(|l| l.contains("==="))
        .map(|p| p + 1)
        .unwrap_or(0);

    let mut rows = Vec::new();
    let mut skipped_pairs = 0usize;

    while i < lines.len() {
        let line = lines[i].trim();

        // Everything after the process table is unrelated output.
        if line.contains("Process id") {
            break;
        }

        // Border and blank lines sit between device pairs; device data
        // lines never contain '+' or '='.
        if line.is_empty() || line.contains('+') || line.contains('=') {
            i += 1;
            continue;
        }

        let Some(second) = lines.get(i + 1) else {
            // First line of a pair with no second line: truncated table.
            skipped_pairs += 1;
            break;
        };

        match parse_pair(lines[i], second) {
            Some(row) => rows.push(row),
            None => {
                skipped_pairs += 1;
                tracing::debug!("dropping malformed device block at line {i}");
            }
        }
        i += 2;
    }

    ReportScan { rows, skipped_pairs }
}

/// Extracts the 12 fields from one two-line device block, or `None` if
/// either line lacks the expected pipe segments or tokens.
fn parse_pair(first: &str, second: &str) -> Option<RawRow> {
    let first: Vec<&str> = first.split('|').collect();
    let second: Vec<&str> = second.split('|').collect();
    if first.len() < 4 || second.len() < 4 {
        return None;
    }

    // Line one: "| <id> <name> | <health> | <power> <temp> <hugepages> |"
    let mut name_tokens = first[1].split_whitespace();
    let id = name_tokens.next()?;
    let kind = name_tokens.next()?;
    let health = first[2].trim();
    let readings: Vec<&str> = first[3].split_whitespace().collect();
    let power = *readings.first()?;
    let temperature = *readings.get(1)?;
    // Hugepages print as "used/total"; only the used count matters here.
    let hugepages = readings.last()?.split('/').next()?.trim();

    // Line two: "| <chip> | <bus id> | <aicore> <memory> <hbm used/total> |"
    let chip = second[1].split_whitespace().next()?;
    let bus_id = second[2].trim();
    let gauges: Vec<&str> = second[3].split_whitespace().collect();
    let aicore = *gauges.first()?;
    let memory_util = *gauges.get(1)?;
    let hbm_used = gauges
        .get(gauges.len().checked_sub(2)?)?
        .trim()
        .trim_matches('/');
    let hbm_total = gauges.last()?.trim();

    Some(RawRow {
        id: id.to_string(),
        kind: kind.to_string(),
        health: health.to_string(),
        power: power.to_string(),
        temperature: temperature.to_string(),
        hugepages: hugepages.to_string(),
        chip: chip.to_string(),
        bus_id: bus_id.to_string(),
        aicore: aicore.to_string(),
        memory_util: memory_util.to_string(),
        hbm_used: hbm_used.to_string(),
        hbm_total: hbm_total.to_string(),
    })
}
