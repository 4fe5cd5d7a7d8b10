// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Utilization table rendering.
//!
//! Columns form a closed set: each [`Column`] variant carries an accessor
//! into [`NpuRecord`] plus its formatting metadata (label, unit suffix,
//! scale, precision). There is no by-name field lookup at render time —
//! an unknown column name can only enter through [`Column::from_str`],
//! where it is a hard [`QueryError::UnknownColumn`].

use crate::{NpuRecord, QueryError};

/// A renderable device attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Kind,
    Chip,
    BusId,
    Health,
    Power,
    Temperature,
    Hugepages,
    AiCore,
    MemoryUtil,
    HbmUtil,
    HbmUsed,
    HbmTotal,
    HbmFree,
}

/// A cell value pulled out of a record, typed by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(u64),
    Float(f64),
    Text(String),
}

/// Formatting metadata for one column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    /// Header label.
    pub label: &'static str,
    /// Unit suffix appended to every cell (may be empty).
    pub suffix: &'static str,
    /// Multiplier applied to float values before formatting (ratios
    /// render as percentages with a scale of 100).
    pub scale: f64,
    /// Digits after the decimal point for float values.
    pub precision: usize,
}

impl Column {
    /// Every column, in the order the wide table shows them.
    pub const ALL: [Column; 14] = [
        Column::Id,
        Column::Kind,
        Column::Chip,
        Column::BusId,
        Column::Health,
        Column::Power,
        Column::Temperature,
        Column::Hugepages,
        Column::AiCore,
        Column::MemoryUtil,
        Column::HbmUtil,
        Column::HbmUsed,
        Column::HbmTotal,
        Column::HbmFree,
    ];

    /// Canonical name, accepted back by [`FromStr`](std::str::FromStr).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Kind => "kind",
            Self::Chip => "chip",
            Self::BusId => "bus-id",
            Self::Health => "health",
            Self::Power => "power",
            Self::Temperature => "temperature",
            Self::Hugepages => "hugepages",
            Self::AiCore => "aicore",
            Self::MemoryUtil => "memory-util",
            Self::HbmUtil => "hbm-util",
            Self::HbmUsed => "hbm-used",
            Self::HbmTotal => "hbm-total",
            Self::HbmFree => "hbm-free",
        }
    }

    /// Formatting metadata for this column.
    pub fn spec(&self) -> ColumnSpec {
        match self {
            Self::Id => spec("ID", "", 1.0, 0),
            Self::Kind => spec("Type", "", 1.0, 0),
            Self::Chip => spec("Chip", "", 1.0, 0),
            Self::BusId => spec("BusID", "", 1.0, 0),
            Self::Health => spec("Health", "", 1.0, 0),
            Self::Power => spec("Power", "W", 1.0, 0),
            Self::Temperature => spec("Temp", "C", 1.0, 0),
            Self::Hugepages => spec("Hugepages", "", 1.0, 0),
            Self::AiCore => spec("AI-Core", "%", 1.0, 0),
            Self::MemoryUtil => spec("Mem", "MB", 1.0, 0),
            Self::HbmUtil => spec("HBM util.", "%", 100.0, 0),
            Self::HbmUsed => spec("HBM used", "MB", 1.0, 0),
            Self::HbmTotal => spec("HBM total", "MB", 1.0, 0),
            Self::HbmFree => spec("HBM free", "MB", 1.0, 0),
        }
    }

    /// Pulls this column's value out of a record.
    pub fn value(&self, npu: &NpuRecord) -> CellValue {
        match self {
            Self::Id => CellValue::Int(u64::from(npu.id)),
            Self::Kind => CellValue::Text(npu.kind.clone()),
            Self::Chip => CellValue::Text(npu.chip.clone()),
            Self::BusId => CellValue::Text(npu.bus_id.clone()),
            Self::Health => CellValue::Text(npu.health.clone()),
            Self::Power => CellValue::Float(npu.power_watts),
            Self::Temperature => CellValue::Float(npu.temperature_c),
            Self::Hugepages => CellValue::Float(npu.hugepages),
            Self::AiCore => CellValue::Float(npu.aicore_percent),
            Self::MemoryUtil => CellValue::Float(npu.memory_util),
            Self::HbmUtil => CellValue::Float(npu.hbm_util_ratio()),
            Self::HbmUsed => CellValue::Float(npu.hbm_used_mb),
            Self::HbmTotal => CellValue::Float(npu.hbm_total_mb),
            Self::HbmFree => CellValue::Float(npu.hbm_free_mb()),
        }
    }

    /// Formats one cell, suffix included.
    fn format(&self, npu: &NpuRecord) -> String {
        let spec = self.spec();
        match self.value(npu) {
            CellValue::Int(v) => format!("{v}{}", spec.suffix),
            CellValue::Float(v) => {
                format!("{:.*}{}", spec.precision, v * spec.scale, spec.suffix)
            }
            CellValue::Text(v) => format!("{v}{}", spec.suffix),
        }
    }

    /// Text cells align left, numeric cells align right.
    fn aligns_right(&self) -> bool {
        !matches!(self, Self::Kind | Self::Chip | Self::BusId | Self::Health)
    }
}

fn spec(label: &'static str, suffix: &'static str, scale: f64, precision: usize) -> ColumnSpec {
    ColumnSpec {
        label,
        suffix,
        scale,
        precision,
    }
}

impl std::str::FromStr for Column {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_lowercase();
        Column::ALL
            .iter()
            .find(|c| c.as_str() == name)
            .copied()
            .ok_or_else(|| QueryError::UnknownColumn(s.to_string()))
    }
}

/// The compact default column set: id, core load, HBM utilization.
pub fn compact_columns() -> Vec<Column> {
    vec![Column::Id, Column::AiCore, Column::HbmUtil]
}

/// The wide column set: identity, power, and the full HBM breakdown.
pub fn wide_columns() -> Vec<Column> {
    vec![
        Column::Id,
        Column::Kind,
        Column::Chip,
        Column::BusId,
        Column::Power,
        Column::HbmUtil,
        Column::AiCore,
        Column::HbmTotal,
        Column::HbmUsed,
        Column::HbmFree,
    ]
}

/// Renders a utilization table with one line per device.
///
/// Column widths are fitted to the widest cell (header included); the
/// exact spacing is presentation, not contract.
pub fn render_utilization(records: &[NpuRecord], columns: &[Column]) -> String {
    let cells: Vec<Vec<String>> = records
        .iter()
        .map(|npu| columns.iter().map(|c| c.format(npu)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(column.spec().label.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();

    for (column, &width) in columns.iter().zip(&widths) {
        out.push_str(&format!("| {:<width$} ", column.spec().label));
    }
    out.push_str("|\n");

    let rule_len = out.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');

    for row in &cells {
        for ((column, &width), cell) in columns.iter().zip(&widths).zip(row) {
            if column.aligns_right() {
                out.push_str(&format!("| {cell:>width$} "));
            } else {
                out.push_str(&format!("| {cell:<width$} "));
            }
        }
        out.push_str("|\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<NpuRecord> {
        vec![
            NpuRecord::synthetic(0, 12.0, 1024.0, 32768.0),
            NpuRecord::synthetic(1, 88.0, 30000.0, 32768.0),
        ]
    }

    #[test]
    fn test_render_contains_labels_and_values() {
        let table = render_utilization(&sample(), &compact_columns());
        assert!(table.contains("ID"));
        assert!(table.contains("AI-Core"));
        assert!(table.contains("HBM util."));
        assert!(table.contains("12%"));
        assert!(table.contains("88%"));
    }

    #[test]
    fn test_ratio_renders_as_percentage() {
        // 1024 / 32768 = 0.03125 → "3%" at precision 0.
        let table = render_utilization(&sample(), &[Column::HbmUtil]);
        assert!(table.contains("3%"));
        assert!(table.contains("92%"));
    }

    #[test]
    fn test_wide_set_includes_identity_and_hbm_detail() {
        let table = render_utilization(&sample(), &wide_columns());
        assert!(table.contains("BusID"));
        assert!(table.contains("0000:00:00.0"));
        assert!(table.contains("65W"));
        assert!(table.contains("32768MB"));
        assert!(table.contains("31744MB"));
    }

    #[test]
    fn test_nan_metric_renders_as_nan_cell() {
        let mut records = sample();
        records[0].power_watts = f64::NAN;
        let table = render_utilization(&records, &[Column::Id, Column::Power]);
        assert!(table.contains("NaN"));
    }

    #[test]
    fn test_render_with_no_devices_still_has_header() {
        let table = render_utilization(&[], &compact_columns());
        assert!(table.contains("ID"));
        assert_eq!(table.lines().count(), 2);
    }

    #[test]
    fn test_rows_line_up() {
        let table = render_utilization(&sample(), &wide_columns());
        let lengths: Vec<usize> = table
            .lines()
            .map(|l| l.chars().count())
            .collect();
        // Header, rule, and every device line share one width.
        assert!(lengths.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_column_name_round_trip() {
        for column in Column::ALL {
            assert_eq!(column.as_str().parse::<Column>().unwrap(), column);
        }
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let err = "wattage".parse::<Column>().unwrap_err();
        assert!(matches!(err, crate::QueryError::UnknownColumn(_)));
    }
}
