// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Typed per-device snapshot records.
//!
//! An [`NpuRecord`] is built from one flat [`RawRow`] produced by the
//! table scanner. Numeric fields use a safe cast — `npu-smi` reports
//! placeholder text (e.g. `N/A`) for metrics a given SKU does not
//! support, and those must become `NaN` rather than a parse error so the
//! rest of the record stays usable.

use crate::table::{scan, RawRow};

/// One NPU's state at snapshot time.
///
/// Records are rebuilt from scratch on every query; nothing is cached or
/// shared between calls.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NpuRecord {
    /// Device index as reported by `npu-smi`. Unique within a snapshot,
    /// but may shift across reboots — use [`NpuRecord::bus_id`] as the
    /// stable key.
    pub id: u32,
    /// Hardware variant / SKU name (e.g. `910B`).
    pub kind: String,
    /// Health status code as reported by the tool (e.g. `OK`, `Warning`).
    pub health: String,
    /// Power draw in watts, `NaN` if unreported.
    pub power_watts: f64,
    /// Chip temperature in degrees Celsius, `NaN` if unreported.
    pub temperature_c: f64,
    /// Hugepages in use.
    pub hugepages: f64,
    /// Chip label from the second table line.
    pub chip: String,
    /// PCI bus id (e.g. `0000:01:00.0`). Stable across reboots.
    pub bus_id: String,
    /// AI-Core load in percent (0–100), `NaN` if unreported.
    pub aicore_percent: f64,
    /// Auxiliary on-device memory usage metric in MB. Rarely useful —
    /// HBM is the capacity that matters for placement.
    pub memory_util: f64,
    /// HBM in use, megabytes.
    pub hbm_used_mb: f64,
    /// Total HBM, megabytes.
    pub hbm_total_mb: f64,
}

impl NpuRecord {
    /// Builds a record from one scanned row.
    ///
    /// Returns `None` when the id is not a non-negative integer — ids are
    /// the selection currency, and a row without one is as useless as a
    /// row that failed the shape check.
    pub fn from_raw(raw: &RawRow) -> Option<Self> {
        let id = match raw.id.parse::<u32>() {
            Ok(id) => id,
            Err(_) => {
                tracing::debug!("dropping row with non-integer id '{}'", raw.id);
                return None;
            }
        };

        Some(Self {
            id,
            kind: raw.kind.clone(),
            health: raw.health.clone(),
            power_watts: safe_float(&raw.power),
            temperature_c: safe_float(&raw.temperature),
            hugepages: safe_float(&raw.hugepages),
            chip: raw.chip.clone(),
            bus_id: raw.bus_id.clone(),
            aicore_percent: safe_float(&raw.aicore),
            memory_util: safe_float(&raw.memory_util),
            hbm_used_mb: safe_float(&raw.hbm_used),
            hbm_total_mb: safe_float(&raw.hbm_total),
        })
    }

    /// Returns the HBM utilization as a fraction (`used / total`).
    ///
    /// A zero or unreported total makes the division non-finite; that is
    /// normalized to `NaN` so downstream threshold checks treat it like
    /// any other unreported metric instead of an infinity.
    pub fn hbm_util_ratio(&self) -> f64 {
        let ratio = self.hbm_used_mb / self.hbm_total_mb;
        if ratio.is_finite() {
            ratio
        } else {
            f64::NAN
        }
    }

    /// Returns the free HBM in megabytes (`total - used`).
    pub fn hbm_free_mb(&self) -> f64 {
        self.hbm_total_mb - self.hbm_used_mb
    }

    /// Creates a record for testing without going through the parser.
    #[cfg(test)]
    pub(crate) fn synthetic(id: u32, aicore: f64, hbm_used: f64, hbm_total: f64) -> Self {
        Self {
            id,
            kind: "910B".to_string(),
            health: "OK".to_string(),
            power_watts: 65.0,
            temperature_c: 35.0,
            hugepages: 0.0,
            chip: "910B".to_string(),
            bus_id: format!("0000:{id:02x}:00.0"),
            aicore_percent: aicore,
            memory_util: 0.0,
            hbm_used_mb: hbm_used,
            hbm_total_mb: hbm_total,
        }
    }
}

/// Parses the full `npu-smi info` text into typed records, dropping rows
/// that do not build. Never fails.
pub fn records_from_report(text: &str) -> Vec<NpuRecord> {
    scan(text)
        .rows
        .iter()
        .filter_map(NpuRecord::from_raw)
        .collect()
}

/// Numeric parse that yields `NaN` instead of an error.
pub(crate) fn safe_float(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row() -> RawRow {
        RawRow {
            id: "0".into(),
            kind: "910B".into(),
            health: "OK".into(),
            power: "65.0".into(),
            temperature: "32".into(),
            hugepages: "0".into(),
            chip: "910B".into(),
            bus_id: "0000:01:00.0".into(),
            aicore: "12".into(),
            memory_util: "5".into(),
            hbm_used: "1024".into(),
            hbm_total: "32768".into(),
        }
    }

    #[test]
    fn test_from_raw() {
        let npu = NpuRecord::from_raw(&raw_row()).unwrap();
        assert_eq!(npu.id, 0);
        assert_eq!(npu.kind, "910B");
        assert_eq!(npu.health, "OK");
        assert!((npu.power_watts - 65.0).abs() < f64::EPSILON);
        assert!((npu.temperature_c - 32.0).abs() < f64::EPSILON);
        assert!((npu.aicore_percent - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_derived_quantities_exact() {
        let npu = NpuRecord::from_raw(&raw_row()).unwrap();
        assert!((npu.hbm_util_ratio() - 1024.0 / 32768.0).abs() < f64::EPSILON);
        assert!((npu.hbm_free_mb() - 31744.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_placeholder_metric_becomes_nan() {
        let mut raw = raw_row();
        raw.power = "N/A".into();
        raw.temperature = "--".into();
        let npu = NpuRecord::from_raw(&raw).unwrap();
        assert!(npu.power_watts.is_nan());
        assert!(npu.temperature_c.is_nan());
        // The rest of the record is intact.
        assert!((npu.aicore_percent - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_total_ratio_is_nan_not_infinite() {
        let mut raw = raw_row();
        raw.hbm_total = "0".into();
        let npu = NpuRecord::from_raw(&raw).unwrap();
        assert!(npu.hbm_util_ratio().is_nan());
    }

    #[test]
    fn test_non_integer_id_drops_row() {
        let mut raw = raw_row();
        raw.id = "N/A".into();
        assert!(NpuRecord::from_raw(&raw).is_none());
    }

    #[test]
    fn test_safe_float() {
        assert!((safe_float("65.0") - 65.0).abs() < f64::EPSILON);
        assert!((safe_float(" 32 ") - 32.0).abs() < f64::EPSILON);
        assert!(safe_float("N/A").is_nan());
        assert!(safe_float("").is_nan());
    }
}
