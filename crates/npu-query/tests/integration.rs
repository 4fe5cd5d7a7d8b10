// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: raw report text → records → filter → selection.
//!
//! These exercise the complete flow the library exists for, including a
//! run against a real child process standing in for `npu-smi`.

use npu_query::{
    first_available, records_from_report, select, AvailabilityQuery, QueryError,
    SelectionPolicy, SmiClient, SnapshotSource,
};
use std::time::Duration;

/// A four-device report: two idle, one with a busy core, one with nearly
/// full HBM. Shapes match real `npu-smi info` output.
const REPORT: &str = "\
+------------------------------------------------------------------------------------------------+
| npu-smi 23.0.1                           Version: 23.0.1                                       |
+---------------------------+---------------+----------------------------------------------------+
| NPU   Name                | Health        | Power(W)     Temp(C)          Hugepages-Usage(page)|
| Chip                      | Bus-Id        | AICore(%)    Memory-Usage(MB) HBM-Usage(MB)        |
+===========================+===============+====================================================+
| 0     910B                | OK            | 65.0         32               0/0                  |
| 910B                      | 0000:01:00.0  | 12           5                1024/ 32768          |
+===========================+===============+====================================================+
| 1     910B                | OK            | 98.2         57               0/0                  |
| 910B                      | 0000:41:00.0  | 96           7                2048/ 32768          |
+===========================+===============+====================================================+
| 2     910B                | Warning       | 80.0         49               0/0                  |
| 910B                      | 0000:81:00.0  | 4            2                31000/ 32768         |
+===========================+===============+====================================================+
| 3     910B                | OK            | 61.0         30               0/0                  |
| 910B                      | 0000:C1:00.0  | 8            3                4096/ 32768          |
+===========================+===============+====================================================+
+---------------------------+---------------+----------------------------------------------------+
| NPU     Chip              | Process id    | Process name     | Process memory(MB)              |
+===========================+===============+====================================================+
| No running processes found in NPU 0                                                            |
+===========================+===============+====================================================+
";

struct Canned(&'static str);

impl SnapshotSource for Canned {
    fn snapshot(&self) -> Vec<npu_query::NpuRecord> {
        records_from_report(self.0)
    }
}

#[test]
fn parses_the_full_report() {
    let records = records_from_report(REPORT);
    assert_eq!(records.len(), 4);
    assert_eq!(records[2].health, "Warning");
    assert_eq!(records[3].bus_id, "0000:C1:00.0");
}

#[test]
fn single_device_scenario() {
    let report = "\
+===========================+===============+====================================================+
| 0     NPU                 | OK            | 65           32               0/0                  |
| 910A                      | 0000:01:00.0  | 12           5                1024/ 32768          |
+===========================+===============+====================================================+
";
    let records = records_from_report(report);
    assert_eq!(records.len(), 1);

    let npu = &records[0];
    assert_eq!(npu.id, 0);
    assert_eq!(npu.kind, "NPU");
    assert_eq!(npu.health, "OK");
    assert_eq!(npu.chip, "910A");
    assert_eq!(npu.bus_id, "0000:01:00.0");
    assert!((npu.power_watts - 65.0).abs() < f64::EPSILON);
    assert!((npu.temperature_c - 32.0).abs() < f64::EPSILON);
    assert!((npu.aicore_percent - 12.0).abs() < f64::EPSILON);
    assert!((npu.memory_util - 5.0).abs() < f64::EPSILON);
    assert!((npu.hbm_util_ratio() - 0.03125).abs() < 1e-9);
    assert!((npu.hbm_free_mb() - 31744.0).abs() < f64::EPSILON);
}

#[test]
fn selection_skips_the_loaded_devices() {
    // Device 1 fails the core-load bound, device 2 the HBM bound.
    let records = records_from_report(REPORT);
    let ids = select(
        &records,
        &AvailabilityQuery::default(),
        SelectionPolicy::First,
        10,
    );
    assert_eq!(ids, vec![0, 3]);
}

#[test]
fn by_free_hbm_prefers_the_emptier_device() {
    let records = records_from_report(REPORT);
    let ids = select(
        &records,
        &AvailabilityQuery::default(),
        SelectionPolicy::ByFreeHbm,
        1,
    );
    assert_eq!(ids, vec![0]);
}

#[test]
fn exclusions_compose_with_thresholds() {
    let records = records_from_report(REPORT);
    let query = AvailabilityQuery {
        excluded_ids: [0].into_iter().collect(),
        excluded_bus_ids: ["0000:C1:00.0".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let ids = select(&records, &query, SelectionPolicy::First, 10);
    assert!(ids.is_empty());
}

#[test]
fn acquisition_over_canned_source() {
    let id = first_available(
        &Canned(REPORT),
        SelectionPolicy::Last,
        &AvailabilityQuery::default(),
        1,
        Duration::from_secs(1),
    )
    .unwrap();
    assert_eq!(id, 3);
}

#[test]
fn acquisition_failure_carries_the_budget() {
    let query = AvailabilityQuery {
        max_core_load: 0.0, // nothing can pass a strict zero bound
        ..Default::default()
    };
    let err = first_available(
        &Canned(REPORT),
        SelectionPolicy::First,
        &query,
        2,
        Duration::from_millis(1),
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::NoDeviceAvailable { attempts: 2, .. }));
}

// There is deliberately no timeout on the child process: a wedged
// `npu-smi` blocks the caller indefinitely, and wrapping it is the
// caller's job. The tests below therefore only use fast-exiting stand-ins.
#[cfg(unix)]
mod smi_process {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Writes an executable script that prints `report` for any argument.
    fn fake_smi(name: &str, report: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("npu_query_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "#!/bin/sh\ncat <<'EOF'\n{report}EOF\n").unwrap();
        drop(f);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn snapshot_through_a_real_child_process() {
        let script = fake_smi("fake_npu_smi", REPORT);
        let client = SmiClient::with_command(&script);
        let records = client.snapshot();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].id, 0);
        let _ = std::fs::remove_file(&script);
    }

    #[test]
    fn garbage_output_degrades_to_empty() {
        let script = fake_smi("garbage_npu_smi", "not a table at all\n");
        let client = SmiClient::with_command(&script);
        assert!(client.snapshot().is_empty());
        let _ = std::fs::remove_file(&script);
    }
}
