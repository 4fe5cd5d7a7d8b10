// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scout configuration loaded from TOML files or constructed
//! programmatically. Command-line flags override whatever is here.
//!
//! # TOML Format
//! ```toml
//! max_core_load = 0.5
//! max_hbm_util = 0.5
//! min_hbm_free_mb = 8192.0
//! include_nan = false
//! exclude_ids = [2]
//! exclude_bus_ids = ["0000:C1:00.0"]
//! policy = "by-free-hbm"
//! limit = 1
//! attempts = 12
//! interval_secs = 300
//! ```

use npu_query::{AvailabilityQuery, QueryError, SelectionPolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Defaults for thresholds, selection, and polling.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Diagnostic binary to invoke; `npu-smi` on `PATH` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smi_command: Option<PathBuf>,
    /// Maximum AI-Core load ratio for availability.
    pub max_core_load: f64,
    /// Maximum HBM utilization ratio for availability.
    pub max_hbm_util: f64,
    /// Minimum free HBM in megabytes.
    pub min_hbm_free_mb: f64,
    /// Treat NaN readings as passing their threshold checks.
    pub include_nan: bool,
    /// Device ids never to select.
    pub exclude_ids: Vec<u32>,
    /// Bus ids never to select.
    pub exclude_bus_ids: Vec<String>,
    /// Selection policy name: `"first"`, `"last"`, `"random"`, `"by-free-hbm"`.
    pub policy: String,
    /// Maximum number of ids `available` prints.
    pub limit: usize,
    /// Polling attempts for `acquire`.
    pub attempts: u32,
    /// Seconds to sleep between polling attempts.
    pub interval_secs: u64,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            smi_command: None,
            max_core_load: 0.5,
            max_hbm_util: 0.5,
            min_hbm_free_mb: 0.0,
            include_nan: false,
            exclude_ids: Vec::new(),
            exclude_bus_ids: Vec::new(),
            policy: "first".to_string(),
            limit: 1,
            attempts: 1,
            interval_secs: 900,
        }
    }
}

impl ScoutConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config '{}': {e}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).map_err(|e| anyhow::anyhow!("TOML parse error: {e}"))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).map_err(|e| anyhow::anyhow!("TOML serialise error: {e}"))
    }

    /// Builds the availability query these defaults describe.
    pub fn availability_query(&self) -> AvailabilityQuery {
        AvailabilityQuery {
            max_core_load: self.max_core_load,
            max_hbm_util: self.max_hbm_util,
            min_hbm_free_mb: self.min_hbm_free_mb,
            include_nan: self.include_nan,
            excluded_ids: self.exclude_ids.iter().copied().collect(),
            excluded_bus_ids: self.exclude_bus_ids.iter().cloned().collect(),
        }
    }

    /// Parses the configured selection policy name.
    pub fn selection_policy(&self) -> Result<SelectionPolicy, QueryError> {
        self.policy.parse()
    }

    /// The polling interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = ScoutConfig::default();
        assert!((c.max_core_load - 0.5).abs() < f64::EPSILON);
        assert!((c.max_hbm_util - 0.5).abs() < f64::EPSILON);
        assert_eq!(c.policy, "first");
        assert_eq!(c.attempts, 1);
        assert_eq!(c.interval_secs, 900);
        assert!(!c.include_nan);
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
max_hbm_util = 0.8
policy = "by-free-hbm"
exclude_ids = [2, 5]
"#;
        let c = ScoutConfig::from_toml(toml).unwrap();
        assert!((c.max_hbm_util - 0.8).abs() < f64::EPSILON);
        assert_eq!(c.policy, "by-free-hbm");
        assert_eq!(c.exclude_ids, vec![2, 5]);
        // Unspecified fields keep their defaults.
        assert!((c.max_core_load - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = ScoutConfig {
            min_hbm_free_mb: 4096.0,
            exclude_bus_ids: vec!["0000:C1:00.0".to_string()],
            ..Default::default()
        };
        let back = ScoutConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert!((back.min_hbm_free_mb - 4096.0).abs() < f64::EPSILON);
        assert_eq!(back.exclude_bus_ids, c.exclude_bus_ids);
    }

    #[test]
    fn test_availability_query_mapping() {
        let c = ScoutConfig {
            exclude_ids: vec![1, 3],
            include_nan: true,
            ..Default::default()
        };
        let q = c.availability_query();
        assert!(q.include_nan);
        assert!(q.excluded_ids.contains(&1));
        assert!(q.excluded_ids.contains(&3));
        assert!(!q.excluded_ids.contains(&0));
    }

    #[test]
    fn test_selection_policy_parse() {
        let c = ScoutConfig {
            policy: "random".to_string(),
            ..Default::default()
        };
        assert_eq!(c.selection_policy().unwrap(), SelectionPolicy::Random);

        let c = ScoutConfig {
            policy: "bogus".to_string(),
            ..Default::default()
        };
        assert!(c.selection_policy().is_err());
    }
}
