//! Client configuration stored in `sceneops.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::SweepCandidate;

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "sceneops.toml";

/// Client configuration (TOML).
///
/// This file is intended to be edited by humans. Missing fields default to
/// values that match a stock local editor install.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the editor's skill server.
    pub endpoint: String,

    /// Per-call timeout in seconds, applied by the transport.
    pub request_timeout_secs: u64,

    /// Timeout for the availability probe in seconds.
    pub probe_timeout_secs: u64,

    pub sweep: SweepConfig,

    pub material: MaterialConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SweepConfig {
    /// Maximum confirmed deletions per candidate name.
    pub max_attempts: u32,
    /// Exact names drained by `sceneops sweep` before each scenario.
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MaterialConfig {
    /// Color property names tried for one logical color, in order
    /// (render-pipeline name first, legacy name after).
    pub color_properties: Vec<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            candidates: [
                "Visual_Verification",
                "Visual_Verification_Cube",
                "SkillTest",
                "FullTest_GO",
                "MatTestCube",
                "URP_Cube",
                "Rainbow_Cube",
                "TestPrefab",
                "MyCube",
                "ChildCube",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            color_properties: vec!["_BaseColor".to_string(), "_Color".to_string()],
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8090".to_string(),
            request_timeout_secs: 30,
            probe_timeout_secs: 2,
            sweep: SweepConfig::default(),
            material: MaterialConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(anyhow!("endpoint must be non-empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.probe_timeout_secs == 0 {
            return Err(anyhow!("probe_timeout_secs must be > 0"));
        }
        if self.sweep.max_attempts == 0 {
            return Err(anyhow!("sweep.max_attempts must be > 0"));
        }
        if let Some(index) = self
            .sweep
            .candidates
            .iter()
            .position(|name| name.trim().is_empty())
        {
            return Err(anyhow!("sweep.candidates[{index}] must be non-empty"));
        }
        if self.material.color_properties.is_empty()
            || self
                .material
                .color_properties
                .iter()
                .any(|name| name.trim().is_empty())
        {
            return Err(anyhow!(
                "material.color_properties must be a non-empty array of names"
            ));
        }
        Ok(())
    }

    /// The configured cleanup catalog, each name bounded by `sweep.max_attempts`.
    pub fn sweep_catalog(&self) -> Vec<SweepCandidate> {
        self.sweep
            .candidates
            .iter()
            .map(|name| SweepCandidate::new(name.clone(), self.sweep.max_attempts))
            .collect()
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ClientConfig::default()`.
pub fn load_config(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        let cfg = ClientConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ClientConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ClientConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("sceneops.toml");
        let mut cfg = ClientConfig::default();
        cfg.sweep.candidates = vec!["Ghost".to_string()];
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sceneops.toml");
        fs::write(&path, "endpoint = \"http://editor:9000\"\n[sweep]\nmax_attempts = 5\n")
            .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.endpoint, "http://editor:9000");
        assert_eq!(cfg.sweep.max_attempts, 5);
        assert_eq!(cfg.sweep.candidates, SweepConfig::default().candidates);
        assert_eq!(cfg.material, MaterialConfig::default());
    }

    #[test]
    fn rejects_zero_sweep_bound() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sceneops.toml");
        fs::write(&path, "[sweep]\nmax_attempts = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("sweep.max_attempts must be > 0"));
    }

    #[test]
    fn rejects_blank_candidate_and_empty_properties() {
        let mut cfg = ClientConfig::default();
        cfg.sweep.candidates.push("  ".to_string());
        assert!(cfg.validate().is_err());

        let mut cfg = ClientConfig::default();
        cfg.material.color_properties.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sweep_catalog_applies_shared_bound() {
        let mut cfg = ClientConfig::default();
        cfg.sweep.max_attempts = 7;
        cfg.sweep.candidates = vec!["A".to_string(), "B".to_string()];
        assert_eq!(
            cfg.sweep_catalog(),
            vec![SweepCandidate::new("A", 7), SweepCandidate::new("B", 7)]
        );
    }
}
