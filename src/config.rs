//! 控制器配置
//!
//! 采样周期、带宽排除阈值、流表空闲超时和丢弃规则硬超时。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse controller config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid controller config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// 统计采样周期（秒）
    pub sampling_interval_secs: u64,
    /// 吞吐超过该值（kbit/s）的交换机不参与路径计算
    pub bandwidth_threshold_kbps: f64,
    pub flow_idle_timeout_secs: u16,
    pub drop_hard_timeout_secs: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sampling_interval_secs: 5,
            bandwidth_threshold_kbps: 5000.0,
            flow_idle_timeout_secs: 100,
            drop_hard_timeout_secs: 20,
        }
    }
}

impl ControllerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: ControllerConfig = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sampling_interval_secs must be positive".into(),
            ));
        }
        if !self.bandwidth_threshold_kbps.is_finite() || self.bandwidth_threshold_kbps <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "bandwidth_threshold_kbps must be a positive number, got {}",
                self.bandwidth_threshold_kbps
            )));
        }
        Ok(())
    }
}
