//! 遥测配置 - 通过JSON文件调整参数
//!
//! 所有参数在启动时确定; 校验失败直接退出, 不进入帧处理。

use std::fs;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::detection::{reid::DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TARGET_CLASS};
use crate::ranging::{Calibration, RangingError, DEFAULT_JUMP_THRESHOLD};

/// 默认FPGA地址
pub const DEFAULT_DEST_IP: &str = "192.168.100.200";
/// 默认FPGA端口
pub const DEFAULT_PORT: u16 = 5005;
/// 默认训练窗口 (帧)
pub const DEFAULT_FRAME_THRESHOLD: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid destination address {0:?}")]
    InvalidAddress(String),
    #[error("destination port must be non-zero")]
    InvalidPort,
    #[error("target class must not be empty")]
    EmptyTargetClass,
    #[error("{name} is out of range: {value}")]
    OutOfRange { name: &'static str, value: f32 },
    #[error(transparent)]
    Calibration(#[from] RangingError),
}

/// 目标锁定方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionMode {
    /// 训练窗口内多数投票
    Majority,
    /// 固定目标ID
    Fixed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub mode: AcquisitionMode,
    pub frame_threshold: u64, // 训练窗口长度 (帧)
    pub fixed_target_id: u32, // 固定模式下的目标ID
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            mode: AcquisitionMode::Majority,
            frame_threshold: DEFAULT_FRAME_THRESHOLD,
            fixed_target_id: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuityConfig {
    pub jump_threshold: f32, // 跳变阈值 (cm)
}

impl Default for ContinuityConfig {
    fn default() -> Self {
        Self {
            jump_threshold: DEFAULT_JUMP_THRESHOLD,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReidConfig {
    pub enabled: bool,
    pub similarity_threshold: f32, // 余弦相似度阈值
}

impl Default for ReidConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dest_ip: String,
    pub port: u16,
    pub mirror_x: bool, // 水平镜像 center_x
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dest_ip: DEFAULT_DEST_IP.to_string(),
            port: DEFAULT_PORT,
            mirror_x: false,
        }
    }
}

/// 遥测参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    // === 检测参数 ===
    pub target_class: String,
    pub min_confidence: f32,

    // === 目标锁定 ===
    pub acquisition: AcquisitionConfig,

    // === 测距 ===
    pub calibration: Calibration,
    pub continuity: ContinuityConfig,

    // === ReID ===
    pub reid: ReidConfig,

    // === 输出 ===
    pub telemetry: OutputConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            target_class: DEFAULT_TARGET_CLASS.to_string(),
            min_confidence: 0.0,
            acquisition: AcquisitionConfig::default(),
            calibration: Calibration::default(),
            continuity: ContinuityConfig::default(),
            reid: ReidConfig::default(),
            telemetry: OutputConfig::default(),
        }
    }
}

impl TelemetryConfig {
    /// 从JSON文件加载配置
    ///
    /// 文件不存在时写出默认配置; 解析失败为致命错误
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(json) => {
                let config: Self =
                    serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
                        path: path.to_path_buf(),
                        source,
                    })?;
                info!("✅ 配置已从 {} 加载", path.display());
                config
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("📝 配置文件不存在,创建默认配置...");
                let config = Self::default();
                if let Err(e) = config.save(path) {
                    warn!("❌ 保存默认配置失败: {}", e);
                }
                config
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!("💾 配置已保存到 {}", path.as_ref().display());
        Ok(())
    }

    /// 目的地址
    pub fn destination(&self) -> Result<SocketAddrV4, ConfigError> {
        let ip: Ipv4Addr = self
            .telemetry
            .dest_ip
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.telemetry.dest_ip.clone()))?;
        if self.telemetry.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        Ok(SocketAddrV4::new(ip, self.telemetry.port))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.destination()?;
        self.calibration.validate()?;

        if self.target_class.trim().is_empty() {
            return Err(ConfigError::EmptyTargetClass);
        }
        if !(self.min_confidence.is_finite() && (0.0..=1.0).contains(&self.min_confidence)) {
            return Err(ConfigError::OutOfRange {
                name: "min_confidence",
                value: self.min_confidence,
            });
        }
        let jump = self.continuity.jump_threshold;
        if !(jump.is_finite() && jump > 0.0) {
            return Err(ConfigError::OutOfRange {
                name: "continuity.jump_threshold",
                value: jump,
            });
        }
        let sim = self.reid.similarity_threshold;
        if !(sim.is_finite() && sim > -1.0 && sim <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "reid.similarity_threshold",
                value: sim,
            });
        }
        Ok(())
    }

    /// 打印当前配置
    pub fn log_summary(&self) {
        info!("🎛️  当前遥测配置:");
        info!("  目标类别: {} (置信度 ≥ {:.2})", self.target_class, self.min_confidence);
        match self.acquisition.mode {
            AcquisitionMode::Majority => {
                info!("  目标锁定: 多数投票, 训练窗口 {} 帧", self.acquisition.frame_threshold)
            }
            AcquisitionMode::Fixed => {
                info!("  目标锁定: 固定ID {}", self.acquisition.fixed_target_id)
            }
        }
        info!(
            "  标定: 宽 {:.4} 高 {:.4} @ {:.1}cm",
            self.calibration.ref_width, self.calibration.ref_height, self.calibration.ref_distance
        );
        info!("  跳变阈值: {:.1}cm", self.continuity.jump_threshold);
        if self.reid.enabled {
            info!("  ReID: 启用, 相似度阈值 {:.2}", self.reid.similarity_threshold);
        }
        info!(
            "  目的地: {}:{}{}",
            self.telemetry.dest_ip,
            self.telemetry.port,
            if self.telemetry.mirror_x { " (镜像X)" } else { "" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("target-telemetry-{}-{}", std::process::id(), name))
    }

    #[test]
    fn defaults_are_valid() {
        let config = TelemetryConfig::default();
        config.validate().unwrap();
        assert_eq!(
            config.destination().unwrap(),
            SocketAddrV4::new(Ipv4Addr::new(192, 168, 100, 200), 5005)
        );
        assert_eq!(config.acquisition.frame_threshold, 300);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "acquisition": { "frame_threshold": 30 }, "telemetry": { "port": 6000 } }"#;
        let config: TelemetryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.acquisition.frame_threshold, 30);
        assert_eq!(config.acquisition.mode, AcquisitionMode::Majority);
        assert_eq!(config.telemetry.port, 6000);
        assert_eq!(config.telemetry.dest_ip, DEFAULT_DEST_IP);
        assert_eq!(config.calibration, Calibration::default());
    }

    #[test]
    fn fixed_mode_parses_lowercase() {
        let json = r#"{ "acquisition": { "mode": "fixed", "fixed_target_id": 4 } }"#;
        let config: TelemetryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.acquisition.mode, AcquisitionMode::Fixed);
        assert_eq!(config.acquisition.fixed_target_id, 4);
    }

    #[test]
    fn bad_address_and_port_are_fatal() {
        let mut config = TelemetryConfig::default();
        config.telemetry.dest_ip = "192.168.100".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAddress(_))));

        let mut config = TelemetryConfig::default();
        config.telemetry.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort)));
    }

    #[test]
    fn bad_thresholds_are_fatal() {
        let mut config = TelemetryConfig::default();
        config.continuity.jump_threshold = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { .. })));

        let mut config = TelemetryConfig::default();
        config.calibration.ref_height = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Calibration(_))));
    }

    #[test]
    fn missing_file_writes_defaults() {
        let path = temp_path("missing.json");
        let _ = fs::remove_file(&path);
        let config = TelemetryConfig::load(&path).unwrap();
        assert_eq!(config, TelemetryConfig::default());
        assert!(path.exists());
        let reloaded = TelemetryConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let path = temp_path("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(TelemetryConfig::load(&path), Err(ConfigError::Parse { .. })));
        let _ = fs::remove_file(&path);
    }
}
