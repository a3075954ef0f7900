// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 目标测距遥测 (Target ranging telemetry)
//!
//! 检测管线每帧回调的核心: 锁定真实目标的跟踪ID, 由检测框估计距离,
//! 抑制不合理跳变, 再以UDP报文发给下游FPGA/执行端。
pub mod config; // 遥测配置参数
pub mod detection; // 检测过滤与目标锁定
pub mod processor; // 帧处理器
pub mod ranging; // 测距与跳变过滤
pub mod source; // JSON帧数据源
pub mod telemetry; // UDP遥测

pub use crate::config::{AcquisitionMode, ConfigError, TelemetryConfig};
pub use crate::detection::{Detection, NormalizedBox, Phase};
pub use crate::processor::{FrameProcessor, FrameReport, Measurement, SharedProcessor, StartupError};
pub use crate::ranging::{Calibration, ContinuityFilter, DistanceEstimator, RangingError, Verdict};
pub use crate::source::{read_frames, FrameRecord, SourceError};
pub use crate::telemetry::{MemorySink, TelemetryMessage, TelemetrySink, TelemetryStats, UdpSink};
