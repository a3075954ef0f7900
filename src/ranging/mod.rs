/// 测距系统 (Ranging System)
///
/// - Calibration: 参考检测框尺寸与参考距离
/// - Estimator:   检测框 → 距离 (cm)
/// - Continuity:  相邻帧跳变抑制
pub mod calibration;
pub mod continuity;
pub mod estimator;

pub use calibration::Calibration;
pub use continuity::{ContinuityFilter, Verdict, DEFAULT_JUMP_THRESHOLD};
pub use estimator::{Axis, DistanceEstimator};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RangingError {
    #[error("degenerate bounding box {width}x{height}")]
    DegenerateBox { width: f32, height: f32 },
    #[error("distance is not finite for box {width}x{height}")]
    NonFinite { width: f32, height: f32 },
    #[error("calibration constant {name} must be positive and finite, got {value}")]
    InvalidCalibration { name: &'static str, value: f32 },
}
