//! 测距 (Distance Estimator)
//!
//! 单轴小孔成像模型: 检测框比参考轮廓更宽时用宽度推算, 否则用高度推算。

use super::calibration::Calibration;
use super::RangingError;

/// 推算所用的轴
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DistanceEstimator {
    calibration: Calibration,
}

impl DistanceEstimator {
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }

    /// 根据检测框宽高估计距离 (cm)
    pub fn estimate(&self, width: f32, height: f32) -> Result<f32, RangingError> {
        self.estimate_with_axis(width, height).map(|(distance, _)| distance)
    }

    /// 同 `estimate`, 并返回所选的轴
    pub fn estimate_with_axis(&self, width: f32, height: f32) -> Result<(f32, Axis), RangingError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(RangingError::DegenerateBox { width, height });
        }

        let c = &self.calibration;
        let current_ratio = width / height;

        let (distance, axis) = if c.standard_ratio() <= current_ratio {
            // 宽度误差更小
            (c.ref_distance * (c.ref_width / width), Axis::Width)
        } else {
            (c.ref_distance * (c.ref_height / height), Axis::Height)
        };

        if !distance.is_finite() {
            return Err(RangingError::NonFinite { width, height });
        }
        Ok((distance, axis))
    }
}
