//! 标定常量 (Calibration Constants)
//!
//! 在参考距离处实测目标得到的检测框宽高 (归一化单位)。

use serde::{Deserialize, Serialize};

use super::RangingError;

/// 参考宽度 (实测)
pub const REF_WIDTH: f32 = 0.1200;
/// 参考高度 (实测)
pub const REF_HEIGHT: f32 = 0.5986;
/// 参考距离 (cm)
pub const REF_DISTANCE: f32 = 300.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub ref_width: f32,
    pub ref_height: f32,
    pub ref_distance: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            ref_width: REF_WIDTH,
            ref_height: REF_HEIGHT,
            ref_distance: REF_DISTANCE,
        }
    }
}

impl Calibration {
    pub fn new(ref_width: f32, ref_height: f32, ref_distance: f32) -> Result<Self, RangingError> {
        let calibration = Self {
            ref_width,
            ref_height,
            ref_distance,
        };
        calibration.validate()?;
        Ok(calibration)
    }

    /// 参考宽高比
    pub fn standard_ratio(&self) -> f32 {
        self.ref_width / self.ref_height
    }

    pub fn validate(&self) -> Result<(), RangingError> {
        for (name, value) in [
            ("ref_width", self.ref_width),
            ("ref_height", self.ref_height),
            ("ref_distance", self.ref_distance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RangingError::InvalidCalibration { name, value });
            }
        }
        Ok(())
    }
}
