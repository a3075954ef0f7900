//! 遥测报文 (Telemetry Message)
//!
//! 线格式: ASCII `"<center_x>,<center_y>,<distance>"`,
//! 中心点保留4位小数, 距离保留2位小数, 无结尾分隔符。

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TelemetryMessage {
    pub center_x: f32,
    pub center_y: f32,
    pub distance: f32,
}

impl TelemetryMessage {
    pub fn new(center_x: f32, center_y: f32, distance: f32) -> Self {
        Self {
            center_x,
            center_y,
            distance,
        }
    }

    /// 水平镜像 (摄像头朝向执行端安装时使用)
    pub fn mirrored(self) -> Self {
        Self {
            center_x: 1.0 - self.center_x,
            ..self
        }
    }

    pub fn payload(&self) -> String {
        self.to_string()
    }

    /// 解析报文 (接收端/测试用)
    pub fn parse(payload: &str) -> Option<Self> {
        let mut parts = payload.split(',');
        let center_x = parts.next()?.trim().parse().ok()?;
        let center_y = parts.next()?.trim().parse().ok()?;
        let distance = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(center_x, center_y, distance))
    }
}

impl fmt::Display for TelemetryMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4},{:.4},{:.2}",
            self.center_x, self.center_y, self.distance
        )
    }
}
