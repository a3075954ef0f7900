//! 检测数据结构定义
//! Data structures for upstream detection records
//!
//! 推理管线输出的检测结果 (只读输入)

use serde::{Deserialize, Serialize};

// ========== 公共常量 ==========

/// 默认目标类别
pub const DEFAULT_TARGET_CLASS: &str = "person";

/// 缺失跟踪ID时的默认值
pub const UNTRACKED_ID: u32 = 0;

// ========== 数据结构 ==========

/// 归一化检测框 (Normalized bounding box)
///
/// 所有坐标均为画面宽高的比例 (0-1), 与标定常量使用同一单位
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedBox {
    /// 由左上角 + 宽高构建
    pub fn from_xywh(xmin: f32, ymin: f32, width: f32, height: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax: xmin + width,
            ymax: ymin + height,
            width,
            height,
        }
    }

    /// 由两个角点构建
    pub fn from_corners(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            width: xmax - xmin,
            height: ymax - ymin,
        }
    }

    /// 获取中心点
    pub fn center(&self) -> (f32, f32) {
        let cx = (self.xmin + self.xmax) / 2.0;
        let cy = (self.ymin + self.ymax) / 2.0;
        (cx, cy)
    }
}

/// 检测记录 (Detection record)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub bbox: NormalizedBox,
    #[serde(default)]
    pub confidence: f32,
    /// 跟踪器分配的ID, 缺失时视为 0
    #[serde(default)]
    pub track_id: Option<u32>,
    /// ReID特征向量 (可选)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: NormalizedBox, confidence: f32) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence,
            track_id: None,
            embedding: None,
        }
    }

    pub fn with_track_id(mut self, id: u32) -> Self {
        self.track_id = Some(id);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// 有效跟踪ID (缺失 → 0)
    pub fn track_id(&self) -> u32 {
        self.track_id.unwrap_or(UNTRACKED_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_track_id_reads_as_zero() {
        let det = Detection::new("person", NormalizedBox::from_xywh(0.1, 0.1, 0.2, 0.5), 0.9);
        assert_eq!(det.track_id(), 0);
        assert_eq!(det.with_track_id(4).track_id(), 4);
    }

    #[test]
    fn center_uses_corners() {
        let bbox = NormalizedBox::from_corners(0.2, 0.1, 0.4, 0.7);
        let (cx, cy) = bbox.center();
        assert!((cx - 0.3).abs() < 1e-6);
        assert!((cy - 0.4).abs() < 1e-6);
        assert!((bbox.width - 0.2).abs() < 1e-6);
    }

    #[test]
    fn parses_upstream_json_without_optional_fields() {
        let json = r#"{"label":"person","bbox":{"xmin":0.1,"ymin":0.2,"xmax":0.3,"ymax":0.8,"width":0.2,"height":0.6}}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.track_id, None);
        assert_eq!(det.confidence, 0.0);
        assert!(det.embedding.is_none());
    }
}
