//! 类别过滤器 (Detection Filter)
//! 职责: 只保留目标类别的检测框, 保持原有顺序

use super::types::Detection;

/// 目标类别过滤器
#[derive(Clone, Debug)]
pub struct ClassFilter {
    target_class: String,
    min_confidence: f32,
}

impl ClassFilter {
    pub fn new(target_class: impl Into<String>, min_confidence: f32) -> Self {
        Self {
            target_class: target_class.into(),
            min_confidence,
        }
    }

    pub fn target_class(&self) -> &str {
        &self.target_class
    }

    pub fn matches(&self, detection: &Detection) -> bool {
        detection.label == self.target_class && detection.confidence >= self.min_confidence
    }

    /// 过滤当前帧的检测结果 (无匹配时返回空列表)
    pub fn apply<'a>(&self, detections: &'a [Detection]) -> Vec<&'a Detection> {
        detections.iter().filter(|d| self.matches(d)).collect()
    }
}
