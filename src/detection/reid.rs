//! 外观重识别 (Identity Reassignment)
//!
//! 跟踪器在遮挡后可能给同一个人分配新的ID。锁定目标后, 记录目标的第一条
//! ReID特征向量作为参考; 之后若出现其他ID的检测, 且特征与参考的余弦相似度
//! 超过阈值, 就把它视为目标本身。
//!
//! 没有特征向量的检测不参与比较。

use tracing::{debug, info};

use super::types::Detection;

/// 默认相似度阈值
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.75;

#[derive(Clone, Debug)]
pub struct IdentityMatcher {
    similarity_threshold: f32,
    reference: Option<Vec<f32>>,
}

/// 重识别结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reassignment {
    pub from_id: u32,
    pub similarity: f32,
}

impl IdentityMatcher {
    pub fn new(similarity_threshold: f32) -> Self {
        Self {
            similarity_threshold,
            reference: None,
        }
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// 用锁定目标的检测更新参考特征 (只记录第一次)
    pub fn remember(&mut self, target: &Detection) {
        if self.reference.is_some() {
            return;
        }
        if let Some(embedding) = target.embedding.as_deref() {
            if let Some(normalized) = l2_normalize(embedding) {
                info!("🧬 已记录目标ID {} 的参考特征 ({}维)", target.track_id(), normalized.len());
                self.reference = Some(normalized);
            }
        }
    }

    /// 判断非目标ID的检测是否应重新分配为目标
    pub fn reassign(&self, candidate: &Detection, target_id: u32) -> Option<Reassignment> {
        if candidate.track_id() == target_id {
            return None;
        }
        let reference = self.reference.as_deref()?;
        let embedding = candidate.embedding.as_deref()?;
        let similarity = cosine_similarity(reference, embedding)?;

        debug!(
            "ReID比较: ID {} → 目标 {} 相似度 {:.3}",
            candidate.track_id(),
            target_id,
            similarity
        );

        (similarity > self.similarity_threshold).then_some(Reassignment {
            from_id: candidate.track_id(),
            similarity,
        })
    }
}

/// L2归一化; 零向量返回 None
pub fn l2_normalize(v: &[f32]) -> Option<Vec<f32>> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= 1e-6 || !norm.is_finite() {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

/// 余弦相似度; 维度不一致或含零向量时返回 None
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= 1e-6 || norm_b <= 1e-6 {
        return None;
    }
    Some(dot / (norm_a * norm_b))
}
