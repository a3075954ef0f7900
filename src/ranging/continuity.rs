//! 连续性过滤 (Continuity Filter)
//!
//! 相邻两帧距离变化超过阈值时视为噪声, 沿用上一帧接受的距离。
//! 状态始终更新为本帧接受的值, 因此被拒绝的跳变会与同一个保持值继续比较,
//! 估计值回到附近后即可恢复。

use tracing::warn;

/// 默认跳变阈值 (cm)
pub const DEFAULT_JUMP_THRESHOLD: f32 = 100.0;

/// 过滤结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    Accepted(f32),
    /// 跳变被拒绝: (原始估计, 沿用的距离)
    Rejected { raw: f32, held: f32 },
}

impl Verdict {
    /// 本帧最终使用的距离
    pub fn distance(&self) -> f32 {
        match *self {
            Verdict::Accepted(d) => d,
            Verdict::Rejected { held, .. } => held,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Verdict::Rejected { .. })
    }
}

#[derive(Clone, Debug)]
pub struct ContinuityFilter {
    jump_threshold: f32,
    previous: Option<f32>,
}

impl Default for ContinuityFilter {
    fn default() -> Self {
        Self::new(DEFAULT_JUMP_THRESHOLD)
    }
}

impl ContinuityFilter {
    pub fn new(jump_threshold: f32) -> Self {
        Self {
            jump_threshold,
            previous: None,
        }
    }

    pub fn previous(&self) -> Option<f32> {
        self.previous
    }

    pub fn jump_threshold(&self) -> f32 {
        self.jump_threshold
    }

    /// 处理新的距离估计, 返回本帧接受的值
    pub fn accept(&mut self, distance: f32) -> Verdict {
        let verdict = match self.previous {
            Some(prev) if (distance - prev).abs() > self.jump_threshold => {
                warn!(
                    "⚠️  距离跳变过大 ({:.2} → {:.2}), 沿用上一帧距离",
                    prev, distance
                );
                Verdict::Rejected {
                    raw: distance,
                    held: prev,
                }
            }
            _ => Verdict::Accepted(distance),
        };
        self.previous = Some(verdict.distance());
        verdict
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_estimate_is_always_accepted() {
        let mut filter = ContinuityFilter::default();
        assert_eq!(filter.accept(5000.0), Verdict::Accepted(5000.0));
        assert_eq!(filter.previous(), Some(5000.0));
    }

    #[test]
    fn large_jump_reuses_previous_value() {
        let mut filter = ContinuityFilter::default();
        filter.accept(250.0);
        let v = filter.accept(400.0);
        assert_eq!(v, Verdict::Rejected { raw: 400.0, held: 250.0 });
        assert_eq!(v.distance(), 250.0);
        assert_eq!(filter.previous(), Some(250.0));
    }

    #[test]
    fn small_change_is_accepted_as_is() {
        let mut filter = ContinuityFilter::default();
        filter.accept(250.0);
        assert_eq!(filter.accept(350.0), Verdict::Accepted(350.0));
        assert_eq!(filter.accept(300.5), Verdict::Accepted(300.5));
    }

    #[test]
    fn recovers_once_estimates_return_near_held_value() {
        let mut filter = ContinuityFilter::default();
        filter.accept(200.0);
        assert!(filter.accept(450.0).is_rejected());
        assert!(filter.accept(460.0).is_rejected());
        assert_eq!(filter.accept(290.0), Verdict::Accepted(290.0));
        assert_eq!(filter.accept(380.0), Verdict::Accepted(380.0));
    }

    #[test]
    fn custom_threshold() {
        let mut filter = ContinuityFilter::new(50.0);
        filter.accept(100.0);
        assert!(filter.accept(160.0).is_rejected());
        filter.reset();
        assert_eq!(filter.accept(160.0), Verdict::Accepted(160.0));
    }
}
