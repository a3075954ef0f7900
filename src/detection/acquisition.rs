//! 目标锁定 (Target Acquisition)
//!
//! 训练窗口内统计每个跟踪ID的出现次数, 窗口结束时锁定出现最多的ID。
//! 锁定后不可更改。
//!
//! - 并列时取最小的ID
//! - 窗口结束时若从未出现过检测, 继续统计直到出现第一帧有检测的画面

use std::collections::HashMap;

use tracing::{debug, info};

/// 当前帧的锁定阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// 训练中: 本帧检测只用于统计
    Training,
    /// 本帧刚完成锁定 (本帧检测已被训练消耗)
    JustLocked(u32),
    /// 已锁定
    Locked(u32),
}

#[derive(Clone, Debug)]
pub struct TargetAcquisition {
    frame_threshold: u64,
    tally: HashMap<u32, u32>,
    target: Option<u32>,
}

impl TargetAcquisition {
    /// 多数投票模式: 训练窗口长度为 `frame_threshold` 帧
    pub fn majority(frame_threshold: u64) -> Self {
        Self {
            frame_threshold,
            tally: HashMap::new(),
            target: None,
        }
    }

    /// 固定ID模式: 从第一帧起即锁定
    pub fn fixed(target_id: u32) -> Self {
        Self {
            frame_threshold: 0,
            tally: HashMap::new(),
            target: Some(target_id),
        }
    }

    pub fn frame_threshold(&self) -> u64 {
        self.frame_threshold
    }

    pub fn target(&self) -> Option<u32> {
        self.target
    }

    pub fn tally(&self) -> &HashMap<u32, u32> {
        &self.tally
    }

    /// 处理一帧的目标类别检测ID
    ///
    /// `frame_index` 从1开始, 单调递增
    pub fn observe<I>(&mut self, frame_index: u64, track_ids: I) -> Phase
    where
        I: IntoIterator<Item = u32>,
    {
        if let Some(id) = self.target {
            return Phase::Locked(id);
        }

        for id in track_ids {
            *self.tally.entry(id).or_insert(0) += 1;
        }

        if frame_index < self.frame_threshold {
            return Phase::Training;
        }

        match majority_id(&self.tally) {
            Some(id) => {
                self.target = Some(id);
                info!(
                    "🎯 目标ID已锁定: {} (帧 {}, 出现 {} 次, 候选 {} 个)",
                    id,
                    frame_index,
                    self.tally[&id],
                    self.tally.len()
                );
                Phase::JustLocked(id)
            }
            None => {
                debug!("训练窗口结束但尚无检测, 继续统计 (帧 {})", frame_index);
                Phase::Training
            }
        }
    }
}

/// 出现次数最多的ID, 并列时取最小ID; 空表返回 None
pub fn majority_id(tally: &HashMap<u32, u32>) -> Option<u32> {
    tally
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_most_frequent_id_at_threshold() {
        let mut acq = TargetAcquisition::majority(3);
        assert_eq!(acq.observe(1, [7]), Phase::Training);
        assert_eq!(acq.observe(2, [7, 9]), Phase::Training);
        assert_eq!(acq.observe(3, [7]), Phase::JustLocked(7));
        assert_eq!(acq.observe(4, [9]), Phase::Locked(7));
        assert_eq!(acq.target(), Some(7));
    }

    #[test]
    fn tally_is_frozen_after_lock() {
        let mut acq = TargetAcquisition::majority(2);
        acq.observe(1, [1]);
        acq.observe(2, [1]);
        acq.observe(3, [2, 2, 2]);
        assert_eq!(acq.tally().get(&2), None);
        assert_eq!(acq.tally()[&1], 2);
    }

    #[test]
    fn ties_resolve_to_lowest_id() {
        let mut tally = HashMap::new();
        tally.insert(12, 5);
        tally.insert(3, 5);
        tally.insert(8, 5);
        tally.insert(1, 2);
        assert_eq!(majority_id(&tally), Some(3));
    }

    #[test]
    fn empty_tally_has_no_majority() {
        assert_eq!(majority_id(&HashMap::new()), None);
    }

    #[test]
    fn extends_training_until_first_detection() {
        let mut acq = TargetAcquisition::majority(2);
        assert_eq!(acq.observe(1, []), Phase::Training);
        assert_eq!(acq.observe(2, []), Phase::Training);
        assert_eq!(acq.observe(3, []), Phase::Training);
        assert_eq!(acq.observe(4, [5]), Phase::JustLocked(5));
        assert_eq!(acq.observe(5, [5]), Phase::Locked(5));
    }

    #[test]
    fn zero_threshold_locks_on_first_detection() {
        let mut acq = TargetAcquisition::majority(0);
        assert_eq!(acq.observe(1, []), Phase::Training);
        assert_eq!(acq.observe(2, [4, 6]), Phase::JustLocked(4));
    }

    #[test]
    fn fixed_mode_is_locked_from_start() {
        let mut acq = TargetAcquisition::fixed(1);
        assert_eq!(acq.observe(1, [2, 3]), Phase::Locked(1));
        assert!(acq.tally().is_empty());
    }

    #[test]
    fn counts_repeated_ids_within_one_frame() {
        let mut acq = TargetAcquisition::majority(2);
        acq.observe(1, [0, 0]);
        assert_eq!(acq.observe(2, [3]), Phase::JustLocked(0));
    }
}
