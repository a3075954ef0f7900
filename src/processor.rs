//! 帧处理器 (Frame Processor)
//! 职责: 每帧检测结果 → 目标锁定 → 测距 → 跳变过滤 → UDP遥测
//!
//! 所有跨帧状态 (训练统计 / 锁定ID / 上一帧距离 / ReID参考特征) 都归处理器独占。
//! 处理器本身不开线程; 多线程调用时使用 `SharedProcessor` 串行化整帧更新。

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AcquisitionMode, ConfigError, TelemetryConfig};
use crate::detection::{ClassFilter, Detection, IdentityMatcher, Phase, TargetAcquisition};
use crate::ranging::{Calibration, ContinuityFilter, DistanceEstimator, Verdict};
use crate::telemetry::{TelemetryMessage, TelemetrySender, TelemetrySink, TelemetryStats, UdpSink};

/// 启动错误 (致命)
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open telemetry socket")]
    Socket(#[source] io::Error),
}

/// 单个目标检测的测距结果
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub track_id: u32,
    /// ReID重新分配前的原始ID
    pub reassigned_from: Option<u32>,
    pub confidence: f32,
    pub center: (f32, f32),
    pub raw_distance: f32,
    pub verdict: Verdict,
    /// 实际发出的报文; 发送失败为 None
    pub payload: Option<String>,
}

/// 单帧处理结果
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub phase: Phase,
    /// 目标类别检测数
    pub candidates: usize,
    pub measurements: Vec<Measurement>,
    /// 几何无效而跳过的目标检测数
    pub skipped: usize,
}

impl FrameReport {
    /// 本帧发出的报文数
    pub fn sent(&self) -> usize {
        self.measurements.iter().filter(|m| m.payload.is_some()).count()
    }

    pub fn payloads(&self) -> impl Iterator<Item = &str> {
        self.measurements.iter().filter_map(|m| m.payload.as_deref())
    }
}

pub struct FrameProcessor<S> {
    filter: ClassFilter,
    acquisition: TargetAcquisition,
    matcher: Option<IdentityMatcher>,
    estimator: DistanceEstimator,
    continuity: ContinuityFilter,
    sender: TelemetrySender<S>,
    frame_count: u64,
}

impl FrameProcessor<UdpSink> {
    /// 按配置打开UDP套接字 (启动时调用一次)
    pub fn bind(config: &TelemetryConfig) -> Result<Self, StartupError> {
        let dest = config.destination()?;
        let sink = UdpSink::bind(dest).map_err(StartupError::Socket)?;
        info!("📡 UDP遥测目的地: {}", dest);
        Ok(Self::from_config(config, sink)?)
    }
}

impl<S: TelemetrySink> FrameProcessor<S> {
    pub fn from_config(config: &TelemetryConfig, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;

        let acquisition = match config.acquisition.mode {
            AcquisitionMode::Majority => {
                TargetAcquisition::majority(config.acquisition.frame_threshold)
            }
            AcquisitionMode::Fixed => TargetAcquisition::fixed(config.acquisition.fixed_target_id),
        };

        let c = &config.calibration;
        let calibration = Calibration::new(c.ref_width, c.ref_height, c.ref_distance)?;

        Ok(Self {
            filter: ClassFilter::new(config.target_class.clone(), config.min_confidence),
            acquisition,
            matcher: config
                .reid
                .enabled
                .then(|| IdentityMatcher::new(config.reid.similarity_threshold)),
            estimator: DistanceEstimator::new(calibration),
            continuity: ContinuityFilter::new(config.continuity.jump_threshold),
            sender: TelemetrySender::new(sink, config.telemetry.mirror_x),
            frame_count: 0,
        })
    }

    pub fn target(&self) -> Option<u32> {
        self.acquisition.target()
    }

    pub fn acquisition(&self) -> &TargetAcquisition {
        &self.acquisition
    }

    pub fn previous_distance(&self) -> Option<f32> {
        self.continuity.previous()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn stats(&self) -> TelemetryStats {
        self.sender.stats()
    }

    pub fn sink(&self) -> &S {
        self.sender.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.sender.sink_mut()
    }

    /// 用内部帧计数处理下一帧
    pub fn process_next(&mut self, detections: &[Detection]) -> FrameReport {
        self.process_frame(self.frame_count + 1, detections)
    }

    /// 处理一帧 (`frame_index` 从1开始)
    pub fn process_frame(&mut self, frame_index: u64, detections: &[Detection]) -> FrameReport {
        if frame_index <= self.frame_count {
            warn!(
                "⚠️  帧序号未递增: {} (上一帧 {})",
                frame_index, self.frame_count
            );
        }
        self.frame_count = frame_index;

        let candidates = self.filter.apply(detections);
        let phase = self
            .acquisition
            .observe(frame_index, candidates.iter().map(|d| d.track_id()));

        let mut report = FrameReport {
            frame_index,
            phase,
            candidates: candidates.len(),
            measurements: Vec::new(),
            skipped: 0,
        };

        let Phase::Locked(target_id) = phase else {
            debug!(
                "帧 {}: 训练中, {} 个{}检测",
                frame_index,
                candidates.len(),
                self.filter.target_class()
            );
            return report;
        };

        for (detection, reassigned_from) in self.select_targets(&candidates, target_id) {
            let bbox = &detection.bbox;
            let raw_distance = match self.estimator.estimate(bbox.width, bbox.height) {
                Ok(d) => d,
                Err(e) => {
                    warn!("帧 {}: 跳过目标检测 ({})", frame_index, e);
                    report.skipped += 1;
                    continue;
                }
            };

            let center = bbox.center();
            if !(center.0.is_finite() && center.1.is_finite()) {
                warn!(
                    "帧 {}: 跳过目标检测 (中心坐标无效: {}, {})",
                    frame_index, center.0, center.1
                );
                report.skipped += 1;
                continue;
            }
            let verdict = self.continuity.accept(raw_distance);
            let payload = self.sender.emit(TelemetryMessage::new(
                center.0,
                center.1,
                verdict.distance(),
            ));

            debug!(
                "帧 {}: ID {} 标签 {} 置信度 {:.2} 中心 ({:.4}, {:.4}) 距离 {:.2}",
                frame_index,
                target_id,
                detection.label,
                detection.confidence,
                center.0,
                center.1,
                verdict.distance()
            );

            report.measurements.push(Measurement {
                track_id: target_id,
                reassigned_from,
                confidence: detection.confidence,
                center,
                raw_distance,
                verdict,
                payload,
            });
        }

        report
    }

    /// 选出本帧属于锁定目标的检测
    ///
    /// 本帧没有锁定ID的检测时, 才尝试用ReID把相似度最高的一个检测重新分配为目标
    fn select_targets<'a>(
        &mut self,
        candidates: &[&'a Detection],
        target_id: u32,
    ) -> Vec<(&'a Detection, Option<u32>)> {
        let direct: Vec<(&'a Detection, Option<u32>)> = candidates
            .iter()
            .filter(|d| d.track_id() == target_id)
            .map(|d| (*d, None))
            .collect();

        let Some(matcher) = self.matcher.as_mut() else {
            return direct;
        };

        if !direct.is_empty() {
            for (detection, _) in &direct {
                matcher.remember(detection);
            }
            return direct;
        }

        let best = candidates
            .iter()
            .filter_map(|d| matcher.reassign(d, target_id).map(|r| (*d, r)))
            .max_by(|a, b| a.1.similarity.total_cmp(&b.1.similarity));

        match best {
            Some((detection, hit)) => {
                info!(
                    "↪️  ID {} 重新分配为目标 {} (相似度 {:.3})",
                    hit.from_id, target_id, hit.similarity
                );
                vec![(detection, Some(hit.from_id))]
            }
            None => Vec::new(),
        }
    }
}

// ========== 多线程共享 ==========

/// 可跨线程共享的处理器: 整帧更新在互斥锁内完成
pub struct SharedProcessor<S> {
    inner: Arc<Mutex<FrameProcessor<S>>>,
}

impl<S> Clone for SharedProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: TelemetrySink> SharedProcessor<S> {
    pub fn new(processor: FrameProcessor<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(processor)),
        }
    }

    /// 获取处理器; 其他线程在处理中panic时仍继续使用其状态
    pub fn lock(&self) -> MutexGuard<'_, FrameProcessor<S>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn process_frame(&self, frame_index: u64, detections: &[Detection]) -> FrameReport {
        self.lock().process_frame(frame_index, detections)
    }

    pub fn process_next(&self, detections: &[Detection]) -> FrameReport {
        self.lock().process_next(detections)
    }
}
