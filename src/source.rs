//! 帧数据源 (Frame Source)
//!
//! 上游推理管线导出的检测结果, 每行一个JSON对象:
//! `{"frame": 12, "detections": [ ... ]}`; 缺少 `frame` 表示"下一帧"。
//! 单个检测格式错误时只丢弃该检测, 同一行的其余检测照常处理。

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::detection::Detection;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read line {line}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed frame record on line {line}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl SourceError {
    /// 读取错误无法继续, 解析错误可跳过该行
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Io { .. })
    }
}

/// 单帧检测记录
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
    #[serde(default)]
    pub detections: Vec<Detection>,
    /// 本行被丢弃的无效检测数
    #[serde(skip)]
    pub rejected: usize,
}

/// 原始行: 检测先按JSON值读入, 再逐个转换
#[derive(Deserialize)]
struct RawFrameRecord {
    #[serde(default)]
    frame: Option<u64>,
    #[serde(default)]
    detections: Vec<serde_json::Value>,
}

fn parse_record(text: &str, line: usize) -> Result<FrameRecord, SourceError> {
    let raw: RawFrameRecord =
        serde_json::from_str(text).map_err(|source| SourceError::Parse { line, source })?;

    let mut record = FrameRecord {
        frame: raw.frame,
        detections: Vec::with_capacity(raw.detections.len()),
        rejected: 0,
    };
    for (i, value) in raw.detections.into_iter().enumerate() {
        match serde_json::from_value::<Detection>(value) {
            Ok(detection) => record.detections.push(detection),
            Err(e) => {
                warn!("⚠️  第 {} 行: 丢弃第 {} 个无效检测 ({})", line, i + 1, e);
                record.rejected += 1;
            }
        }
    }
    Ok(record)
}

/// 逐行解析JSON帧记录 (跳过空行)
pub fn read_frames<R: BufRead>(reader: R) -> impl Iterator<Item = Result<FrameRecord, SourceError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line_no = i + 1;
            match line {
                Ok(text) if text.trim().is_empty() => None,
                Ok(text) => Some(parse_record(&text, line_no)),
                Err(source) => Some(Err(SourceError::Io {
                    line: line_no,
                    source,
                })),
            }
        })
}
