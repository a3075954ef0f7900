/// 检测系统 (Detection System)
///
/// 每帧的检测结果依次经过:
/// - Filter:      类别过滤
/// - Acquisition: 训练窗口内锁定目标ID
/// - ReID:        外观特征重识别 (可选)
pub mod acquisition;
pub mod filter;
pub mod reid;
pub mod types;

pub use acquisition::{majority_id, Phase, TargetAcquisition};
pub use filter::ClassFilter;
pub use reid::{IdentityMatcher, Reassignment};
pub use types::{Detection, NormalizedBox, DEFAULT_TARGET_CLASS};
