/// 遥测系统 (Telemetry System)
///
/// 把 (中心点, 距离) 编码成ASCII报文, 通过UDP发往FPGA/执行端
pub mod message;
pub mod sender;

pub use message::TelemetryMessage;
pub use sender::{MemorySink, TelemetrySender, TelemetrySink, TelemetryStats, UdpSink};
