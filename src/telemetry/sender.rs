//! 遥测发送 (Telemetry Sender)
//!
//! UDP单向发送, 无应答无重传。发送失败只记录日志并计入丢弃数,
//! 不会中断帧处理。

use std::io;
use std::net::{SocketAddr, SocketAddrV4, UdpSocket};

use tracing::{debug, warn};

use super::message::TelemetryMessage;

/// 报文出口 (UDP / 内存)
pub trait TelemetrySink {
    fn send(&mut self, payload: &[u8]) -> io::Result<()>;

    /// 目的地描述 (日志用)
    fn describe(&self) -> String;
}

// ========== UDP ==========

/// UDP出口: 套接字在构造时绑定一次, 随对象释放
pub struct UdpSink {
    socket: UdpSocket,
    dest: SocketAddr,
}

impl UdpSink {
    /// 绑定本地任意端口并切换为非阻塞模式
    pub fn bind(dest: SocketAddrV4) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            dest: SocketAddr::V4(dest),
        })
    }
}

impl TelemetrySink for UdpSink {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let n = self.socket.send_to(payload, self.dest)?;
        if n != payload.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram: {} of {} bytes", n, payload.len()),
            ));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("udp://{}", self.dest)
    }
}

// ========== 内存 ==========

/// 内存出口: 记录所有报文 (测试/演练用)
#[derive(Debug, Default)]
pub struct MemorySink {
    sent: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }
}

impl TelemetrySink for MemorySink {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.sent.push(String::from_utf8_lossy(payload).into_owned());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ========== 发送器 ==========

/// 发送统计
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TelemetryStats {
    pub sent: u64,
    pub dropped: u64,
}

pub struct TelemetrySender<S> {
    sink: S,
    mirror_x: bool,
    stats: TelemetryStats,
}

impl<S: TelemetrySink> TelemetrySender<S> {
    pub fn new(sink: S, mirror_x: bool) -> Self {
        Self {
            sink,
            mirror_x,
            stats: TelemetryStats::default(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn stats(&self) -> TelemetryStats {
        self.stats
    }

    /// 发送一条报文, 返回实际发出的文本; 失败返回 None
    pub fn emit(&mut self, message: TelemetryMessage) -> Option<String> {
        let message = if self.mirror_x {
            message.mirrored()
        } else {
            message
        };
        let payload = message.payload();

        match self.sink.send(payload.as_bytes()) {
            Ok(()) => {
                self.stats.sent += 1;
                debug!("📡 已发送: {}", payload);
                Some(payload)
            }
            Err(e) => {
                self.stats.dropped += 1;
                warn!(
                    "❌ 遥测发送失败 ({}): {} [已丢弃 {}]",
                    self.sink.describe(),
                    e,
                    self.stats.dropped
                );
                None
            }
        }
    }
}
