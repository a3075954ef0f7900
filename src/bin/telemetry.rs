//! 目标测距遥测 (Target Ranging Telemetry)
//!
//! 系统架构:
//! 1. 读取线程: 逐行解析上游导出的检测结果 → 发送FrameRecord
//! 2. 处理线程: 目标锁定 + 测距 + 跳变过滤 → UDP报文
//!
//! 直接运行: cargo run --bin telemetry -- --input detections.jsonl

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{bounded, Receiver};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use target_telemetry::{
    read_frames, FrameProcessor, FrameRecord, MemorySink, TelemetryConfig, TelemetrySink,
};

/// 遥测程序参数
#[derive(Parser, Debug)]
#[command(author, version, about = "目标测距UDP遥测", long_about = None)]
struct Args {
    /// 配置文件 (不存在时写出默认配置)
    #[arg(short, long, default_value = "telemetry_config.json")]
    config: PathBuf,

    /// 检测结果输入 (JSON Lines, `-` 为标准输入)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// FPGA地址 (覆盖配置)
    #[arg(long)]
    dest_ip: Option<String>,

    /// FPGA端口 (覆盖配置)
    #[arg(long)]
    port: Option<u16>,

    /// 训练窗口帧数 (覆盖配置)
    #[arg(long)]
    frame_threshold: Option<u64>,

    /// 跳变阈值cm (覆盖配置)
    #[arg(long)]
    jump_threshold: Option<f32>,

    /// 水平镜像center_x
    #[arg(long)]
    mirror_x: bool,

    /// 只打印报文, 不发送
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn apply(&self, config: &mut TelemetryConfig) {
        if let Some(ip) = &self.dest_ip {
            config.telemetry.dest_ip = ip.clone();
        }
        if let Some(port) = self.port {
            config.telemetry.port = port;
        }
        if let Some(n) = self.frame_threshold {
            config.acquisition.frame_threshold = n;
        }
        if let Some(t) = self.jump_threshold {
            config.continuity.jump_threshold = t;
        }
        if self.mirror_x {
            config.telemetry.mirror_x = true;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = TelemetryConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    args.apply(&mut config);
    config.validate().context("invalid telemetry configuration")?;
    config.log_summary();

    let reader: Box<dyn BufRead + Send> = if args.input == "-" {
        info!("📥 输入: 标准输入");
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&args.input).with_context(|| format!("opening {}", args.input))?;
        info!("📥 输入: {}", args.input);
        Box::new(BufReader::new(file))
    };

    // 读取线程 → 处理线程
    let (tx, rx) = bounded::<FrameRecord>(60);
    let reader_handle = std::thread::Builder::new()
        .name("frame-reader".into())
        .spawn(move || {
            for record in read_frames(reader) {
                match record {
                    Ok(frame) => {
                        if tx.send(frame).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.is_fatal() => {
                        error!("❌ 读取输入失败: {:#}", anyhow::Error::from(e));
                        break;
                    }
                    Err(e) => {
                        // 无法解析的行按空帧处理, 保持帧计数连续
                        warn!("⚠️  无效行按空帧处理: {:#}", anyhow::Error::from(e));
                        if tx.send(FrameRecord::default()).is_err() {
                            break;
                        }
                    }
                }
            }
        })
        .context("spawning reader thread")?;

    if args.dry_run {
        info!("🧪 演练模式: 报文只打印不发送");
        let processor = FrameProcessor::from_config(&config, MemorySink::new())?;
        run(processor, rx, |sink: &mut MemorySink| {
            for payload in sink.take() {
                info!("Sent message: {}", payload);
            }
        });
    } else {
        let processor = FrameProcessor::bind(&config)?;
        run(processor, rx, |_| {});
    }

    if reader_handle.join().is_err() {
        warn!("读取线程异常退出");
    }
    Ok(())
}

/// 处理循环: 按到达顺序逐帧处理, 输入结束后退出
fn run<S, F>(mut processor: FrameProcessor<S>, rx: Receiver<FrameRecord>, mut after_frame: F)
where
    S: TelemetrySink,
    F: FnMut(&mut S),
{
    info!("🔍 处理线程等待数据...");
    let start = Instant::now();
    let mut frames = 0u64;

    while let Ok(record) = rx.recv() {
        let report = match record.frame {
            Some(index) => processor.process_frame(index, &record.detections),
            None => processor.process_next(&record.detections),
        };
        frames += 1;
        if report.skipped > 0 {
            warn!("帧 {}: {} 个目标检测几何无效", report.frame_index, report.skipped);
        }
        after_frame(processor.sink_mut());
    }

    let stats = processor.stats();
    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "✅ 输入结束: {} 帧, 已发送 {}, 丢弃 {}, 目标ID {:?}, 用时 {:.2}s",
        frames,
        stats.sent,
        stats.dropped,
        processor.target(),
        elapsed
    );
}
