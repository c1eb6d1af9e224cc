//! # MavBridge CLI
//!
//! 遥测桥接命令行工具。
//!
//! ```bash
//! # 以默认配置（TCP 127.0.0.1:5760）运行桥接，只输出日志
//! mavbridge-cli run
//!
//! # 使用 TOML 配置，并把每条规范化遥测记录打印到 stdout
//! mavbridge-cli --config bridge.toml monitor
//! ```
//!
//! Ctrl-C 置位停止信号，桥接在节拍边界干净退出。

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use tracing::{info, warn};

use mavbridge_driver::{BridgeBuilder, BridgeConfig, BridgeEvent, LinkEvent};

/// MavBridge CLI - 遥测桥接命令行工具
#[derive(Parser, Debug)]
#[command(name = "mavbridge-cli")]
#[command(about = "Telemetry bridge between an autopilot link and a canonical event bus", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML 配置文件路径（缺省用内置默认值）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 运行桥接，链路状态转换走日志
    Run,

    /// 运行桥接并把每条遥测记录打印到 stdout
    Monitor,
}

fn load_config(path: Option<&PathBuf>) -> Result<BridgeConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config file {}", path.display()))
        },
        None => Ok(BridgeConfig::default()),
    }
}

/// 事件消费线程：总线发送端随 Bridge 一起销毁后自然退出
fn consume_events(rx: Receiver<BridgeEvent>, print_telemetry: bool) {
    for event in rx {
        match event {
            BridgeEvent::Telemetry(record) => {
                if print_telemetry {
                    println!("{:?}", record);
                }
            },
            BridgeEvent::Link(LinkEvent::Active) => info!("link active"),
            BridgeEvent::Link(LinkEvent::MissingData) => warn!("link missing data"),
            BridgeEvent::Link(LinkEvent::ConnectionFailed) => {
                warn!("link connection failed, bridge is retrying")
            },
        }
    }
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mavbridge_driver=info".parse()?)
                .add_directive("mavbridge_link=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::Relaxed);
    })
    .context("failed to install Ctrl-C handler")?;

    let print_telemetry = matches!(&cli.command, Commands::Monitor);

    let (mut bridge, rx) = BridgeBuilder::new().config(config).build()?;
    let rx = rx.expect("builder without injected bus always returns a receiver");

    let consumer = thread::spawn(move || consume_events(rx, print_telemetry));

    info!("bridge starting ({:?})", cli.command);
    bridge.run(&stop);

    // Bridge 退出后发送端销毁，消费线程读空通道后结束
    drop(bridge);
    if consumer.join().is_err() {
        warn!("event consumer thread panicked");
    }

    info!("bridge stopped");
    Ok(())
}
