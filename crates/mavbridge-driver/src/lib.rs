//! # MavBridge Driver
//!
//! 遥测桥接驱动层：把自驾仪链路上的二进制帧翻译成载具内部的
//! 规范化状态，并以事件形式发布到外部总线。包括：
//!
//! - 桥接循环（连接管理、有界轮询、单节拍帧数上限、无退避重连）
//! - 消息分发与语义翻译（单位换算、merge-not-replace 聚合）
//! - 链路健康监视（edge-triggered missing-data）
//! - 共享读取上下文（ArcSwap 无锁快照）与指标
//!
//! # 并发模型
//!
//! 单逻辑线程、协作式调度：桥接循环是所有内部状态的唯一写者，
//! 阻塞点（轮询、休眠）都有固定上界；停止信号在节拍边界检查。

mod builder;
pub mod bridge;
pub mod config;
mod error;
pub mod events;
pub mod health;
pub mod metrics;
pub mod state;
pub mod translate;

pub use builder::BridgeBuilder;
pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::DriverError;
pub use events::{AutonomyLevel, BridgeEvent, EventBus, LinkEvent, TelemetryEvent};
pub use health::{LinkHealthMonitor, LinkStatus};
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use state::*;
pub use translate::{Aggregates, translate_packet};
