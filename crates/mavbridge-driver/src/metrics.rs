//! 桥接性能/诊断指标
//!
//! 全部为原子计数器：桥接循环单线程写入，任意线程可随时读取快照。

use std::sync::atomic::{AtomicU64, Ordering};

/// 桥接指标（原子计数器集合）
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    /// 链路读入的总字节数
    pub rx_bytes: AtomicU64,
    /// 成功翻译的帧数
    pub packets_translated: AtomicU64,
    /// 校验失败丢弃的帧数
    pub packets_dropped: AtomicU64,
    /// 未登记消息 ID 的帧数（no-op，不算错误）
    pub unknown_messages: AtomicU64,
    /// 重连尝试次数
    pub reconnects: AtomicU64,
    /// 链路错误次数（读/写/轮询失败）
    pub link_errors: AtomicU64,
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取一致性要求不高的快照（各计数器独立 Relaxed 读取）
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            packets_translated: self.packets_translated.load(Ordering::Relaxed),
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            unknown_messages: self.unknown_messages.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            link_errors: self.link_errors.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub rx_bytes: u64,
    pub packets_translated: u64,
    pub packets_dropped: u64,
    pub unknown_messages: u64,
    pub reconnects: u64,
    pub link_errors: u64,
}
