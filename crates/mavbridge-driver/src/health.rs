//! 链路健康监视
//!
//! 记录最近一次成功处理帧的时间，按通信超时做 edge-triggered 的
//! missing-data 判定：超时只在进入缺数据状态的那一刻报告一次，
//! 其后保持沉默；任何新帧把状态拉回正常，恢复同样只报告一次。

use std::time::{Duration, Instant};

/// 链路健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Normal,
    Missing,
}

/// 链路健康监视器
#[derive(Debug)]
pub struct LinkHealthMonitor {
    timeout: Duration,
    last_packet: Instant,
    missing: bool,
}

impl LinkHealthMonitor {
    /// 创建监视器，以当前时刻作为初始基准
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_packet: Instant::now(),
            missing: false,
        }
    }

    /// 登记一帧有效数据（任何成功翻译的帧都会调用）
    pub fn register_packet(&mut self, now: Instant) {
        self.last_packet = now;
    }

    /// 每个调度节拍调用一次；状态发生转换时返回新状态，否则 None
    pub fn tick(&mut self, now: Instant) -> Option<LinkStatus> {
        let timed_out = now.duration_since(self.last_packet) >= self.timeout;
        if timed_out {
            if !self.missing {
                self.missing = true;
                return Some(LinkStatus::Missing);
            }
        } else if self.missing {
            self.missing = false;
            return Some(LinkStatus::Normal);
        }
        None
    }

    /// 当前是否处于缺数据状态
    pub fn is_missing(&self) -> bool {
        self.missing
    }

    /// 当前状态
    pub fn status(&self) -> LinkStatus {
        if self.missing {
            LinkStatus::Missing
        } else {
            LinkStatus::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fires_exactly_once() {
        let mut monitor = LinkHealthMonitor::new(Duration::from_secs(10));
        let t0 = Instant::now();
        monitor.register_packet(t0);

        // 未超时
        assert_eq!(monitor.tick(t0 + Duration::from_secs(9)), None);

        // 超时边沿：恰好一次
        assert_eq!(
            monitor.tick(t0 + Duration::from_secs(10)),
            Some(LinkStatus::Missing)
        );
        assert_eq!(monitor.tick(t0 + Duration::from_secs(11)), None);
        assert_eq!(monitor.tick(t0 + Duration::from_secs(60)), None);
        assert!(monitor.is_missing());
    }

    #[test]
    fn test_packet_clears_back_to_normal_once() {
        let mut monitor = LinkHealthMonitor::new(Duration::from_secs(10));
        let t0 = Instant::now();
        monitor.register_packet(t0);

        assert_eq!(
            monitor.tick(t0 + Duration::from_secs(15)),
            Some(LinkStatus::Missing)
        );

        // 新帧到来，下一个节拍报告恢复，且只报告一次
        monitor.register_packet(t0 + Duration::from_secs(16));
        assert_eq!(
            monitor.tick(t0 + Duration::from_secs(16)),
            Some(LinkStatus::Normal)
        );
        assert_eq!(monitor.tick(t0 + Duration::from_secs(17)), None);
        assert_eq!(monitor.status(), LinkStatus::Normal);
    }

    #[test]
    fn test_no_transition_while_healthy() {
        let mut monitor = LinkHealthMonitor::new(Duration::from_secs(10));
        let t0 = Instant::now();
        for i in 0..20 {
            monitor.register_packet(t0 + Duration::from_secs(i));
            assert_eq!(monitor.tick(t0 + Duration::from_secs(i)), None);
        }
    }
}
