//! 桥接配置
//!
//! 所有字段来自外部注入（CLI 的 TOML 文件或上层程序），桥接只读。

use std::net::IpAddr;
use std::time::Duration;

use mavbridge_link::{LinkConfig, LinkMode};
use serde::Deserialize;
use tracing::warn;

use crate::error::DriverError;

/// 通信超时允许范围（秒）
const COMM_TIMEOUT_MIN_S: u64 = 1;
const COMM_TIMEOUT_MAX_S: u64 = 60;

/// 桥接配置
///
/// # Example
///
/// ```
/// use mavbridge_driver::BridgeConfig;
///
/// // 使用默认配置（TCP 127.0.0.1:5760，10s 通信超时）
/// let config = BridgeConfig::default();
///
/// // TOML 反序列化（未出现的字段取默认值）
/// let config: BridgeConfig = toml::from_str(r#"
///     transport = "udp"
///     udp_listen_port = 14557
///     comm_timeout_s = 5
/// "#).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// 通信超时（秒），界内 1-60
    pub comm_timeout_s: u64,
    /// 传输方式
    pub transport: LinkMode,
    /// TCP 目标地址
    pub tcp_addr: IpAddr,
    /// TCP 目标端口
    pub tcp_port: u16,
    /// UDP 本地监听端口
    pub udp_listen_port: u16,
    /// UDP 对端地址
    pub udp_addr: IpAddr,
    /// UDP 对端端口
    pub udp_port: u16,
    /// TCP 连接超时（毫秒）
    pub connect_timeout_ms: u64,
    /// 单次就绪轮询超时（毫秒）
    pub poll_timeout_ms: u64,
    /// 单个节拍最多处理的帧数
    pub packet_cap: usize,
    /// 无链路时重试前的休眠（毫秒）
    pub reconnect_delay_ms: u64,
    /// 连接建立后请求的数据流速率（Hz）；None 表示不发请求
    pub stream_rate: Option<u8>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            comm_timeout_s: 10,
            transport: LinkMode::Tcp,
            tcp_addr: IpAddr::from([127, 0, 0, 1]),
            tcp_port: 5760,
            udp_listen_port: 14557,
            udp_addr: IpAddr::from([127, 0, 0, 1]),
            udp_port: 14556,
            connect_timeout_ms: 5000,
            poll_timeout_ms: 10,
            packet_cap: 100,
            reconnect_delay_ms: 500,
            stream_rate: None,
        }
    }
}

impl BridgeConfig {
    /// 校验并收敛越界值
    ///
    /// 通信超时收敛到允许区间（越界只告警不报错，桥接要能带病启动）；
    /// 帧数上限为 0 属于配置错误。
    pub fn validate(&mut self) -> Result<(), DriverError> {
        let clamped = self
            .comm_timeout_s
            .clamp(COMM_TIMEOUT_MIN_S, COMM_TIMEOUT_MAX_S);
        if clamped != self.comm_timeout_s {
            warn!(
                "comm_timeout_s {} out of range, clamped to {}",
                self.comm_timeout_s, clamped
            );
            self.comm_timeout_s = clamped;
        }

        if self.packet_cap == 0 {
            return Err(DriverError::InvalidConfig(
                "packet_cap must be non-zero".into(),
            ));
        }
        if self.poll_timeout_ms == 0 {
            return Err(DriverError::InvalidConfig(
                "poll_timeout_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// 派生链路层配置
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            mode: self.transport,
            tcp_addr: self.tcp_addr,
            tcp_port: self.tcp_port,
            udp_listen_port: self.udp_listen_port,
            udp_addr: self.udp_addr,
            udp_port: self.udp_port,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }

    pub fn comm_timeout(&self) -> Duration {
        Duration::from_secs(self.comm_timeout_s)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.comm_timeout_s, 10);
        assert_eq!(config.transport, LinkMode::Tcp);
        assert_eq!(config.tcp_port, 5760);
        assert_eq!(config.udp_listen_port, 14557);
        assert_eq!(config.udp_port, 14556);
        assert_eq!(config.packet_cap, 100);
        assert_eq!(config.poll_timeout_ms, 10);
        assert_eq!(config.reconnect_delay_ms, 500);
        assert_eq!(config.stream_rate, None);
    }

    #[test]
    fn test_comm_timeout_is_clamped() {
        let mut config = BridgeConfig {
            comm_timeout_s: 0,
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.comm_timeout_s, 1);

        let mut config = BridgeConfig {
            comm_timeout_s: 300,
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.comm_timeout_s, 60);
    }

    #[test]
    fn test_zero_packet_cap_rejected() {
        let mut config = BridgeConfig {
            packet_cap: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config: BridgeConfig = toml::from_str(
            r#"
            transport = "udp"
            udp_listen_port = 15000
            comm_timeout_s = 5
            stream_rate = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.transport, LinkMode::Udp);
        assert_eq!(config.udp_listen_port, 15000);
        assert_eq!(config.comm_timeout_s, 5);
        assert_eq!(config.stream_rate, Some(10));
        // 未出现的字段保持默认
        assert_eq!(config.tcp_port, 5760);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<BridgeConfig, _> = toml::from_str("tcp_prot = 1");
        assert!(result.is_err());
    }
}
