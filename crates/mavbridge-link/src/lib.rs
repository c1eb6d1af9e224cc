//! # MavBridge Link Layer
//!
//! 遥测链路传输抽象层，提供统一的读/写/就绪轮询接口。
//!
//! 同一时刻最多存在一个活跃链路；任何读写失败都由上层整体拆除并
//! 重建链路，本层不做部分修复。

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

pub mod tcp;
pub mod udp;

pub use tcp::TcpLink;
pub use udp::UdpLink;

/// 链路层统一错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection closed by peer")]
    Closed,
    #[error("Link not connected")]
    NotConnected,
}

/// 传输方式选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LinkMode {
    /// 主动外连（dial-out）
    Tcp,
    /// 绑定监听端口 + 固定对端（bind-and-peer）
    Udp,
}

/// 链路配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub mode: LinkMode,
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
    /// TCP 连接超时
    pub connect_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            mode: LinkMode::Tcp,
            tcp_addr: IpAddr::from([127, 0, 0, 1]),
            tcp_port: 5760,
            udp_listen_port: 14557,
            udp_addr: IpAddr::from([127, 0, 0, 1]),
            udp_port: 14556,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// 遥测链路统一接口
///
/// - `poll`：检查读就绪，不消费数据，阻塞不超过 `timeout`
/// - `read`：非阻塞读，无数据就绪时返回 0
/// - `write`：非阻塞写，返回写出的字节数
///
/// 任何方法返回 `Err` 都意味着链路不可再用，调用方应整体丢弃并重连。
pub trait Link {
    fn poll(&mut self, timeout: Duration) -> Result<bool, LinkError>;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;
    fn write(&mut self, buf: &[u8]) -> Result<usize, LinkError>;
}

/// 按配置建立链路
pub fn open(config: &LinkConfig) -> Result<Box<dyn Link + Send>, LinkError> {
    match config.mode {
        LinkMode::Tcp => Ok(Box::new(TcpLink::connect(
            config.tcp_addr,
            config.tcp_port,
            config.connect_timeout,
        )?)),
        LinkMode::Udp => Ok(Box::new(UdpLink::bind(
            config.udp_listen_port,
            config.udp_addr,
            config.udp_port,
        )?)),
    }
}
