//! 驱动层错误类型定义

use mavbridge_link::LinkError;
use mavbridge_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 注意：链路丢失与解析失败不会以错误形式出现在这里——桥接循环
/// 就地恢复它们（重连/重新同步），对外只有诊断与状态事件。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 链路错误
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// 协议错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 配置无效
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
