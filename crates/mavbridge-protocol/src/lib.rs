//! # MavBridge Protocol
//!
//! 遥测链路二进制协议定义（无 I/O 依赖）
//!
//! ## 模块
//!
//! - `crc`: 帧校验和（MCRF4XX 滚动校验）
//! - `parser`: 增量式逐字节帧解析状态机
//! - `messages`: 消息 ID 枚举与各消息的载荷解码
//! - `encode`: 帧编码（数据流请求等出站帧）
//!
//! ## 帧格式
//!
//! ```text
//! +------+-----+-----+-------+--------+--------+- - - - -+--------+--------+
//! | STX  | LEN | SEQ | SYSID | COMPID | MSGID  | PAYLOAD | CRC_LO | CRC_HI |
//! +------+-----+-----+-------+--------+--------+- - - - -+--------+--------+
//! ```
//!
//! 校验和覆盖 SEQ..PAYLOAD（不含 STX/LEN），低字节在前。
//!
//! ## 字节序
//!
//! 载荷字段使用 Intel (LSB) 低位在前（小端字节序）。
//! 本模块提供了字节序读取工具函数。

pub mod crc;
pub mod encode;
pub mod messages;
pub mod parser;

// 重新导出常用类型
pub use encode::encode_frame;
pub use messages::*;
pub use parser::{FrameParser, Stage};

use thiserror::Error;

/// 帧起始字节
pub const STX: u8 = 0xFE;

/// 单帧最大载荷长度（LEN 字段为单字节）
pub const MAX_PAYLOAD_LEN: usize = 255;

/// 帧头 + 校验和开销（STX, LEN, SEQ, SYSID, COMPID, MSGID, CRC x2）
pub const FRAME_OVERHEAD: usize = 8;

/// 校验通过的完整遥测帧
///
/// # 设计目的
///
/// `Packet` 是解析层和语义翻译层之间的中间抽象：
/// - **层次解耦**：翻译层不接触字节流，只消费结构化的帧
/// - **自包含**：固定载荷缓冲区 + 有效长度，无堆分配、无生命周期
/// - **只进不留**：由解析器在帧完成时产出，由分发逻辑立即消费
///
/// # 在架构中的位置
///
/// ```text
/// Transport Layer (mavbridge-link)
///     ↓ 原始字节流
/// FrameParser (本 crate)
///     ↓ Packet（仅校验通过的帧）
/// Dispatch / Translators (mavbridge-driver)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// 消息类型 ID
    pub msg_id: u8,

    /// 来源系统 ID
    pub sys_id: u8,

    /// 来源组件 ID
    pub comp_id: u8,

    /// 帧序号
    pub seq: u8,

    /// 载荷数据（固定缓冲区，未使用部分为 0）
    pub payload: [u8; MAX_PAYLOAD_LEN],

    /// 有效载荷长度 (0-255)
    pub payload_len: u8,
}

impl Packet {
    /// 构造一个载荷帧（载荷超过 255 字节的部分被截断）
    pub fn new(msg_id: u8, sys_id: u8, comp_id: u8, seq: u8, payload: &[u8]) -> Self {
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = payload.len().min(MAX_PAYLOAD_LEN);
        buf[..len].copy_from_slice(&payload[..len]);

        Self {
            msg_id,
            sys_id,
            comp_id,
            seq,
            payload: buf,
            payload_len: len as u8,
        }
    }

    /// 获取载荷切片（只包含有效数据）
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_len as usize]
    }

    /// 解析消息类型 ID（未登记的 ID 返回错误）
    pub fn message_id(&self) -> Result<MessageId, ProtocolError> {
        MessageId::try_from(self.msg_id).map_err(|_| ProtocolError::UnknownMessageId {
            id: self.msg_id,
        })
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self {
            msg_id: 0,
            sys_id: 0,
            comp_id: 0,
            seq: 0,
            payload: [0u8; MAX_PAYLOAD_LEN],
            payload_len: 0,
        }
    }
}

/// 协议解析错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid payload length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Unknown message ID: {id}")]
    UnknownMessageId { id: u8 },

    #[error("Payload too long: {len} bytes (max {MAX_PAYLOAD_LEN})")]
    PayloadTooLong { len: usize },
}

/// 字节序读取工具函数
///
/// 协议使用 Intel (LSB) 低位在前（小端字节序），
/// 这些函数用于从已经过长度检查的载荷切片中读取字段。
///
/// 小端字节序转 u16
pub fn u16_le(b: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([b[off], b[off + 1]])
}

/// 小端字节序转 i16
pub fn i16_le(b: &[u8], off: usize) -> i16 {
    i16::from_le_bytes([b[off], b[off + 1]])
}

/// 小端字节序转 u32
pub fn u32_le(b: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

/// 小端字节序转 i32
pub fn i32_le(b: &[u8], off: usize) -> i32 {
    i32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

/// 小端字节序转 u64
pub fn u64_le(b: &[u8], off: usize) -> u64 {
    u64::from_le_bytes([
        b[off],
        b[off + 1],
        b[off + 2],
        b[off + 3],
        b[off + 4],
        b[off + 5],
        b[off + 6],
        b[off + 7],
    ])
}

/// 小端字节序转 f32
pub fn f32_le(b: &[u8], off: usize) -> f32 {
    f32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_le() {
        let bytes = [0x34, 0x12];
        assert_eq!(u16_le(&bytes, 0), 0x1234);
    }

    #[test]
    fn test_i16_le_negative() {
        let bytes = [0xFF, 0xFF];
        assert_eq!(i16_le(&bytes, 0), -1);
    }

    #[test]
    fn test_i32_le() {
        let bytes = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(i32_le(&bytes, 0), 0x12345678);
    }

    #[test]
    fn test_i32_le_negative() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(i32_le(&bytes, 0), -1);
    }

    #[test]
    fn test_u64_le_with_offset() {
        let mut bytes = [0u8; 10];
        bytes[2..10].copy_from_slice(&0x0102_0304_0506_0708u64.to_le_bytes());
        assert_eq!(u64_le(&bytes, 2), 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_f32_le() {
        let bytes = 1.5f32.to_le_bytes();
        assert_eq!(f32_le(&bytes, 0), 1.5);
    }

    #[test]
    fn test_packet_payload_slice() {
        let pkt = Packet::new(30, 1, 1, 0, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(pkt.payload(), &[0xAA, 0xBB, 0xCC]);
        assert_eq!(pkt.payload_len, 3);
    }

    #[test]
    fn test_packet_unknown_message_id() {
        let pkt = Packet::new(200, 1, 1, 0, &[]);
        assert!(matches!(
            pkt.message_id(),
            Err(ProtocolError::UnknownMessageId { id: 200 })
        ));
    }
}
