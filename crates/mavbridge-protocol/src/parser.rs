//! 增量式帧解析状态机
//!
//! 逐字节消费输入流，每次 `push()` 最多产出一个校验通过的 [`Packet`]。
//! 状态在多次读取调用之间保持（流式解析，而非按调用划分），
//! 损坏或截断的帧只会让状态机回到 `Idle` 重新扫描起始字节，
//! 不会卡死后续解析。
//!
//! 校验失败的帧不会被返回：丢帧计数器加一，同时记录失败时所处的
//! 阶段供诊断使用。

use crate::crc;
use crate::{MAX_PAYLOAD_LEN, Packet, STX};

/// 帧组装阶段
///
/// 每个阶段表示"已经收到了什么"：收到起始字节后进入 `GotStx`，
/// 收到长度字节后进入 `GotLength`，以此类推。`GotCrcLow` 之后的
/// 校验和高字节要么完成一帧，要么丢弃一帧，两种情况都回到 `Idle`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    GotStx,
    GotLength,
    GotSeq,
    GotSysId,
    GotCompId,
    GotMsgId,
    GotPayload,
    GotCrcLow,
}

/// 帧解析器
///
/// 封装帧组装过程中的所有临时状态：当前阶段、组装中的帧、
/// 期望载荷长度、滚动校验和以及丢帧诊断信息。
pub struct FrameParser {
    stage: Stage,
    packet: Packet,
    expected_len: usize,
    payload_idx: usize,
    crc: u16,
    crc_lo: u8,
    drop_count: u64,
    last_failure: Option<Stage>,
}

impl FrameParser {
    /// 创建新的解析器（初始为 `Idle`）
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            packet: Packet::default(),
            expected_len: 0,
            payload_idx: 0,
            crc: crc::CRC_INIT,
            crc_lo: 0,
            drop_count: 0,
            last_failure: None,
        }
    }

    /// 当前阶段
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// 累计丢帧数（校验失败）
    pub fn drop_count(&self) -> u64 {
        self.drop_count
    }

    /// 最近一次失败时所处的阶段
    pub fn last_failure(&self) -> Option<Stage> {
        self.last_failure
    }

    /// 丢弃组装中的帧，回到 `Idle` 重新扫描
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.payload_idx = 0;
        self.expected_len = 0;
    }

    /// 消费一个字节，帧完成且校验通过时返回该帧
    pub fn push(&mut self, byte: u8) -> Option<Packet> {
        match self.stage {
            Stage::Idle => {
                // 非起始字节静默跳过（重新同步的关键）
                if byte == STX {
                    self.packet = Packet::default();
                    self.payload_idx = 0;
                    self.crc = crc::CRC_INIT;
                    self.stage = Stage::GotStx;
                }
                None
            },

            Stage::GotStx => {
                self.expected_len = byte as usize;
                self.packet.payload_len = byte;
                self.stage = Stage::GotLength;
                None
            },

            Stage::GotLength => {
                self.packet.seq = byte;
                crc::accumulate(byte, &mut self.crc);
                self.stage = Stage::GotSeq;
                None
            },

            Stage::GotSeq => {
                self.packet.sys_id = byte;
                crc::accumulate(byte, &mut self.crc);
                self.stage = Stage::GotSysId;
                None
            },

            Stage::GotSysId => {
                self.packet.comp_id = byte;
                crc::accumulate(byte, &mut self.crc);
                self.stage = Stage::GotCompId;
                None
            },

            Stage::GotCompId => {
                self.packet.msg_id = byte;
                crc::accumulate(byte, &mut self.crc);
                // 零长度载荷直接进入校验阶段
                self.stage = if self.expected_len == 0 {
                    Stage::GotPayload
                } else {
                    Stage::GotMsgId
                };
                None
            },

            Stage::GotMsgId => {
                debug_assert!(self.payload_idx < MAX_PAYLOAD_LEN);
                self.packet.payload[self.payload_idx] = byte;
                self.payload_idx += 1;
                crc::accumulate(byte, &mut self.crc);
                if self.payload_idx == self.expected_len {
                    self.stage = Stage::GotPayload;
                }
                None
            },

            Stage::GotPayload => {
                self.crc_lo = byte;
                self.stage = Stage::GotCrcLow;
                None
            },

            Stage::GotCrcLow => {
                let received = u16::from_le_bytes([self.crc_lo, byte]);
                let valid = received == self.crc;
                // 无论结果如何都回到 Idle
                self.stage = Stage::Idle;
                if valid {
                    Some(self.packet.clone())
                } else {
                    self.drop_count += 1;
                    self.last_failure = Some(Stage::GotCrcLow);
                    None
                }
            },
        }
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}
