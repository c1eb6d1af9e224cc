//! 帧编码
//!
//! 出站帧（数据流速率请求）与测试用的线上字节序列都经由这里生成，
//! 布局与解析器一一对应。

use crate::crc;
use crate::{MAX_PAYLOAD_LEN, ProtocolError, STX};

/// 将一条消息编码为完整的线上帧
pub fn encode_frame(
    seq: u8,
    sys_id: u8,
    comp_id: u8,
    msg_id: u8,
    payload: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLong {
            len: payload.len(),
        });
    }

    let mut out = Vec::with_capacity(payload.len() + crate::FRAME_OVERHEAD);
    out.push(STX);
    out.push(payload.len() as u8);
    out.push(seq);
    out.push(sys_id);
    out.push(comp_id);
    out.push(msg_id);
    out.extend_from_slice(payload);

    // 校验和覆盖 SEQ..PAYLOAD
    let checksum = crc::calculate(&out[2..]);
    out.extend_from_slice(&checksum.to_le_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let wire = encode_frame(5, 1, 2, 30, &[0xAA, 0xBB]).unwrap();
        assert_eq!(wire.len(), 2 + crate::FRAME_OVERHEAD);
        assert_eq!(wire[0], STX);
        assert_eq!(wire[1], 2); // LEN
        assert_eq!(wire[2], 5); // SEQ
        assert_eq!(wire[3], 1); // SYSID
        assert_eq!(wire[4], 2); // COMPID
        assert_eq!(wire[5], 30); // MSGID
        assert_eq!(&wire[6..8], &[0xAA, 0xBB]);

        let expected = crc::calculate(&wire[2..8]);
        assert_eq!(u16::from_le_bytes([wire[8], wire[9]]), expected);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let payload = vec![0u8; MAX_PAYLOAD_LEN + 1];
        assert!(matches!(
            encode_frame(0, 1, 1, 0, &payload),
            Err(ProtocolError::PayloadTooLong { len: 256 })
        ));
    }
}
