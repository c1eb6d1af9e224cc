//! 消息 ID 枚举与载荷解码
//!
//! 每种消息对应一个固定布局的载荷结构体，字段按小端字节序排列。
//! `decode()` 先做一次长度检查，之后的字段读取不再失败。
//!
//! 只登记桥接层实际翻译的消息类型；未登记的 ID 在分发层是 no-op。

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{ProtocolError, f32_le, i16_le, i32_le, u16_le, u32_le, u64_le};

/// 已登记的消息类型 ID（封闭枚举）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MessageId {
    Heartbeat = 0,
    SysStatus = 1,
    SystemTime = 2,
    GpsRawInt = 24,
    RawImu = 27,
    ScaledPressure = 29,
    Attitude = 30,
    GlobalPositionInt = 33,
    RequestDataStream = 66,
    VfrHud = 74,
    HwStatus = 165,
    Wind = 168,
    StatusText = 253,
}

/// 地面站心跳的载具类型值（此类心跳被整体忽略）
pub const MAV_TYPE_GCS: u8 = 6;

/// 系统状态：critical（触发失效保护告警）
pub const MAV_STATE_CRITICAL: u8 = 5;

/// base_mode 取值（原样匹配整个字节，不做按位测试）
pub const MODE_AUTO_ENABLED: u8 = 4;
pub const MODE_GUIDED_ENABLED: u8 = 8;
pub const MODE_STABILIZE_ENABLED: u8 = 16;
pub const MODE_MANUAL_INPUT_ENABLED: u8 = 64;

/// 数据流分组（数据流请求的 stream id）
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum DataStream {
    All = 0,
    RawSensors = 1,
    ExtendedStatus = 2,
    RcChannels = 3,
    Position = 6,
    Extra1 = 10,
    Extra2 = 11,
    Extra3 = 12,
}

#[inline]
fn check_len(payload: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if payload.len() != expected {
        return Err(ProtocolError::InvalidLength {
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// 心跳：载具类型、自驾仪模式、系统状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub custom_mode: u32,
    pub mav_type: u8,
    pub autopilot: u8,
    pub base_mode: u8,
    pub system_status: u8,
    pub mavlink_version: u8,
}

impl Heartbeat {
    pub const LEN: usize = 9;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            custom_mode: u32_le(payload, 0),
            mav_type: payload[4],
            autopilot: payload[5],
            base_mode: payload[6],
            system_status: payload[7],
            mavlink_version: payload[8],
        })
    }
}

/// 系统状态：电池电压/电流/剩余电量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysStatus {
    pub sensors_present: u32,
    pub sensors_enabled: u32,
    pub sensors_health: u32,
    pub load: u16,
    /// 电池电压（mV）
    pub voltage_battery: u16,
    /// 电池电流（10 mA），-1 表示未测量
    pub current_battery: i16,
    pub drop_rate_comm: u16,
    pub errors_comm: u16,
    pub errors_count: [u16; 4],
    /// 剩余电量（%），-1 表示未估计
    pub battery_remaining: i8,
}

impl SysStatus {
    pub const LEN: usize = 31;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            sensors_present: u32_le(payload, 0),
            sensors_enabled: u32_le(payload, 4),
            sensors_health: u32_le(payload, 8),
            load: u16_le(payload, 12),
            voltage_battery: u16_le(payload, 14),
            current_battery: i16_le(payload, 16),
            drop_rate_comm: u16_le(payload, 18),
            errors_comm: u16_le(payload, 20),
            errors_count: [
                u16_le(payload, 22),
                u16_le(payload, 24),
                u16_le(payload, 26),
                u16_le(payload, 28),
            ],
            battery_remaining: payload[30] as i8,
        })
    }
}

/// 自驾仪时钟（unix 微秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemTime {
    pub time_unix_usec: u64,
    pub time_boot_ms: u32,
}

impl SystemTime {
    pub const LEN: usize = 12;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            time_unix_usec: u64_le(payload, 0),
            time_boot_ms: u32_le(payload, 8),
        })
    }
}

/// GPS 原始定位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsRawInt {
    pub time_usec: u64,
    /// 纬度（1e-7 度）
    pub lat: i32,
    /// 经度（1e-7 度）
    pub lon: i32,
    /// 海拔（mm，MSL）
    pub alt: i32,
    /// 水平精度因子（1e-2）
    pub eph: u16,
    /// 垂直精度因子（1e-2）
    pub epv: u16,
    /// 对地速度（cm/s）
    pub vel: u16,
    /// 对地航向（1e-2 度）
    pub cog: u16,
    /// 0-1: 无定位；2: 2D；3: 3D
    pub fix_type: u8,
    pub satellites_visible: u8,
}

impl GpsRawInt {
    pub const LEN: usize = 30;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            time_usec: u64_le(payload, 0),
            lat: i32_le(payload, 8),
            lon: i32_le(payload, 12),
            alt: i32_le(payload, 16),
            eph: u16_le(payload, 20),
            epv: u16_le(payload, 22),
            vel: u16_le(payload, 24),
            cog: u16_le(payload, 26),
            fix_type: payload[28],
            satellites_visible: payload[29],
        })
    }
}

/// IMU 原始读数（加速度/角速度/磁场三组）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawImu {
    pub time_usec: u64,
    pub xacc: i16,
    pub yacc: i16,
    pub zacc: i16,
    pub xgyro: i16,
    pub ygyro: i16,
    pub zgyro: i16,
    pub xmag: i16,
    pub ymag: i16,
    pub zmag: i16,
}

impl RawImu {
    pub const LEN: usize = 26;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            time_usec: u64_le(payload, 0),
            xacc: i16_le(payload, 8),
            yacc: i16_le(payload, 10),
            zacc: i16_le(payload, 12),
            xgyro: i16_le(payload, 14),
            ygyro: i16_le(payload, 16),
            zgyro: i16_le(payload, 18),
            xmag: i16_le(payload, 20),
            ymag: i16_le(payload, 22),
            zmag: i16_le(payload, 24),
        })
    }
}

/// 气压计读数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledPressure {
    pub time_boot_ms: u32,
    /// 绝对气压（hPa）
    pub press_abs: f32,
    pub press_diff: f32,
    /// 温度（1e-2 摄氏度）
    pub temperature: i16,
}

impl ScaledPressure {
    pub const LEN: usize = 14;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            time_boot_ms: u32_le(payload, 0),
            press_abs: f32_le(payload, 4),
            press_diff: f32_le(payload, 8),
            temperature: i16_le(payload, 12),
        })
    }
}

/// 姿态（弧度 / 弧度每秒）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub time_boot_ms: u32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub rollspeed: f32,
    pub pitchspeed: f32,
    pub yawspeed: f32,
}

impl Attitude {
    pub const LEN: usize = 28;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            time_boot_ms: u32_le(payload, 0),
            roll: f32_le(payload, 4),
            pitch: f32_le(payload, 8),
            yaw: f32_le(payload, 12),
            rollspeed: f32_le(payload, 16),
            pitchspeed: f32_le(payload, 20),
            yawspeed: f32_le(payload, 24),
        })
    }
}

/// 融合后的全局位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalPositionInt {
    pub time_boot_ms: u32,
    /// 纬度（1e-7 度）
    pub lat: i32,
    /// 经度（1e-7 度）
    pub lon: i32,
    /// 海拔（mm，MSL）
    pub alt: i32,
    /// 相对起飞点高度（mm）
    pub relative_alt: i32,
    /// 地面系速度（cm/s）
    pub vx: i16,
    pub vy: i16,
    pub vz: i16,
    pub hdg: u16,
}

impl GlobalPositionInt {
    pub const LEN: usize = 28;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            time_boot_ms: u32_le(payload, 0),
            lat: i32_le(payload, 4),
            lon: i32_le(payload, 8),
            alt: i32_le(payload, 12),
            relative_alt: i32_le(payload, 16),
            vx: i16_le(payload, 20),
            vy: i16_le(payload, 22),
            vz: i16_le(payload, 24),
            hdg: u16_le(payload, 26),
        })
    }
}

/// 数据流速率请求（出站帧）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDataStream {
    /// 请求速率（Hz）
    pub rate_hz: u16,
    pub target_system: u8,
    pub target_component: u8,
    pub stream: DataStream,
    /// true 开启，false 关闭
    pub start: bool,
}

impl RequestDataStream {
    pub const LEN: usize = 6;

    pub fn encode_payload(&self) -> [u8; Self::LEN] {
        let rate = self.rate_hz.to_le_bytes();
        [
            rate[0],
            rate[1],
            self.target_system,
            self.target_component,
            self.stream.into(),
            self.start as u8,
        ]
    }
}

/// HUD 概要（空速/地速）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VfrHud {
    /// 空速（m/s）
    pub airspeed: f32,
    /// 地速（m/s）
    pub groundspeed: f32,
    pub alt: f32,
    pub climb: f32,
    pub heading: i16,
    pub throttle: u16,
}

impl VfrHud {
    pub const LEN: usize = 20;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            airspeed: f32_le(payload, 0),
            groundspeed: f32_le(payload, 4),
            alt: f32_le(payload, 8),
            climb: f32_le(payload, 12),
            heading: i16_le(payload, 16),
            throttle: u16_le(payload, 18),
        })
    }
}

/// 板载硬件状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwStatus {
    /// 板载 5V 轨电压（mV）
    pub vcc: u16,
    pub i2c_errors: u8,
}

impl HwStatus {
    pub const LEN: usize = 3;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            vcc: u16_le(payload, 0),
            i2c_errors: payload[2],
        })
    }
}

/// 风估计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wind {
    /// 风来向（度）
    pub direction: f32,
    /// 风速（m/s）
    pub speed: f32,
    /// 垂直风速（m/s）
    pub speed_z: f32,
}

impl Wind {
    pub const LEN: usize = 12;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        Ok(Self {
            direction: f32_le(payload, 0),
            speed: f32_le(payload, 4),
            speed_z: f32_le(payload, 8),
        })
    }
}

/// 自驾仪自由文本状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusText {
    pub severity: u8,
    pub text: [u8; 50],
}

impl StatusText {
    pub const LEN: usize = 51;

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_len(payload, Self::LEN)?;
        let mut text = [0u8; 50];
        text.copy_from_slice(&payload[1..51]);
        Ok(Self {
            severity: payload[0],
            text,
        })
    }

    /// 文本内容（在第一个 NUL 处截断，非 UTF-8 字节替换）
    pub fn text_lossy(&self) -> String {
        let end = self.text.iter().position(|&b| b == 0).unwrap_or(50);
        String::from_utf8_lossy(&self.text[..end]).into_owned()
    }
}
