//! 规范化状态聚合与共享读取上下文
//!
//! 桥接循环是这里所有状态的唯一写者；观察者通过 [`BridgeContext`] 的
//! `ArcSwap` 单元无锁读取最近一次提交的快照。
//!
//! 聚合语义是 merge-not-replace：每个翻译器只写自己负责的字段，
//! 其余字段保留上一次写入的值，直到被同类或相关报文覆盖。

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use arc_swap::ArcSwap;

use crate::metrics::BridgeMetrics;

/// GPS 定位有效性标志位
pub const GPS_VALID_DATE: u16 = 0x01;
pub const GPS_VALID_TIME: u16 = 0x02;
pub const GPS_VALID_POS: u16 = 0x04;
pub const GPS_VALID_COG: u16 = 0x08;
pub const GPS_VALID_SOG: u16 = 0x10;
pub const GPS_VALID_HDOP: u16 = 0x20;
pub const GPS_VALID_VDOP: u16 = 0x40;

/// 定位方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpsFixKind {
    /// 航位推算（无有效定位）
    #[default]
    DeadReckoning,
    /// 独立定位
    Standalone,
}

/// 估计状态聚合：姿态、角速率、位置、速度
///
/// 角度单位为弧度，角速率弧度每秒，位置高度米，速度米每秒。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EstimatedState {
    /// 纬度（弧度）
    pub lat: f64,
    /// 经度（弧度）
    pub lon: f64,
    /// 海拔高度（m，MSL）
    pub height: f64,
    /// 离地高度（m，相对起飞点）
    pub alt_agl: f64,
    /// 水深（m），-1 表示不适用
    pub depth: f64,

    /// 横滚
    pub roll: f64,
    /// 俯仰
    pub pitch: f64,
    /// 偏航
    pub yaw: f64,
    /// 横滚角速率
    pub roll_rate: f64,
    /// 俯仰角速率
    pub pitch_rate: f64,
    /// 偏航角速率
    pub yaw_rate: f64,

    /// 地面系速度
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    /// 机体系速度（由地面系速度按当前姿态旋转得到）
    pub body_vx: f64,
    pub body_vy: f64,
    pub body_vz: f64,
}

/// GPS 定位聚合
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpsFix {
    /// 有效性标志位（`GPS_VALID_*`）
    pub validity: u16,
    pub kind: GpsFixKind,

    /// 纬度（弧度）
    pub lat: f64,
    /// 经度（弧度）
    pub lon: f64,
    /// 海拔高度（m）
    pub height: f64,
    pub satellites: u8,

    /// 对地航向（弧度）
    pub cog: f64,
    /// 对地速度（m/s）
    pub sog: f32,
    /// 水平精度因子
    pub hdop: f32,
    /// 垂直精度因子
    pub vdop: f32,

    /// UTC 当日秒数（含小数微秒）
    pub utc_time: f64,
    pub utc_year: u16,
    pub utc_month: u8,
    pub utc_day: u8,
}

/// 对外可见的运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationalStatus {
    /// 链路数据正常
    Normal = 0,
    /// 链路超时（missing data）
    Error = 1,
}

impl OperationalStatus {
    /// 从 u8 转换，无效值按 Normal 处理
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Error,
            _ => Self::Normal,
        }
    }
}

/// 共享读取上下文
///
/// 桥接循环独占写入；任意线程可以读取最近提交的聚合快照、当前
/// 活跃系统 ID、运行状态和指标。没有锁：快照用 `ArcSwap`，标量用
/// 原子单元。
#[derive(Debug)]
pub struct BridgeContext {
    /// 最近提交的估计状态
    pub estimated: ArcSwap<EstimatedState>,
    /// 最近提交的 GPS 定位
    pub gps: ArcSwap<GpsFix>,
    /// 最近一次成功翻译的帧的来源系统 ID
    pub active_system_id: AtomicU8,
    /// 运行状态（`OperationalStatus`）
    pub operational: AtomicU8,
    /// 桥接指标
    pub metrics: BridgeMetrics,
}

impl BridgeContext {
    pub fn new() -> Self {
        Self {
            estimated: ArcSwap::from_pointee(EstimatedState::default()),
            gps: ArcSwap::from_pointee(GpsFix::default()),
            // 初始系统 ID 约定为 1
            active_system_id: AtomicU8::new(1),
            operational: AtomicU8::new(OperationalStatus::Normal as u8),
            metrics: BridgeMetrics::new(),
        }
    }

    /// 最近提交的估计状态快照
    pub fn estimated_state(&self) -> Arc<EstimatedState> {
        self.estimated.load_full()
    }

    /// 最近提交的 GPS 定位快照
    pub fn gps_fix(&self) -> Arc<GpsFix> {
        self.gps.load_full()
    }

    /// 当前活跃系统 ID
    pub fn active_system_id(&self) -> u8 {
        self.active_system_id.load(Ordering::Relaxed)
    }

    /// 当前运行状态
    pub fn operational_status(&self) -> OperationalStatus {
        OperationalStatus::from_u8(self.operational.load(Ordering::Relaxed))
    }
}

impl Default for BridgeContext {
    fn default() -> Self {
        Self::new()
    }
}
