//! 事件总线类型
//!
//! 翻译器每完成一条规范化记录就立即发布，不做批处理；链路状态
//! 转换（edge-triggered）走同一条总线。总线本身由外部注入，
//! 接收端断开只记日志，绝不让桥接循环停下来。

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::trace;

use crate::state::{EstimatedState, GpsFix};

/// 自主级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutonomyLevel {
    Manual,
    Auto,
}

/// 规范化遥测记录
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    /// 估计状态聚合（姿态或位置报文各自提交一次）
    EstimatedState(EstimatedState),
    /// GPS 定位聚合
    GpsFix(GpsFix),
    /// 电压（V）
    Voltage(f32),
    /// 电流（A）
    Current(f32),
    /// 剩余电量（%）
    FuelLevel(f32),
    /// 气压（hPa）
    Pressure(f32),
    /// 温度（°C）
    Temperature(f32),
    /// 气流速度（风），地面系
    StreamVelocity { x: f64, y: f64, z: f64 },
    /// 指示空速（m/s）
    IndicatedSpeed(f64),
    /// 真实地速（m/s）
    TrueSpeed(f64),
    /// 自驾仪模式
    AutopilotMode {
        autonomy: AutonomyLevel,
        mode: &'static str,
    },
    /// 加速度三轴（原始单位，时间戳为 unix 秒）
    Acceleration { x: f64, y: f64, z: f64, timestamp: f64 },
    /// 角速度三轴
    AngularVelocity { x: f64, y: f64, z: f64, timestamp: f64 },
    /// 磁场三轴
    MagneticField { x: f64, y: f64, z: f64, timestamp: f64 },
}

/// 链路状态事件（仅在状态转换时发布）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// 数据恢复正常
    Active,
    /// 超过通信超时没有任何有效帧
    MissingData,
    /// 链路建立失败或被拆除，即将重试
    ConnectionFailed,
}

/// 总线事件
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Telemetry(TelemetryEvent),
    Link(LinkEvent),
}

/// 事件总线发送端封装
///
/// 接收端断开不是错误：记一条 trace 继续运行（桥接被设计为
/// 永不因下游停摆）。
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: Sender<BridgeEvent>,
}

impl EventBus {
    /// 包装一个外部提供的发送端
    pub fn new(tx: Sender<BridgeEvent>) -> Self {
        Self { tx }
    }

    /// 便捷构造：新建无界通道
    pub fn channel() -> (Self, Receiver<BridgeEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    /// 发布一条遥测记录
    pub fn telemetry(&self, event: TelemetryEvent) {
        if self.tx.send(BridgeEvent::Telemetry(event)).is_err() {
            trace!("event bus disconnected, telemetry record dropped");
        }
    }

    /// 发布一次链路状态转换
    pub fn link(&self, event: LinkEvent) {
        if self.tx.send(BridgeEvent::Link(event)).is_err() {
            trace!("event bus disconnected, link event dropped");
        }
    }
}
