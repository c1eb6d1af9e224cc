//! 消息分发与语义翻译
//!
//! 每种消息类型一个翻译分支：解码固定布局载荷、做单位换算、
//! 更新规范化聚合并立即发布。分发是对封闭 [`MessageId`] 枚举的
//! 一次穷举 `match`；未登记的 ID 是 no-op（字节被消费，状态不变，
//! 不算错误）。
//!
//! 返回值表示该帧是否被成功翻译——只有翻译成功的帧才会更新
//! ActiveSystemId 和链路健康（地面站心跳被翻译器整体拒绝）。

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::{DateTime, Datelike, Timelike};
use nalgebra::{Rotation3, Vector3};
use tracing::{debug, info, trace, warn};

use mavbridge_protocol::{
    Attitude, GlobalPositionInt, GpsRawInt, Heartbeat, HwStatus, MAV_STATE_CRITICAL, MAV_TYPE_GCS,
    MODE_AUTO_ENABLED, MODE_GUIDED_ENABLED, MODE_MANUAL_INPUT_ENABLED, MODE_STABILIZE_ENABLED,
    MessageId, Packet, RawImu, ScaledPressure, StatusText, SysStatus, SystemTime, VfrHud, Wind,
};

use crate::events::{AutonomyLevel, EventBus, TelemetryEvent};
use crate::state::{
    BridgeContext, EstimatedState, GPS_VALID_DATE, GPS_VALID_POS, GPS_VALID_TIME, GPS_VALID_VDOP,
    GpsFix, GpsFixKind,
};

/// 规范化聚合（merge-not-replace）
///
/// 姿态/位置共享一个估计状态，GPS 相关报文共享一个定位聚合。
/// 每个翻译分支只写自己负责的字段，其余字段保留上次的值。
#[derive(Debug, Default)]
pub struct Aggregates {
    pub estate: EstimatedState,
    pub fix: GpsFix,
}

impl Aggregates {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 提交估计状态：快照入上下文 + 立即发布
fn commit_estimated(agg: &Aggregates, ctx: &BridgeContext, bus: &EventBus) {
    ctx.estimated.store(Arc::new(agg.estate));
    bus.telemetry(TelemetryEvent::EstimatedState(agg.estate));
}

/// 提交 GPS 定位：快照入上下文 + 立即发布
fn commit_fix(agg: &Aggregates, ctx: &BridgeContext, bus: &EventBus) {
    ctx.gps.store(Arc::new(agg.fix));
    bus.telemetry(TelemetryEvent::GpsFix(agg.fix));
}

/// 翻译一个校验通过的帧，返回是否成功翻译
pub fn translate_packet(
    pkt: &Packet,
    agg: &mut Aggregates,
    ctx: &BridgeContext,
    bus: &EventBus,
) -> bool {
    let msg_id = match MessageId::try_from(pkt.msg_id) {
        Ok(id) => id,
        Err(_) => {
            // 未登记的消息 ID：消费字节，不改状态，不报错
            ctx.metrics.unknown_messages.fetch_add(1, Ordering::Relaxed);
            trace!("unhandled message id {}", pkt.msg_id);
            return false;
        },
    };

    match msg_id {
        // 姿态 -> 估计状态（单位已是弧度/弧度每秒，原样搬运）
        MessageId::Attitude => {
            if let Ok(att) = Attitude::decode(pkt.payload()) {
                agg.estate.roll = att.roll as f64;
                agg.estate.pitch = att.pitch as f64;
                agg.estate.yaw = att.yaw as f64;
                agg.estate.roll_rate = att.rollspeed as f64;
                agg.estate.pitch_rate = att.pitchspeed as f64;
                agg.estate.yaw_rate = att.yawspeed as f64;

                commit_estimated(agg, ctx, bus);
                true
            } else {
                warn!("failed to decode Attitude payload");
                false
            }
        },

        // 全局位置 -> 估计状态
        MessageId::GlobalPositionInt => {
            if let Ok(gp) = GlobalPositionInt::decode(pkt.payload()) {
                agg.estate.lat = (gp.lat as f64 * 1e-7).to_radians();
                agg.estate.lon = (gp.lon as f64 * 1e-7).to_radians();
                agg.estate.height = gp.alt as f64 * 1e-3; // MSL

                agg.estate.vx = 1e-2 * gp.vx as f64;
                agg.estate.vy = 1e-2 * gp.vy as f64;
                agg.estate.vz = -1e-2 * gp.vz as f64;

                // 地面系速度按当前姿态旋转，得到机体系下的对地速度
                let rot = Rotation3::from_euler_angles(
                    agg.estate.roll,
                    agg.estate.pitch,
                    agg.estate.yaw,
                );
                let body =
                    rot.inverse() * Vector3::new(agg.estate.vx, agg.estate.vy, agg.estate.vz);
                agg.estate.body_vx = body.x;
                agg.estate.body_vy = body.y;
                agg.estate.body_vz = body.z;

                agg.estate.alt_agl = gp.relative_alt as f64 * 1e-3; // AGL（相对起飞点）
                agg.estate.depth = -1.0;

                commit_estimated(agg, ctx, bus);
                true
            } else {
                warn!("failed to decode GlobalPositionInt payload");
                false
            }
        },

        // 板载硬件状态 -> 电压
        MessageId::HwStatus => {
            if let Ok(hw) = HwStatus::decode(pkt.payload()) {
                bus.telemetry(TelemetryEvent::Voltage(0.001 * hw.vcc as f32));
                true
            } else {
                warn!("failed to decode HwStatus payload");
                false
            }
        },

        // 系统状态 -> 电压/电流/剩余电量
        MessageId::SysStatus => {
            if let Ok(sys) = SysStatus::decode(pkt.payload()) {
                bus.telemetry(TelemetryEvent::Voltage(0.001 * sys.voltage_battery as f32));
                bus.telemetry(TelemetryEvent::Current(0.01 * sys.current_battery as f32));
                bus.telemetry(TelemetryEvent::FuelLevel(sys.battery_remaining as f32));
                true
            } else {
                warn!("failed to decode SysStatus payload");
                false
            }
        },

        // 气压计 -> 气压/温度
        MessageId::ScaledPressure => {
            if let Ok(press) = ScaledPressure::decode(pkt.payload()) {
                bus.telemetry(TelemetryEvent::Pressure(press.press_abs));
                bus.telemetry(TelemetryEvent::Temperature(0.01 * press.temperature as f32));
                true
            } else {
                warn!("failed to decode ScaledPressure payload");
                false
            }
        },

        // 风估计 -> 气流速度（风来向转为地面系分量）
        MessageId::Wind => {
            if let Ok(wind) = Wind::decode(pkt.payload()) {
                let dir_rad = (wind.direction as f64).to_radians();
                bus.telemetry(TelemetryEvent::StreamVelocity {
                    x: -dir_rad.cos() * wind.speed as f64,
                    y: -dir_rad.sin() * wind.speed as f64,
                    z: wind.speed_z as f64,
                });
                true
            } else {
                warn!("failed to decode Wind payload");
                false
            }
        },

        // GPS 原始定位 -> 定位聚合
        MessageId::GpsRawInt => {
            if let Ok(gps) = GpsRawInt::decode(pkt.payload()) {
                agg.fix.cog = (gps.cog as f64 * 0.01).to_radians();
                agg.fix.sog = gps.vel as f32 * 0.01;
                agg.fix.hdop = gps.eph as f32 * 0.01;
                agg.fix.vdop = gps.epv as f32 * 0.01;
                agg.fix.lat = (gps.lat as f64 * 1e-7).to_radians();
                agg.fix.lon = (gps.lon as f64 * 1e-7).to_radians();
                agg.fix.height = gps.alt as f64 * 1e-3;
                agg.fix.satellites = gps.satellites_visible;

                agg.fix.validity = 0;
                if gps.fix_type > 1 {
                    agg.fix.validity |= GPS_VALID_POS;
                    agg.fix.kind = GpsFixKind::Standalone;
                } else {
                    agg.fix.kind = GpsFixKind::DeadReckoning;
                }

                // 3D 定位：标记垂直精度有效，vdop 固定为 5
                if gps.fix_type == 3 {
                    agg.fix.validity |= GPS_VALID_VDOP;
                    agg.fix.vdop = 5.0;
                }

                commit_fix(agg, ctx, bus);
                true
            } else {
                warn!("failed to decode GpsRawInt payload");
                false
            }
        },

        // 自驾仪时钟 -> 定位聚合的 UTC 时间/日期
        MessageId::SystemTime => {
            if let Ok(time) = SystemTime::decode(pkt.payload()) {
                let secs = (time.time_unix_usec / 1_000_000) as i64;
                let sub_us = time.time_unix_usec % 1_000_000;
                match DateTime::from_timestamp(secs, (sub_us * 1000) as u32) {
                    Some(utc) => {
                        agg.fix.utc_time =
                            f64::from(utc.hour() * 3600 + utc.minute() * 60 + utc.second())
                                + sub_us as f64 * 1e-6;
                        agg.fix.utc_year = u16::try_from(utc.year()).unwrap_or(0);
                        agg.fix.utc_month = utc.month() as u8;
                        agg.fix.utc_day = utc.day() as u8;

                        // 自驾仪冷启动时钟从 1970 年起跳，只有走到
                        // 合理年份之后才认为时间/日期可信
                        if agg.fix.utc_year > 2014 {
                            agg.fix.validity |= GPS_VALID_TIME | GPS_VALID_DATE;
                        }

                        commit_fix(agg, ctx, bus);
                        true
                    },
                    None => {
                        debug!(
                            "system time {} us outside calendar range",
                            time.time_unix_usec
                        );
                        false
                    },
                }
            } else {
                warn!("failed to decode SystemTime payload");
                false
            }
        },

        // HUD 概要 -> 指示空速/真实地速
        MessageId::VfrHud => {
            if let Ok(hud) = VfrHud::decode(pkt.payload()) {
                bus.telemetry(TelemetryEvent::IndicatedSpeed(hud.airspeed as f64));
                bus.telemetry(TelemetryEvent::TrueSpeed(hud.groundspeed as f64));
                true
            } else {
                warn!("failed to decode VfrHud payload");
                false
            }
        },

        // 心跳 -> 自驾仪模式
        MessageId::Heartbeat => {
            if let Ok(hbt) = Heartbeat::decode(pkt.payload()) {
                // 同一信道上也会出现地面站的心跳，整体忽略
                if hbt.mav_type == MAV_TYPE_GCS {
                    return false;
                }

                if hbt.system_status == MAV_STATE_CRITICAL {
                    warn!("autopilot failsafe active");
                }

                // 原样匹配整个 base_mode 字节（不做按位测试）
                let (autonomy, mode) = match hbt.base_mode {
                    MODE_AUTO_ENABLED => (AutonomyLevel::Auto, "AUTO"),
                    MODE_GUIDED_ENABLED => (AutonomyLevel::Auto, "GUIDED"),
                    MODE_STABILIZE_ENABLED => (AutonomyLevel::Manual, "STABILIZE"),
                    MODE_MANUAL_INPUT_ENABLED => (AutonomyLevel::Manual, "MANUAL"),
                    _ => (AutonomyLevel::Manual, "MANUAL"),
                };
                trace!("autopilot mode {}", mode);

                bus.telemetry(TelemetryEvent::AutopilotMode { autonomy, mode });
                true
            } else {
                warn!("failed to decode Heartbeat payload");
                false
            }
        },

        // 自由文本：只记日志，无规范化字段
        MessageId::StatusText => {
            if let Ok(text) = StatusText::decode(pkt.payload()) {
                info!("autopilot status: {}", text.text_lossy());
                true
            } else {
                warn!("failed to decode StatusText payload");
                false
            }
        },

        // IMU 原始读数 -> 加速度/角速度/磁场三条记录，共享一个采样时间戳
        MessageId::RawImu => {
            if let Ok(imu) = RawImu::decode(pkt.payload()) {
                let timestamp = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap()
                    .as_secs_f64();

                bus.telemetry(TelemetryEvent::Acceleration {
                    x: imu.xacc as f64,
                    y: imu.yacc as f64,
                    z: imu.zacc as f64,
                    timestamp,
                });
                bus.telemetry(TelemetryEvent::AngularVelocity {
                    x: imu.xgyro as f64,
                    y: imu.ygyro as f64,
                    z: imu.zgyro as f64,
                    timestamp,
                });
                bus.telemetry(TelemetryEvent::MagneticField {
                    x: imu.xmag as f64,
                    y: imu.ymag as f64,
                    z: imu.zmag as f64,
                    timestamp,
                });
                true
            } else {
                warn!("failed to decode RawImu payload");
                false
            }
        },

        // 出站消息类型，入站流里没有对应翻译器
        MessageId::RequestDataStream => {
            ctx.metrics.unknown_messages.fetch_add(1, Ordering::Relaxed);
            trace!("no translator for inbound RequestDataStream");
            false
        },
    }
}
