//! 端到端集成测试：真实 TCP 回环链路
//!
//! 本地起一个监听端口模拟自驾仪，桥接拨出连接，验证字节流最终
//! 变成总线上的规范化事件。

use std::io::Write;
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

use mavbridge_driver::{
    BridgeBuilder, BridgeConfig, BridgeEvent, OperationalStatus, TelemetryEvent,
};
use mavbridge_protocol::encode_frame;

fn attitude_frame(seq: u8, roll: f32, pitch: f32, yaw: f32) -> Vec<u8> {
    let mut payload = [0u8; 28];
    payload[4..8].copy_from_slice(&roll.to_le_bytes());
    payload[8..12].copy_from_slice(&pitch.to_le_bytes());
    payload[12..16].copy_from_slice(&yaw.to_le_bytes());
    encode_frame(seq, 1, 1, 30, &payload).unwrap()
}

fn position_frame(seq: u8, lat: i32, lon: i32, alt_mm: i32) -> Vec<u8> {
    let mut payload = [0u8; 28];
    payload[4..8].copy_from_slice(&lat.to_le_bytes());
    payload[8..12].copy_from_slice(&lon.to_le_bytes());
    payload[12..16].copy_from_slice(&alt_mm.to_le_bytes());
    encode_frame(seq, 1, 1, 33, &payload).unwrap()
}

#[test]
fn bridges_frames_over_loopback_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    // 模拟自驾仪：接受连接后推一段带垃圾前缀的字节流
    let server = thread::spawn(move || {
        let (mut sock, _) = listener.accept().unwrap();
        let mut stream = vec![0x00u8, 0x42, 0x13];
        stream.extend(attitude_frame(0, 0.1, 0.2, 0.3));
        stream.extend(position_frame(1, 410_000_000, -80_000_000, 10_000));
        sock.write_all(&stream).unwrap();
        // 连接保持到桥接读完
        thread::sleep(Duration::from_millis(500));
    });

    let config = BridgeConfig {
        tcp_port: port,
        ..Default::default()
    };
    let (mut bridge, rx) = BridgeBuilder::new().config(config).build().unwrap();
    let rx = rx.unwrap();

    bridge.start();
    assert!(bridge.is_connected());

    // 驱动节拍直到两条估计状态事件到齐
    let mut events = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while events.len() < 2 && Instant::now() < deadline {
        bridge.tick();
        events.extend(rx.try_iter().filter_map(|e| match e {
            BridgeEvent::Telemetry(TelemetryEvent::EstimatedState(s)) => Some(s),
            _ => None,
        }));
    }
    bridge.stop();
    server.join().unwrap();

    assert_eq!(events.len(), 2, "expected two estimated-state events");

    // 姿态帧先提交
    assert!((events[0].roll - 0.1).abs() < 1e-6);
    assert!((events[0].pitch - 0.2).abs() < 1e-6);
    assert!((events[0].yaw - 0.3).abs() < 1e-6);

    // 位置帧合并进同一聚合：姿态保持，位置更新
    assert!((events[1].roll - 0.1).abs() < 1e-6);
    assert!((events[1].lat - 0.715_584_993).abs() < 1e-6);
    assert!((events[1].lon - (-0.139_626_340)).abs() < 1e-6);
    assert!((events[1].height - 10.0).abs() < 1e-9);

    let ctx = bridge.context();
    assert_eq!(ctx.active_system_id(), 1);
    assert_eq!(ctx.operational_status(), OperationalStatus::Normal);
    assert_eq!(ctx.metrics.snapshot().packets_translated, 2);
    assert!(ctx.metrics.snapshot().rx_bytes >= 2 * 36);
}

#[test]
fn connection_refused_is_not_fatal() {
    // 指向无人监听的端口：start 只告警，桥接保持可用
    let config = BridgeConfig {
        tcp_port: 1,
        connect_timeout_ms: 100,
        reconnect_delay_ms: 10,
        ..Default::default()
    };
    let (mut bridge, rx) = BridgeBuilder::new().config(config).build().unwrap();
    let rx = rx.unwrap();

    bridge.start();
    assert!(!bridge.is_connected());

    // 节拍继续运行：休眠后重试，不 panic、不产生遥测事件
    bridge.tick();
    bridge.tick();
    assert!(bridge.context().metrics.snapshot().reconnects >= 2);
    assert!(
        rx.try_iter()
            .all(|e| !matches!(e, BridgeEvent::Telemetry(_)))
    );
}
