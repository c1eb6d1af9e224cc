//! 桥接循环
//!
//! 每个调度节拍：有链路时轮询（有界超时）、读取、解析、分发
//! （单节拍帧数有上限），随后更新链路健康与对外运行状态；无链路时
//! 短暂休眠后重连。读写失败一律整体拆除链路并立刻原地重连，不做
//! 退避——这是刻意的简单性/可用性取舍，代价是链路持续故障时会以
//! 固定休眠间隔为界紧密重试。
//!
//! 桥接不拥有调度循环：外部调度器驱动 `start`/`tick`/`stop`；
//! 没有调度器的调用方可以用 `run` 自转。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, error, info, trace, warn};

use mavbridge_link::{Link, LinkError};
use mavbridge_protocol::{DataStream, FrameParser, MessageId, RequestDataStream, encode_frame};

use crate::config::BridgeConfig;
use crate::error::DriverError;
use crate::events::{EventBus, LinkEvent};
use crate::health::{LinkHealthMonitor, LinkStatus};
use crate::state::{BridgeContext, OperationalStatus};
use crate::translate::{Aggregates, translate_packet};

/// 接收缓冲区大小
const RX_BUF_LEN: usize = 512;

/// 本端（地面侧）出站帧使用的系统/组件 ID
const LOCAL_SYS_ID: u8 = 255;
const LOCAL_COMP_ID: u8 = 0;

/// 遥测桥接
///
/// 单逻辑线程：桥接循环是链路、解析器、聚合状态、活跃系统 ID 和
/// 链路健康的唯一写者。观察者通过 [`BridgeContext`] 读取快照。
pub struct Bridge {
    config: BridgeConfig,
    link: Option<Box<dyn Link + Send>>,
    parser: FrameParser,
    agg: Aggregates,
    health: LinkHealthMonitor,
    bus: EventBus,
    ctx: Arc<BridgeContext>,
    /// 链路专属的接收缓冲区，以独占引用喂给解析器
    buf: [u8; RX_BUF_LEN],
    /// 最近成功翻译帧的来源系统 ID（sysid pinning）
    active_sysid: u8,
    tx_seq: u8,
    /// 已记录的丢帧数（用于只记录新增）
    logged_drops: u64,
}

impl Bridge {
    /// 创建桥接（校验配置，不建立链路）
    pub fn new(mut config: BridgeConfig, bus: EventBus) -> Result<Self, DriverError> {
        config.validate()?;
        let health = LinkHealthMonitor::new(config.comm_timeout());
        Ok(Self {
            config,
            link: None,
            parser: FrameParser::new(),
            agg: Aggregates::new(),
            health,
            bus,
            ctx: Arc::new(BridgeContext::new()),
            buf: [0u8; RX_BUF_LEN],
            active_sysid: 1,
            tx_seq: 0,
            logged_drops: 0,
        })
    }

    /// 共享读取上下文
    pub fn context(&self) -> Arc<BridgeContext> {
        self.ctx.clone()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// 尝试建立链路（失败只告警，循环稍后重试）
    pub fn start(&mut self) {
        self.open_link();
    }

    /// 拆除链路
    pub fn stop(&mut self) {
        if self.link.take().is_some() {
            info!("telemetry link closed");
        }
    }

    /// 执行一个调度节拍
    pub fn tick(&mut self) {
        if self.link.is_some() {
            self.handle_link_data();
        } else {
            // 无链路：固定间隔休眠后重连
            spin_sleep::sleep(self.config.reconnect_delay());
            self.ctx.metrics.reconnects.fetch_add(1, Ordering::Relaxed);
            self.open_link();
        }

        // 依据链路健康更新对外运行状态
        let status = if self.health.is_missing() {
            OperationalStatus::Error
        } else {
            OperationalStatus::Normal
        };
        self.ctx.operational.store(status as u8, Ordering::Relaxed);
    }

    /// 自转驱动节拍直到停止信号置位
    ///
    /// 停止信号在节拍边界检查，进行中的读取不会被打断。
    pub fn run(&mut self, stop: &AtomicBool) {
        self.start();
        while !stop.load(Ordering::Relaxed) {
            self.tick();
        }
        self.stop();
    }

    /// 请求自驾仪按给定速率下发各数据流分组
    pub fn request_streams(&mut self, rate_hz: u8) {
        let requests = [
            (DataStream::Extra1, rate_hz as u16, true), // 姿态
            (DataStream::Extra2, rate_hz as u16, true), // HUD 概要
            (DataStream::Position, rate_hz as u16, true),
            (DataStream::ExtendedStatus, (rate_hz / 5) as u16, true),
            (DataStream::Extra3, 1, true),   // 硬件状态/风/系统时钟
            (DataStream::RawSensors, 50, true), // IMU/气压
            (DataStream::RcChannels, 1, false), // 不需要 RC 流
        ];

        for (stream, rate_hz, start) in requests {
            let req = RequestDataStream {
                rate_hz,
                target_system: self.active_sysid,
                target_component: 0,
                stream,
                start,
            };
            let seq = self.next_seq();
            match encode_frame(
                seq,
                LOCAL_SYS_ID,
                LOCAL_COMP_ID,
                u8::from(MessageId::RequestDataStream),
                &req.encode_payload(),
            ) {
                Ok(frame) => {
                    self.send_data(&frame);
                    debug!(
                        "stream {:?} requested at {} Hz (start={})",
                        stream, rate_hz, start
                    );
                },
                Err(e) => warn!("failed to encode stream request: {}", e),
            }
        }
    }

    fn next_seq(&mut self) -> u8 {
        let seq = self.tx_seq;
        self.tx_seq = self.tx_seq.wrapping_add(1);
        seq
    }

    fn open_link(&mut self) {
        match mavbridge_link::open(&self.config.link_config()) {
            Ok(link) => {
                self.link = Some(link);
                info!("telemetry link initialized");
                if let Some(rate) = self.config.stream_rate {
                    self.request_streams(rate);
                }
            },
            Err(e) => {
                warn!("connection failed, retrying: {}", e);
                self.ctx.metrics.link_errors.fetch_add(1, Ordering::Relaxed);
            },
        }
    }

    /// 读/写失败的统一出口：整体拆除并立刻原地重连（无退避）
    fn recover_link(&mut self, err: LinkError) {
        error!("{}", err);
        warn!("connection lost, retrying");
        self.link = None;
        self.ctx.metrics.link_errors.fetch_add(1, Ordering::Relaxed);
        self.ctx.metrics.reconnects.fetch_add(1, Ordering::Relaxed);
        self.bus.link(LinkEvent::ConnectionFailed);
        self.open_link();
    }

    fn poll_link(&mut self) -> bool {
        let result = match self.link.as_mut() {
            Some(link) => link.poll(self.config.poll_timeout()),
            None => return false,
        };
        match result {
            Ok(ready) => ready,
            Err(e) => {
                self.recover_link(e);
                false
            },
        }
    }

    fn receive_data(&mut self) -> usize {
        let result = match self.link.as_mut() {
            Some(link) => link.read(&mut self.buf),
            None => return 0,
        };
        match result {
            Ok(n) => n,
            Err(e) => {
                self.recover_link(e);
                0
            },
        }
    }

    fn send_data(&mut self, bytes: &[u8]) -> usize {
        let result = match self.link.as_mut() {
            Some(link) => link.write(bytes),
            None => return 0,
        };
        match result {
            Ok(n) => n,
            Err(e) => {
                self.recover_link(e);
                0
            },
        }
    }

    fn handle_link_data(&mut self) {
        let mut packets = 0usize;
        let mut now = Instant::now();

        // 有界轮询 + 单节拍帧数上限：一条吵闹的链路不能饿死其它职责
        while packets < self.config.packet_cap && self.poll_link() {
            let n = self.receive_data();
            if n == 0 {
                break;
            }
            self.ctx.metrics.rx_bytes.fetch_add(n as u64, Ordering::Relaxed);
            now = Instant::now();

            for i in 0..n {
                let byte = self.buf[i];
                if let Some(pkt) = self.parser.push(byte) {
                    if translate_packet(&pkt, &mut self.agg, &self.ctx, &self.bus) {
                        // sysid pinning：无条件采纳最近成功翻译帧的来源
                        self.active_sysid = pkt.sys_id;
                        self.ctx
                            .active_system_id
                            .store(pkt.sys_id, Ordering::Relaxed);
                        self.health.register_packet(now);
                        self.ctx
                            .metrics
                            .packets_translated
                            .fetch_add(1, Ordering::Relaxed);
                        packets += 1;
                    }
                }
            }

            self.note_parse_failures();
        }

        // 链路健康：edge-triggered，转换只报告一次
        match self.health.tick(now) {
            Some(LinkStatus::Missing) => {
                warn!("no telemetry data for {}s", self.config.comm_timeout_s);
                self.bus.link(LinkEvent::MissingData);
            },
            Some(LinkStatus::Normal) => {
                info!("telemetry data restored");
                self.bus.link(LinkEvent::Active);
            },
            None => {},
        }
    }

    /// 丢帧只新增记录一次，并带上失败时所处的解析阶段
    fn note_parse_failures(&mut self) {
        let drops = self.parser.drop_count();
        if drops > self.logged_drops {
            trace!(
                "{} frame(s) dropped, last failure at stage {:?}",
                drops - self.logged_drops,
                self.parser.last_failure()
            );
            self.ctx
                .metrics
                .packets_dropped
                .fetch_add(drops - self.logged_drops, Ordering::Relaxed);
            self.logged_drops = drops;
        }
    }
}
