//! Builder 模式实现
//!
//! 提供链式构造 [`Bridge`] 实例的便捷方式。

use crossbeam_channel::Receiver;

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::error::DriverError;
use crate::events::{BridgeEvent, EventBus};

/// Bridge Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use mavbridge_driver::{BridgeBuilder, BridgeConfig};
///
/// // 使用默认配置，自动创建事件通道
/// let (bridge, rx) = BridgeBuilder::new().build().unwrap();
/// assert!(rx.is_some());
///
/// // 注入外部总线时不再创建通道
/// let config = BridgeConfig::default();
/// let (bus, _rx) = mavbridge_driver::EventBus::channel();
/// let (bridge, rx) = BridgeBuilder::new()
///     .config(config)
///     .event_bus(bus)
///     .build()
///     .unwrap();
/// assert!(rx.is_none());
/// ```
pub struct BridgeBuilder {
    config: BridgeConfig,
    bus: Option<EventBus>,
}

impl BridgeBuilder {
    /// 创建新的 Builder
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::default(),
            bus: None,
        }
    }

    /// 设置桥接配置
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// 注入外部事件总线（缺省时 `build()` 自动创建无界通道）
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// 构造 Bridge
    ///
    /// 未注入总线时返回新建通道的接收端。
    pub fn build(self) -> Result<(Bridge, Option<Receiver<BridgeEvent>>), DriverError> {
        match self.bus {
            Some(bus) => Ok((Bridge::new(self.config, bus)?, None)),
            None => {
                let (bus, rx) = EventBus::channel();
                Ok((Bridge::new(self.config, bus)?, Some(rx)))
            },
        }
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
