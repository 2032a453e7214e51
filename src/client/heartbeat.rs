//! 心跳（保活信号）
//!
//! 固定周期触发；触发时传输已打开则发送 heartbeat，否则什么都不做。
//! 心跳活在运行时任务里，运行时退出即停止。

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::client::{ChannelManager, OutboundMessage, SendOutcome};
use crate::core::Session;

pub struct Heartbeat {
    interval: Interval,
}

impl Heartbeat {
    /// 第一次心跳在一个周期之后
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// 传输未打开时返回 None（不发送、不记失败）
    pub fn beat(&self, channel: &ChannelManager, session: &Session) -> Option<SendOutcome> {
        if !session.is_open() {
            return None;
        }
        Some(channel.send(session, OutboundMessage::Heartbeat))
    }
}
