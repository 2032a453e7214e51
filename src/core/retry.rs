//! 重连策略
//!
//! 意外断开时根据会话的重连计数返回 ReconnectDecision：在预算内则计数 +1 并给出固定延迟，预算耗尽则放弃。

use std::time::Duration;

use crate::core::{ReconnectProgress, Session};

/// 意外断开后的决策
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// 在 delay 之后发起第 attempt 次重连
    Retry { attempt: u32, delay: Duration },
    /// 预算耗尽，进入错误终态
    GiveUp,
}

/// 固定延迟、有上限的重连策略
#[derive(Clone, Copy, Debug)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl ReconnectPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// 连接成功：计数无条件清零
    pub fn on_open(&self, session: &mut Session) {
        session.reset_retries();
    }

    /// 意外断开：计数只在低于上限时递增
    pub fn on_unexpected_close(&self, session: &mut Session) -> ReconnectDecision {
        if session.retries() < self.max_retries {
            let attempt = session.record_retry();
            ReconnectDecision::Retry {
                attempt,
                delay: self.delay,
            }
        } else {
            ReconnectDecision::GiveUp
        }
    }

    pub fn progress(&self, attempt: u32) -> ReconnectProgress {
        ReconnectProgress {
            attempt,
            max: self.max_retries,
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_millis(2000))
    }
}
