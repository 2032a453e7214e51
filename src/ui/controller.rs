//! UI 状态控制器
//!
//! 维护「当前显示哪个界面」的互斥状态机，每次变更都通过 watch 通道发布一份完整 UiState 给 TUI。
//! 同时负责 Done 按钮的防抖：点击后禁用，到期由运行时调用 reenable_action 恢复。

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::client::OutboundMessage;
use crate::core::{Instruction, ReconnectProgress, Screen, UiState};

pub struct UiController {
    state: UiState,
    state_tx: watch::Sender<UiState>,
    debounce: Duration,
    /// 按钮恢复可点的时间点
    reenable_at: Option<Instant>,
}

impl UiController {
    pub fn new(initial: Screen, debounce: Duration) -> (Self, watch::Receiver<UiState>) {
        let state = UiState {
            screen: initial,
            ..UiState::default()
        };
        let (state_tx, state_rx) = watch::channel(state.clone());
        (
            Self {
                state,
                state_tx,
                debounce,
                reenable_at: None,
            },
            state_rx,
        )
    }

    pub fn screen(&self) -> Screen {
        self.state.screen
    }

    pub fn set_endpoint(&mut self, endpoint: Option<String>) {
        self.state.endpoint = endpoint;
        self.publish();
    }

    /// 取消其它界面，只激活 screen；与新界面无关的数据一并清掉
    pub fn show(&mut self, screen: Screen) {
        if self.state.screen != screen {
            tracing::debug!(from = self.state.screen.label(), to = screen.label(), "Screen transition");
        }
        self.state.screen = screen;
        if screen != Screen::InstructionShown {
            self.state.instruction = None;
        }
        if screen != Screen::Error {
            self.state.error_message = None;
        }
        if screen != Screen::Connecting {
            self.state.reconnect = None;
        }
        self.publish();
    }

    pub fn show_connecting(&mut self, reconnect: Option<ReconnectProgress>) {
        self.state.reconnect = reconnect;
        self.show(Screen::Connecting);
    }

    pub fn show_instruction(&mut self, instruction: Instruction) {
        self.state.instruction = Some(instruction);
        self.show(Screen::InstructionShown);
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.state.error_message = Some(message.into());
        self.show(Screen::Error);
    }

    /// 用户点击 Done：按钮可用时禁用它并返回 task_completed；防抖期间重复点击返回 None
    pub fn complete_task(&mut self) -> Option<OutboundMessage> {
        if !self.state.action_enabled {
            tracing::debug!("Done pressed while debounced, ignoring");
            return None;
        }
        self.state.action_enabled = false;
        self.reenable_at = Some(Instant::now() + self.debounce);
        self.publish();
        Some(OutboundMessage::TaskCompleted)
    }

    pub fn action_deadline(&self) -> Option<Instant> {
        self.reenable_at
    }

    pub fn reenable_action(&mut self) {
        self.reenable_at = None;
        self.state.action_enabled = true;
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
