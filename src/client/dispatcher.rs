//! 消息分发
//!
//! 按 `type` 把解码后的入站消息映射到处理逻辑；每条消息至多产生一次界面切换和一条回复。
//! 未知类型只记日志，不会中断分发。

use std::time::Duration;

use crate::client::{InboundMessage, OutboundMessage};
use crate::core::{Instruction, Screen, Session};
use crate::ui::UiController;

/// acknowledged 的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckBehavior {
    /// 直接回到 idle
    Direct,
    /// 先显示 completing，delay 后回到 idle
    ViaCompleting { delay: Duration },
}

/// 分发结果：交给运行时执行的副作用
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub reply: Option<OutboundMessage>,
    pub return_to_idle_after: Option<Duration>,
}

pub fn dispatch(
    message: InboundMessage,
    session: &mut Session,
    ui: &mut UiController,
    ack: AckBehavior,
) -> Dispatched {
    match message {
        InboundMessage::Connected { client_id } => {
            tracing::info!(session_id = %session.id, client_id = %client_id, "Controller confirmed connection");
            session.client_id = Some(client_id);
            ui.show(Screen::Idle);
            Dispatched {
                reply: Some(OutboundMessage::Ready),
                ..Default::default()
            }
        }
        InboundMessage::Instruction {
            instruction,
            timestamp,
        } => {
            tracing::info!(instruction = %instruction, ?timestamp, "Instruction received");
            ui.show_instruction(Instruction {
                text: instruction,
                timestamp,
            });
            Dispatched::default()
        }
        InboundMessage::Acknowledged => match ack {
            AckBehavior::Direct => {
                ui.show(Screen::Idle);
                Dispatched::default()
            }
            AckBehavior::ViaCompleting { delay } => {
                ui.show(Screen::Completing);
                Dispatched {
                    return_to_idle_after: Some(delay),
                    ..Default::default()
                }
            }
        },
        InboundMessage::HeartbeatAck => {
            tracing::trace!("Heartbeat acknowledged");
            Dispatched::default()
        }
        InboundMessage::Unknown(kind) => {
            tracing::info!(kind = %kind, "Unknown message type, ignoring");
            Dispatched::default()
        }
    }
}
