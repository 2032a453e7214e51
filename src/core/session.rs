//! 会话：与控制端的逻辑连接
//!
//! 持有当前传输句柄、控制端分配的 clientId、重连计数与会话级 CancellationToken。
//! 会话对象由运行时独占，显式传给 ChannelManager / dispatcher / UiController，不存在全局状态。

use tokio_util::sync::CancellationToken;

use crate::client::ChannelHandle;

/// 传输层状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Open,
    Closed,
}

/// 单个会话
#[derive(Debug)]
pub struct Session {
    /// 本地会话 ID（仅用于日志关联）
    pub id: String,
    /// 控制端确认连接后分配的 ID
    pub client_id: Option<String>,
    pub(crate) transport: Option<ChannelHandle>,
    pub(crate) transport_state: TransportState,
    retries: u32,
    /// 会话创建时取得；关闭时取消，挂起的重连随之失效
    cancel_token: CancellationToken,
}

impl Session {
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            id: format!("session_{}", uuid::Uuid::new_v4()),
            client_id: None,
            transport: None,
            transport_state: TransportState::Closed,
            retries: 0,
            cancel_token: parent.child_token(),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub(crate) fn record_retry(&mut self) -> u32 {
        self.retries += 1;
        self.retries
    }

    pub(crate) fn reset_retries(&mut self) {
        self.retries = 0;
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport_state
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some() && self.transport_state == TransportState::Open
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// 拆除会话：取消令牌，丢弃传输
    pub fn teardown(&mut self) {
        self.cancel_token.cancel();
        self.transport = None;
        self.transport_state = TransportState::Closed;
        self.client_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_closed_and_fresh() {
        let root = CancellationToken::new();
        let session = Session::new(&root);
        assert!(session.id.starts_with("session_"));
        assert_eq!(session.retries(), 0);
        assert_eq!(session.transport_state(), TransportState::Closed);
        assert!(!session.is_open());
        assert!(session.client_id.is_none());
    }

    #[test]
    fn test_teardown_cancels_token() {
        let root = CancellationToken::new();
        let mut session = Session::new(&root);
        let token = session.cancel_token();
        session.teardown();
        assert!(token.is_cancelled());
        assert!(session.is_cancelled());
        assert!(!root.is_cancelled());
    }

    #[test]
    fn test_root_cancel_propagates() {
        let root = CancellationToken::new();
        let session = Session::new(&root);
        root.cancel();
        assert!(session.is_cancelled());
    }
}
