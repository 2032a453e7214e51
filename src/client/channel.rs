//! 通道管理：持久连接的打开、收发与生命周期事件
//!
//! 连接的读写在独立的泵任务中进行，只通过两条 mpsc 通道与运行时交换字符串和事件，从不触碰会话状态。
//! Connector 是可替换的接缝：生产环境用 tokio-tungstenite，测试用内存假实现。

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;

use crate::client::{Endpoint, OutboundMessage};
use crate::core::{Session, TransportState};

/// 传输层生命周期事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    /// 一帧文本（尚未解码）
    Frame(String),
    Error(String),
    Closed,
}

/// send 的结果：未连接时直接丢弃，不排队
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Dropped,
}

/// 运行时侧持有的连接句柄；drop 时取消连接
#[derive(Debug)]
pub struct ChannelHandle {
    outbound: mpsc::UnboundedSender<String>,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    cancel: CancellationToken,
}

/// 泵任务侧持有的对端
#[derive(Debug)]
pub struct ChannelPeer {
    pub events: mpsc::UnboundedSender<ChannelEvent>,
    pub outbound: mpsc::UnboundedReceiver<String>,
    pub cancel: CancellationToken,
}

impl ChannelHandle {
    /// 创建一对互连的句柄与对端，供 Connector 实现使用
    pub fn pair(cancel: CancellationToken) -> (ChannelHandle, ChannelPeer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            ChannelHandle {
                outbound: outbound_tx,
                events: events_rx,
                cancel: cancel.clone(),
            },
            ChannelPeer {
                events: events_tx,
                outbound: outbound_rx,
                cancel,
            },
        )
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// 连接器：根据 URL 打开一条连接，立即返回句柄；结果通过事件送达
pub trait Connector: Send + Sync {
    fn open(&self, url: &str, cancel: CancellationToken) -> ChannelHandle;
}

/// 基于 tokio-tungstenite 的 WebSocket 连接器
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, url: &str, cancel: CancellationToken) -> ChannelHandle {
        let (handle, peer) = ChannelHandle::pair(cancel);
        tokio::spawn(pump_websocket(url.to_string(), peer));
        handle
    }
}

/// 连接并在 socket 与通道之间搬运数据；连接失败同样以 Error + Closed 结束
async fn pump_websocket(url: String, peer: ChannelPeer) {
    let ChannelPeer {
        events,
        mut outbound,
        cancel,
    } = peer;

    let connected = tokio::select! {
        _ = cancel.cancelled() => return,
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };

    let ws_stream = match connected {
        Ok((ws_stream, response)) => {
            tracing::info!(url = %url, status = ?response.status(), "WebSocket connection established");
            ws_stream
        }
        Err(e) => {
            let _ = events.send(ChannelEvent::Error(e.to_string()));
            let _ = events.send(ChannelEvent::Closed);
            return;
        }
    };

    let _ = events.send(ChannelEvent::Opened);
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                // 主动关闭不上报 Closed，运行时已不再关心这条连接
                let _ = ws_tx.send(WsMessage::Close(None)).await;
                return;
            }
            out = outbound.recv() => match out {
                Some(text) => {
                    if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
                        let _ = events.send(ChannelEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    let _ = ws_tx.send(WsMessage::Close(None)).await;
                    return;
                }
            },
            incoming = ws_rx.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    let _ = events.send(ChannelEvent::Frame(text));
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    tracing::debug!(?frame, "WebSocket close frame received");
                    break;
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    tracing::debug!(len = data.len(), "Ignoring binary frame");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events.send(ChannelEvent::Error(e.to_string()));
                    break;
                }
                None => break,
            }
        }
    }

    let _ = events.send(ChannelEvent::Closed);
}

/// 通道管理器：在会话上打开连接、发送消息、读取事件
#[derive(Clone)]
pub struct ChannelManager {
    connector: Arc<dyn Connector>,
}

impl ChannelManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// 打开新连接，替换会话中旧的传输（旧连接随句柄 drop 被取消）
    pub fn open(&self, session: &mut Session, endpoint: &Endpoint) {
        session.transport = None;
        let url = endpoint.url();
        tracing::info!(session_id = %session.id, url = %url, "Connecting to controller");
        let handle = self
            .connector
            .open(&url, session.cancel_token().child_token());
        session.transport = Some(handle);
        session.transport_state = TransportState::Connecting;
    }

    /// 仅在传输处于 Open 时发送；否则记录并丢弃
    pub fn send(&self, session: &Session, message: OutboundMessage) -> SendOutcome {
        let handle = match session.transport.as_ref() {
            Some(handle) if session.transport_state == TransportState::Open => handle,
            _ => {
                tracing::error!(kind = message.kind(), "WebSocket not connected, message dropped");
                return SendOutcome::Dropped;
            }
        };

        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(kind = message.kind(), error = %e, "Failed to encode message");
                return SendOutcome::Dropped;
            }
        };

        if handle.outbound.send(text).is_err() {
            tracing::error!(kind = message.kind(), "Transport writer gone, message dropped");
            return SendOutcome::Dropped;
        }
        tracing::debug!(kind = message.kind(), "Sent");
        SendOutcome::Sent
    }

    /// 当前传输的下一个事件；无传输时永远挂起，事件流结束视为 Closed
    pub async fn next_event(session: &mut Session) -> ChannelEvent {
        match session.transport.as_mut() {
            Some(handle) => handle.events.recv().await.unwrap_or(ChannelEvent::Closed),
            None => std::future::pending().await,
        }
    }

    pub fn mark_open(&self, session: &mut Session) {
        session.transport_state = TransportState::Open;
    }

    /// 连接已断：丢弃传输，clientId 随旧连接失效
    pub fn mark_closed(&self, session: &mut Session) {
        session.transport = None;
        session.transport_state = TransportState::Closed;
        session.client_id = None;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeConnector;
    use super::*;
    use crate::client::Scheme;

    fn setup() -> (
        ChannelManager,
        mpsc::UnboundedReceiver<testing::FakeLink>,
        Session,
    ) {
        let (connector, links) = FakeConnector::new();
        let manager = ChannelManager::new(Arc::new(connector));
        let session = Session::new(&CancellationToken::new());
        (manager, links, session)
    }

    #[tokio::test]
    async fn test_send_dropped_until_open() {
        let (manager, mut links, mut session) = setup();
        assert_eq!(manager.send(&session, OutboundMessage::Ready), SendOutcome::Dropped);

        manager.open(&mut session, &Endpoint::new("127.0.0.1:7179", Scheme::Ws));
        let mut link = links.recv().await.unwrap();
        assert_eq!(link.url, "ws://127.0.0.1:7179");
        assert_eq!(session.transport_state(), TransportState::Connecting);
        assert_eq!(manager.send(&session, OutboundMessage::Ready), SendOutcome::Dropped);
        assert!(link.drain_sent().is_empty());

        link.emit(ChannelEvent::Opened);
        assert_eq!(ChannelManager::next_event(&mut session).await, ChannelEvent::Opened);
        manager.mark_open(&mut session);
        assert_eq!(manager.send(&session, OutboundMessage::Heartbeat), SendOutcome::Sent);
        assert_eq!(link.drain_sent(), vec![r#"{"type":"heartbeat"}"#.to_string()]);
    }

    #[tokio::test]
    async fn test_ended_event_stream_reports_closed() {
        let (manager, mut links, mut session) = setup();
        manager.open(&mut session, &Endpoint::new("localhost", Scheme::Ws));
        let link = links.recv().await.unwrap();
        drop(link);
        assert_eq!(ChannelManager::next_event(&mut session).await, ChannelEvent::Closed);
    }

    #[tokio::test]
    async fn test_reopen_cancels_previous_transport() {
        let (manager, mut links, mut session) = setup();
        let endpoint = Endpoint::new("localhost", Scheme::Ws);
        manager.open(&mut session, &endpoint);
        let first = links.recv().await.unwrap();
        manager.open(&mut session, &endpoint);
        let second = links.recv().await.unwrap();
        assert!(first.peer.cancel.is_cancelled());
        assert!(!second.peer.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_mark_closed_drops_transport_and_client_id() {
        let (manager, mut links, mut session) = setup();
        manager.open(&mut session, &Endpoint::new("localhost", Scheme::Ws));
        let link = links.recv().await.unwrap();
        manager.mark_open(&mut session);
        session.client_id = Some("abc".into());
        manager.mark_closed(&mut session);
        assert!(link.peer.cancel.is_cancelled());
        assert!(session.client_id.is_none());
        assert_eq!(manager.send(&session, OutboundMessage::Ready), SendOutcome::Dropped);
    }

    #[tokio::test]
    async fn test_session_teardown_cancels_transport() {
        let (manager, mut links, mut session) = setup();
        manager.open(&mut session, &Endpoint::new("localhost", Scheme::Ws));
        let link = links.recv().await.unwrap();
        session.teardown();
        assert!(link.peer.cancel.is_cancelled());
    }
}
