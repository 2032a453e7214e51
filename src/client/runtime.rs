//! 客户端运行时：主控循环
//!
//! 单个协作任务独占 Session、UiController 与全部计时器，所有状态变更都发生在这里：
//! 关闭信号、用户命令、连接事件、心跳、重连、completing 回落、按钮防抖。
//! 与 UI 之间两条通道：UI -> 运行时的 Command，运行时 -> UI 的 UiState 快照。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::{
    decode, dispatch, AckBehavior, ChannelEvent, ChannelManager, Connector, Endpoint, Heartbeat,
};
use crate::config::AppConfig;
use crate::core::{
    ClientError, ReconnectDecision, ReconnectPolicy, ReconnectProgress, Screen, Session, UiState,
};
use crate::platform::ScreenLock;
use crate::ui::UiController;

/// 预算耗尽时展示给用户的错误
const LOST_CONNECTION: &str = "Lost connection to server";

/// 从 UI 发往运行时的用户命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 引导页上用户确认开始
    Start,
    /// 点击 Done
    CompleteTask,
    /// 终端重新获得焦点（相当于页面重新可见）
    VisibilityRegained,
    Quit,
}

/// 运行时参数（由 AppConfig 推导）
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub onboarding: bool,
    pub startup_delay: Duration,
    pub retry: ReconnectPolicy,
    pub heartbeat_interval: Duration,
    pub ack: AckBehavior,
    pub action_debounce: Duration,
}

impl ClientSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let ack = if cfg.ui.completing_state {
            AckBehavior::ViaCompleting {
                delay: Duration::from_millis(cfg.ui.completing_delay_ms),
            }
        } else {
            AckBehavior::Direct
        };
        Self {
            onboarding: cfg.app.onboarding,
            startup_delay: Duration::from_millis(cfg.app.startup_delay_ms),
            retry: ReconnectPolicy::new(
                cfg.connection.max_retries,
                Duration::from_millis(cfg.connection.retry_delay_ms),
            ),
            heartbeat_interval: Duration::from_millis(cfg.connection.heartbeat_interval_ms),
            ack,
            action_debounce: Duration::from_millis(cfg.ui.action_debounce_ms),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// spawn_client 的返回：命令发送端、状态接收端、运行时任务
pub struct ClientHandle {
    pub commands: mpsc::UnboundedSender<Command>,
    pub state: watch::Receiver<UiState>,
    pub task: JoinHandle<()>,
}

/// 已排期的连接尝试
#[derive(Debug, Clone, Copy)]
struct PendingConnect {
    at: Instant,
    reconnect: Option<ReconnectProgress>,
}

enum Wake {
    Shutdown,
    Command(Command),
    Channel(ChannelEvent),
    Heartbeat,
    Connect,
    ReturnToIdle,
    ReenableAction,
}

struct ClientRuntime {
    settings: ClientSettings,
    endpoint: Option<Endpoint>,
    channel: ChannelManager,
    session: Session,
    ui: UiController,
    screen_lock: Box<dyn ScreenLock>,
    shutdown: CancellationToken,
    started: bool,
    pending_connect: Option<PendingConnect>,
    return_to_idle_at: Option<Instant>,
}

/// 启动客户端运行时；endpoint 为 None 时直接进入配置错误界面，不会尝试连接
pub fn spawn_client(
    settings: ClientSettings,
    endpoint: Option<Endpoint>,
    connector: Arc<dyn Connector>,
    screen_lock: Box<dyn ScreenLock>,
    shutdown: CancellationToken,
) -> ClientHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (runtime, state_rx) = ClientRuntime::new(settings, endpoint, connector, screen_lock, shutdown);
    let task = tokio::spawn(runtime.run(cmd_rx));

    ClientHandle {
        commands: cmd_tx,
        state: state_rx,
        task,
    }
}

impl ClientRuntime {
    fn new(
        settings: ClientSettings,
        endpoint: Option<Endpoint>,
        connector: Arc<dyn Connector>,
        screen_lock: Box<dyn ScreenLock>,
        shutdown: CancellationToken,
    ) -> (Self, watch::Receiver<UiState>) {
        let initial = if settings.onboarding {
            Screen::Onboarding
        } else {
            Screen::Connecting
        };
        let (ui, state_rx) = UiController::new(initial, settings.action_debounce);
        let session = Session::new(&shutdown);

        let mut runtime = Self {
            settings,
            endpoint,
            channel: ChannelManager::new(connector),
            session,
            ui,
            screen_lock,
            shutdown,
            started: false,
            pending_connect: None,
            return_to_idle_at: None,
        };

        runtime
            .ui
            .set_endpoint(runtime.endpoint.as_ref().map(Endpoint::url));

        match &runtime.endpoint {
            None => {
                tracing::error!("{}", ClientError::NoEndpoint);
                runtime.ui.show_error(ClientError::NoEndpoint.to_string());
            }
            Some(_) if !runtime.settings.onboarding => {
                runtime.started = true;
                runtime.screen_lock.request();
                runtime.pending_connect = Some(PendingConnect {
                    at: Instant::now() + runtime.settings.startup_delay,
                    reconnect: None,
                });
            }
            Some(_) => {}
        }

        (runtime, state_rx)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut heartbeat = Heartbeat::new(self.settings.heartbeat_interval);
        tracing::info!(session_id = %self.session.id, "Client runtime started");

        loop {
            let wake = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => Wake::Shutdown,
                cmd = commands.recv() => match cmd {
                    Some(cmd) => Wake::Command(cmd),
                    None => Wake::Shutdown,
                },
                event = ChannelManager::next_event(&mut self.session) => Wake::Channel(event),
                _ = sleep_until_opt(self.pending_connect.map(|p| p.at)) => Wake::Connect,
                _ = sleep_until_opt(self.return_to_idle_at) => Wake::ReturnToIdle,
                _ = sleep_until_opt(self.ui.action_deadline()) => Wake::ReenableAction,
                _ = heartbeat.tick() => Wake::Heartbeat,
            };

            match wake {
                Wake::Shutdown | Wake::Command(Command::Quit) => break,
                Wake::Command(cmd) => self.handle_command(cmd),
                Wake::Channel(event) => self.handle_channel_event(event),
                Wake::Heartbeat => {
                    let _ = heartbeat.beat(&self.channel, &self.session);
                }
                Wake::Connect => self.connect_due(),
                Wake::ReturnToIdle => {
                    self.return_to_idle_at = None;
                    // 期间若已切到别的界面（如新指令），保持不动
                    if self.ui.screen() == Screen::Completing {
                        self.ui.show(Screen::Idle);
                    }
                }
                Wake::ReenableAction => self.ui.reenable_action(),
            }
        }

        self.teardown();
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start => {
                if self.ui.screen() != Screen::Onboarding || self.endpoint.is_none() {
                    tracing::debug!(screen = self.ui.screen().label(), "Start ignored");
                    return;
                }
                self.started = true;
                self.screen_lock.request();
                self.pending_connect = None;
                self.ui.show_connecting(None);
                self.open_channel();
            }
            Command::CompleteTask => {
                if let Some(message) = self.ui.complete_task() {
                    let _ = self.channel.send(&self.session, message);
                }
            }
            Command::VisibilityRegained => {
                if self.started && !self.screen_lock.is_held() {
                    self.screen_lock.request();
                }
            }
            Command::Quit => {}
        }
    }

    fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened => {
                self.channel.mark_open(&mut self.session);
                self.settings.retry.on_open(&mut self.session);
                tracing::info!(session_id = %self.session.id, "Connected to server");
            }
            ChannelEvent::Frame(text) => match decode(&text) {
                Ok(message) => {
                    tracing::debug!(?message, "Received");
                    let out = dispatch(message, &mut self.session, &mut self.ui, self.settings.ack);
                    if let Some(reply) = out.reply {
                        let _ = self.channel.send(&self.session, reply);
                    }
                    if let Some(delay) = out.return_to_idle_after {
                        self.return_to_idle_at = Some(Instant::now() + delay);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, len = text.len(), "Error parsing message, frame dropped");
                }
            },
            ChannelEvent::Error(e) => {
                // 之后的 Closed 负责恢复
                tracing::error!(error = %ClientError::Transport(e), "WebSocket error");
            }
            ChannelEvent::Closed => self.handle_close(),
        }
    }

    fn handle_close(&mut self) {
        self.channel.mark_closed(&mut self.session);
        tracing::info!(session_id = %self.session.id, "Disconnected from server");

        // 进入错误界面时传输已被丢弃，正常流程不会再收到 Closed；仍保证错误终态不被重连打断
        if self.ui.screen().is_terminal() {
            tracing::debug!("Error screen showing, not reconnecting");
            return;
        }

        match self.settings.retry.on_unexpected_close(&mut self.session) {
            ReconnectDecision::Retry { attempt, delay } => {
                tracing::info!(
                    attempt,
                    max = self.settings.retry.max_retries,
                    "Reconnecting... ({}/{})",
                    attempt,
                    self.settings.retry.max_retries
                );
                self.pending_connect = Some(PendingConnect {
                    at: Instant::now() + delay,
                    reconnect: Some(self.settings.retry.progress(attempt)),
                });
            }
            ReconnectDecision::GiveUp => {
                tracing::error!(
                    retries = self.session.retries(),
                    "Reconnect budget exhausted"
                );
                self.pending_connect = None;
                self.ui.show_error(LOST_CONNECTION);
            }
        }
    }

    fn connect_due(&mut self) {
        let Some(pending) = self.pending_connect.take() else {
            return;
        };
        if self.session.is_cancelled() {
            tracing::debug!("Session cancelled, dropping scheduled connect");
            return;
        }
        self.ui.show_connecting(pending.reconnect);
        self.open_channel();
    }

    fn open_channel(&mut self) {
        if let Some(endpoint) = &self.endpoint {
            self.channel.open(&mut self.session, endpoint);
        }
    }

    fn teardown(&mut self) {
        tracing::info!(session_id = %self.session.id, "Client runtime shutting down");
        self.pending_connect = None;
        self.return_to_idle_at = None;
        self.session.teardown();
        self.screen_lock.release();
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
