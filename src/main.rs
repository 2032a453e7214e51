//! HCP 演出客户端
//!
//! 入口：解析命令行、加载配置、初始化日志、解析服务器地址，启动客户端运行时与 TUI。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hcp_client::client::{resolve, spawn_client, ClientSettings, LaunchParams, Scheme, WsConnector};
use hcp_client::config::{load_config, AppConfig, Mode};
use hcp_client::core::{ClientError, ShutdownManager, ShutdownReason};
use hcp_client::platform::{InhibitScreenLock, NoopScreenLock, ScreenLock};
use hcp_client::ui::run_app;

#[derive(Parser, Debug)]
#[command(name = "hcp-client", version, about = "Receive stage instructions over WebSocket")]
struct Args {
    /// 控制端地址，可带 ws:// / wss:// 前缀
    #[arg(long, env = "HCP_SERVER")]
    server: Option<String>,

    /// 强制协议（ws / wss）
    #[arg(long)]
    scheme: Option<Scheme>,

    /// 运行模式（development / production）
    #[arg(long)]
    mode: Option<Mode>,

    /// 配置文件路径
    #[arg(long)]
    config: Option<PathBuf>,

    /// 跳过引导页，启动后直接连接
    #[arg(long)]
    no_onboarding: bool,

    /// 日志文件路径
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (mut cfg, config_err) = match load_config(args.config.clone()) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(ClientError::from(e))),
    };
    if args.no_onboarding {
        cfg.app.onboarding = false;
    }

    let log_file = args.log_file.clone().or_else(|| cfg.app.log_file.clone());
    hcp_client::observability::init(log_file.as_deref()).context("Failed to init logging")?;
    if let Some(e) = config_err {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
    }

    let params = LaunchParams {
        server: args.server,
        scheme: args.scheme,
        mode: args.mode,
    };
    let endpoint = resolve(&params, &cfg);
    match &endpoint {
        Some(endpoint) => tracing::info!(url = %endpoint.url(), "Server endpoint resolved"),
        None => tracing::error!("No server address configured"),
    }

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let screen_lock: Box<dyn ScreenLock> = if cfg.app.inhibit_idle {
        Box::new(InhibitScreenLock::new())
    } else {
        Box::new(NoopScreenLock)
    };

    let client = spawn_client(
        ClientSettings::from_config(&cfg),
        endpoint,
        Arc::new(WsConnector),
        screen_lock,
        shutdown.token(),
    );

    let ui_result = run_app(client.state, client.commands, &shutdown).await;
    if let Err(e) = &ui_result {
        shutdown.shutdown(ShutdownReason::FatalError(e.to_string()));
    } else {
        shutdown.shutdown(ShutdownReason::UserInitiated);
    }

    client.task.await.context("Client runtime panicked")?;
    match shutdown.reason() {
        Some(ShutdownReason::FatalError(e)) => tracing::error!(error = %e, "Client exited after fatal error"),
        reason => tracing::info!(?reason, "Client exited"),
    }
    ui_result.context("App run failed")
}
