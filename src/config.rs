//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `HCP__*` 覆盖（双下划线表示嵌套，如 `HCP__CONNECTION__MAX_RETRIES=5`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::client::Scheme;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub servers: ServersSection,
    pub connection: ConnectionSection,
    pub ui: UiSection,
}

/// 运行模式，选择 [servers] 中的一项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    #[serde(alias = "dev")]
    Development,
    #[serde(alias = "prod")]
    Production,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// [app] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub mode: Mode,
    /// 为 true 时先停在引导页，用户确认后才连接并申请屏幕常亮
    pub onboarding: bool,
    /// 无引导页时第一次连接前的延迟（毫秒）
    pub startup_delay_ms: u64,
    /// TUI 占用终端，日志写入文件；None 时不输出日志
    pub log_file: Option<PathBuf>,
    pub inhibit_idle: bool,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            mode: Mode::Development,
            onboarding: true,
            startup_delay_ms: 500,
            log_file: Some(PathBuf::from("hcp-client.log")),
            inhibit_idle: false,
        }
    }
}

/// 单个模式下的服务器地址（不含协议前缀）与协议
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEntry {
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub protocol: Scheme,
}

/// [servers] 段：按模式区分的静态服务器表
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServersSection {
    pub development: ServerEntry,
    pub production: ServerEntry,
}

impl ServersSection {
    pub fn entry(&self, mode: Mode) -> &ServerEntry {
        match mode {
            Mode::Development => &self.development,
            Mode::Production => &self.production,
        }
    }
}

impl Default for ServersSection {
    fn default() -> Self {
        Self {
            development: ServerEntry {
                server: "localhost:7179".to_string(),
                protocol: Scheme::Ws,
            },
            production: ServerEntry {
                server: String::new(),
                protocol: Scheme::Wss,
            },
        }
    }
}

/// [connection] 段：重连预算与心跳
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub heartbeat_interval_ms: u64,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            max_retries: 10,
            retry_delay_ms: 2000,
            heartbeat_interval_ms: 30_000,
        }
    }
}

/// [ui] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSection {
    /// acknowledged 是否经过 completing 过渡页再回到 idle
    pub completing_state: bool,
    pub completing_delay_ms: u64,
    /// Done 按钮防抖时长
    pub action_debounce_ms: u64,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            completing_state: false,
            completing_delay_ms: 2000,
            action_debounce_ms: 1000,
        }
    }
}

/// 从 config 目录加载配置，环境变量 HCP__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 HCP__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("HCP")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
