//! 客户端错误类型
//!
//! 各层在发现错误的地方就地处理（记日志、切换界面或丢弃操作），错误不会跨组件抛出。

use thiserror::Error;

/// 客户端运行过程中可能出现的错误（配置、帧解析、传输）
#[derive(Error, Debug)]
pub enum ClientError {
    /// 既没有启动参数覆盖，也没有配置表项
    #[error("No server address provided")]
    NoEndpoint,

    #[error("Frame has no string 'type' field")]
    MissingType,

    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}
