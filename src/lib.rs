//! HCP 演出客户端
//!
//! 通过 WebSocket 连接控制端，实时显示指令，用户完成动作后回报；断线按固定预算自动重连。
//!
//! 模块划分：
//! - **client**: 地址解析、消息协议、连接管理、分发、心跳与主控运行时
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 会话、重连策略、界面状态、错误类型、优雅关闭
//! - **observability**: 日志初始化
//! - **platform**: 平台能力（屏幕常亮）
//! - **ui**: Ratatui TUI 界面与界面状态控制器

pub mod client;
pub mod config;
pub mod core;
pub mod observability;
pub mod platform;
pub mod ui;
