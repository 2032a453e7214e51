//! 地址解析
//!
//! 启动时运行一次：优先使用启动参数覆盖（`--server` / `HCP_SERVER`），否则按模式查配置中的服务器表。
//! 两者都没有、或覆盖地址带了不支持的协议前缀时返回 None，由运行时直接展示配置错误，不尝试连接。

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::Deserialize;

use crate::config::{AppConfig, Mode};

/// WebSocket 协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// 明文 ws
    Ws,
    /// TLS wss
    #[default]
    Wss,
}

impl Scheme {
    /// 无显式协议时的回退规则：主机名恰为 localhost 或回环 IP 用 ws，其余一律 wss
    pub fn for_host(host: &str) -> Self {
        if is_loopback_host(host_part(host)) {
            Scheme::Ws
        } else {
            Scheme::Wss
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Ws => write!(f, "ws"),
            Scheme::Wss => write!(f, "wss"),
        }
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ws" => Ok(Scheme::Ws),
            "wss" => Ok(Scheme::Wss),
            other => Err(format!("unknown scheme '{}', expected ws or wss", other)),
        }
    }
}

/// 控制端地址：主机（可带端口）+ 协议，会话期间不变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub scheme: Scheme,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, scheme: Scheme) -> Self {
        Self {
            host: host.into(),
            scheme,
        }
    }

    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// 启动参数中与地址相关的部分
#[derive(Debug, Clone, Default)]
pub struct LaunchParams {
    /// 覆盖地址，可带 ws:// / wss:// 前缀
    pub server: Option<String>,
    /// 显式指定协议，优先于主机名规则
    pub scheme: Option<Scheme>,
    /// 覆盖配置中的模式
    pub mode: Option<Mode>,
}

/// 解析控制端地址：覆盖参数 > 配置表
pub fn resolve(params: &LaunchParams, config: &AppConfig) -> Option<Endpoint> {
    if let Some(server) = params
        .server
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let endpoint = from_override(server, params.scheme)?;
        tracing::debug!(endpoint = %endpoint, "Endpoint resolved from launch override");
        return Some(endpoint);
    }

    let mode = params.mode.unwrap_or(config.app.mode);
    let entry = config.servers.entry(mode);
    let host = entry.server.trim();
    if host.is_empty() {
        tracing::warn!(?mode, "No server configured for mode");
        return None;
    }

    let endpoint = Endpoint::new(host, entry.protocol);
    tracing::debug!(endpoint = %endpoint, ?mode, "Endpoint resolved from config");
    Some(endpoint)
}

/// 前缀不区分大小写；ws/wss 以外的前缀（如 http://）视为无效地址
fn from_override(server: &str, scheme: Option<Scheme>) -> Option<Endpoint> {
    if let Some((prefix, host)) = server.split_once("://") {
        return match prefix.parse::<Scheme>() {
            Ok(scheme) if !host.is_empty() => Some(Endpoint::new(host, scheme)),
            _ => {
                tracing::warn!(server = %server, "Unsupported server address, expected ws:// or wss://");
                None
            }
        };
    }
    let scheme = scheme.unwrap_or_else(|| Scheme::for_host(server));
    Some(Endpoint::new(server, scheme))
}

/// 从 host[:port][/path] 中取出主机部分，支持 [::1]:7179 形式
fn host_part(authority: &str) -> &str {
    let authority = authority.split('/').next().unwrap_or(authority);
    if let Some(rest) = authority.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    // 未加方括号的 IPv6 字面量
    if authority.matches(':').count() > 1 {
        return authority;
    }
    authority.split(':').next().unwrap_or(authority)
}

fn is_loopback_host(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}
