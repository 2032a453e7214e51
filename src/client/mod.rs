//! 客户端：与控制端之间的连接生命周期
//!
//! - **resolver**: 启动参数 / 配置表 -> Endpoint
//! - **protocol**: 入站 / 出站消息与 JSON 编解码
//! - **channel**: Connector 接缝、连接泵任务、ChannelManager
//! - **dispatcher**: 入站消息 -> 界面切换与回复
//! - **heartbeat**: 固定周期保活
//! - **runtime**: 单任务事件循环，独占会话、界面与所有计时器

pub mod channel;
pub mod dispatcher;
pub mod heartbeat;
pub mod protocol;
pub mod resolver;
pub mod runtime;

pub use channel::{ChannelEvent, ChannelHandle, ChannelManager, ChannelPeer, Connector, SendOutcome, WsConnector};
pub use dispatcher::{dispatch, AckBehavior, Dispatched};
pub use heartbeat::Heartbeat;
pub use protocol::{decode, InboundMessage, OutboundMessage};
pub use resolver::{resolve, Endpoint, LaunchParams, Scheme};
pub use runtime::{spawn_client, ClientHandle, ClientSettings, Command};
