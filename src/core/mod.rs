//! 核心层：错误、状态投影、会话、重连策略、优雅关闭

pub mod error;
pub mod retry;
pub mod session;
pub mod shutdown;
pub mod state;

pub use error::ClientError;
pub use retry::{ReconnectDecision, ReconnectPolicy};
pub use session::{Session, TransportState};
pub use shutdown::{ShutdownManager, ShutdownReason};
pub use state::{Instruction, ReconnectProgress, Screen, UiState};
