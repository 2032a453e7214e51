//! 状态定义：Screen 与 UiState 投影
//!
//! UI 只持有轻量的 UiState（当前界面、指令、错误、按钮是否可用）；会话与计时器由运行时维护并投影到 UiState。

/// 当前可见界面，任意时刻只有一个处于激活状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Onboarding,
    Connecting,
    Idle,
    InstructionShown,
    Completing,
    Error,
}

impl Screen {
    /// 终态：已向用户展示错误，不再自动重连
    pub fn is_terminal(&self) -> bool {
        matches!(self, Screen::Error)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Screen::Onboarding => "onboarding",
            Screen::Connecting => "connecting",
            Screen::Idle => "idle",
            Screen::InstructionShown => "instruction",
            Screen::Completing => "completing",
            Screen::Error => "error",
        }
    }
}

/// 控制端下发的指令（只用于当前界面展示，不做保存）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub text: String,
    /// 毫秒时间戳
    pub timestamp: Option<u64>,
}

/// 重连进度（第几次 / 上限）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectProgress {
    pub attempt: u32,
    pub max: u32,
}

/// UI 看到的「投影」状态，轻量且易于渲染
#[derive(Clone, Debug)]
pub struct UiState {
    pub screen: Screen,
    pub instruction: Option<Instruction>,
    pub error_message: Option<String>,
    /// Done 按钮是否可点（防抖期间为 false）
    pub action_enabled: bool,
    pub endpoint: Option<String>,
    pub reconnect: Option<ReconnectProgress>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::Onboarding,
            instruction: None,
            error_message: None,
            action_enabled: true,
            endpoint: None,
            reconnect: None,
        }
    }
}
