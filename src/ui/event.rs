//! 事件处理
//!
//! 轮询 crossterm 键盘与焦点事件，按当前界面转成 Command 发送给运行时：
//! 引导页 Enter 开始，指令页 Enter/Space 完成，q/Esc/Ctrl+C 退出，终端重新获得焦点视为页面可见。

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::client::Command;
use crate::core::Screen;

/// 应用事件：已转发给运行时的 Command，或无需处理的按键
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Command(Command),
    Ignored,
}

/// 事件处理器：持有 cmd_tx，poll 时读终端事件并返回 AppEvent
pub struct EventHandler {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl EventHandler {
    pub fn new(cmd_tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { cmd_tx }
    }

    pub fn poll(&self, screen: Screen) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(std::time::Duration::from_millis(100))? {
            let ev = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key, screen),
                Event::FocusGained => Some(Command::VisibilityRegained),
                _ => None,
            };
            return Ok(Some(match ev {
                Some(cmd) => {
                    let _ = self.cmd_tx.send(cmd.clone());
                    AppEvent::Command(cmd)
                }
                None => AppEvent::Ignored,
            }));
        }
        Ok(None)
    }
}

/// 按键到命令的映射；与当前界面无关的按键返回 None
pub fn map_key(key: KeyEvent, screen: Screen) -> Option<Command> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Enter if screen == Screen::Onboarding => Some(Command::Start),
        KeyCode::Enter | KeyCode::Char(' ') if screen == Screen::InstructionShown => {
            Some(Command::CompleteTask)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_enter_depends_on_screen() {
        assert_eq!(map_key(key(KeyCode::Enter), Screen::Onboarding), Some(Command::Start));
        assert_eq!(
            map_key(key(KeyCode::Enter), Screen::InstructionShown),
            Some(Command::CompleteTask)
        );
        assert_eq!(map_key(key(KeyCode::Enter), Screen::Idle), None);
        assert_eq!(map_key(key(KeyCode::Enter), Screen::Error), None);
    }

    #[test]
    fn test_space_only_completes_instruction() {
        assert_eq!(
            map_key(key(KeyCode::Char(' ')), Screen::InstructionShown),
            Some(Command::CompleteTask)
        );
        assert_eq!(map_key(key(KeyCode::Char(' ')), Screen::Onboarding), None);
    }

    #[test]
    fn test_quit_keys_work_everywhere() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for screen in [Screen::Connecting, Screen::Error, Screen::InstructionShown] {
            assert_eq!(map_key(ctrl_c, screen), Some(Command::Quit));
            assert_eq!(map_key(key(KeyCode::Esc), screen), Some(Command::Quit));
            assert_eq!(map_key(key(KeyCode::Char('q')), screen), Some(Command::Quit));
        }
        assert_eq!(map_key(key(KeyCode::Char('x')), Screen::Idle), None);
    }
}
