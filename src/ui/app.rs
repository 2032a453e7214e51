//! TUI 应用主循环
//!
//! 进入全屏/原始模式，轮询 state_rx 与终端事件，将按键与焦点变化转为 Command 发送给运行时，
//! 每帧用 draw 渲染 UiState。收到 Quit 或关闭信号时退出并恢复终端。

use std::io::{self, Stdout};

use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::client::Command;
use crate::core::{ShutdownManager, ShutdownReason, UiState};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::draw;

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(
    state_rx: watch::Receiver<UiState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    shutdown: &ShutdownManager,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, state_rx, cmd_tx, shutdown).await;

    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: watch::Receiver<UiState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    shutdown: &ShutdownManager,
) -> anyhow::Result<()> {
    let event_handler = EventHandler::new(cmd_tx);

    loop {
        if shutdown.is_shutdown() {
            break;
        }

        let state = state_rx.borrow().clone();
        terminal.draw(|f| draw(f, &state))?;

        if let Some(AppEvent::Command(Command::Quit)) = event_handler.poll(state.screen)? {
            tracing::info!("Quit requested from terminal");
            shutdown.shutdown(ShutdownReason::UserInitiated);
            break;
        }

        tokio::task::yield_now().await;
    }

    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;
    Ok(())
}
