//! 界面渲染
//!
//! 根据 UiState 绘制当前唯一激活的界面：标题栏显示界面名与服务器地址，
//! 主体按界面区分（引导、连接中、等待、指令 + Done、完成中、错误），底部为快捷键提示。

use chrono::{DateTime, Local};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use unicode_width::UnicodeWidthChar;

use crate::core::{Instruction, Screen, UiState};

/// 将内容按显示宽度换行（中日韩字符占两列），每行都不超过 width 列
fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    for para in s.split('\n') {
        let mut line = String::new();
        let mut used = 0usize;
        for ch in para.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if used + w > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(ch);
            used += w;
        }
        lines.push(line);
    }
    lines
}

/// 按实际可用宽度重新折行；每行沿用首个 span 的样式
fn reflow(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let style = line.spans.first().map(|span| span.style).unwrap_or_default();
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        for part in wrap_text(&text, width) {
            out.push(Line::from(Span::styled(part, style)));
        }
    }
    out
}

/// 毫秒时间戳转本地时间 HH:MM:SS；非法值返回 None
fn format_timestamp(millis: u64) -> Option<String> {
    let millis = i64::try_from(millis).ok()?;
    let utc = DateTime::from_timestamp_millis(millis)?;
    Some(utc.with_timezone(&Local).format("%H:%M:%S").to_string())
}

fn screen_title(state: &UiState) -> String {
    let name = match state.screen {
        Screen::Onboarding => "Welcome",
        Screen::Connecting => "Connecting",
        Screen::Idle => "Idle",
        Screen::InstructionShown => "Instruction",
        Screen::Completing => "Completing",
        Screen::Error => "Error",
    };
    match &state.endpoint {
        Some(endpoint) => format!(" HCP │ {} │ {} ", name, endpoint),
        None => format!(" HCP │ {} ", name),
    }
}

fn hint(screen: Screen) -> &'static str {
    match screen {
        Screen::Onboarding => " Enter start │ q quit ",
        Screen::InstructionShown => " Enter/Space done │ q quit ",
        _ => " q/Esc quit ",
    }
}

fn accent(screen: Screen) -> Color {
    match screen {
        Screen::Error => Color::Red,
        Screen::InstructionShown => Color::Green,
        Screen::Completing => Color::Cyan,
        _ => Color::Yellow,
    }
}

fn body_lines(state: &UiState) -> Vec<Line<'static>> {
    match state.screen {
        Screen::Onboarding => vec![
            Line::from(Span::styled(
                "Ready to perform?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Instructions will appear here."),
            Line::from(Span::styled(
                "Press Enter to start",
                Style::default().fg(Color::Yellow),
            )),
        ],
        Screen::Connecting => {
            let mut lines = vec![Line::from("Connecting to server...")];
            if let Some(progress) = state.reconnect {
                lines.push(Line::from(Span::styled(
                    format!("Reconnecting... ({}/{})", progress.attempt, progress.max),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines
        }
        Screen::Idle => vec![
            Line::from("Connected"),
            Line::from(Span::styled(
                "Waiting for instructions",
                Style::default().fg(Color::DarkGray),
            )),
        ],
        Screen::InstructionShown => match &state.instruction {
            Some(instruction) => instruction_lines(instruction, state.action_enabled),
            None => Vec::new(),
        },
        Screen::Completing => vec![Line::from(Span::styled(
            "✓ Done",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))],
        Screen::Error => {
            let message = state.error_message.as_deref().unwrap_or("Unknown error");
            let mut lines = vec![Line::from(Span::styled(
                "Connection error",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))];
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(Color::Red),
            )));
            lines
        }
    }
}

fn instruction_lines(instruction: &Instruction, action_enabled: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        instruction.text.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    if let Some(time) = instruction.timestamp.and_then(format_timestamp) {
        lines.push(Line::from(Span::styled(
            time,
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    // 防抖期间按钮置灰
    let button_style = if action_enabled {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    lines.push(Line::from(Span::styled("[ Done ]", button_style)));
    lines
}

/// 内容垂直居中
fn centered(area: Rect, height: u16) -> Rect {
    let top = area.height.saturating_sub(height) / 2;
    Rect {
        x: area.x,
        y: area.y + top,
        width: area.width,
        height: height.min(area.height),
    }
}

/// 绘制一帧
pub fn draw(f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5)])
        .split(f.area());
    let area = chunks[0];
    let color = accent(state.screen);

    let block = Block::default()
        .title(screen_title(state))
        .title_bottom(Line::from(Span::styled(
            hint(state.screen),
            Style::default().fg(Color::DarkGray),
        )))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let inner = block.inner(area);
    f.render_widget(block, area);

    // 已按 inner 宽度折好行，Paragraph 不再二次折行，行数即高度
    let lines = reflow(body_lines(state), inner.width as usize);
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(Text::from(lines)).alignment(Alignment::Center);
    f.render_widget(paragraph, centered(inner, height));
}
