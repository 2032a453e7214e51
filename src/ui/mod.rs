//! TUI 层：Ratatui + crossterm，状态控制器（controller）、主循环（app）、事件（event）、渲染（render）

pub mod app;
pub mod controller;
pub mod event;
pub mod render;

pub use app::run_app;
pub use controller::UiController;
pub use event::EventHandler;
pub use render::draw;
