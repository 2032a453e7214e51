//! 平台能力（屏幕常亮等），缺失时静默降级

pub mod screen_lock;

pub use screen_lock::{InhibitScreenLock, NoopScreenLock, ScreenLock};
