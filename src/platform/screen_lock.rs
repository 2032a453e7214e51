//! 屏幕常亮
//!
//! 平台能力：用户开始时申请，终端重新获得焦点时若未持有则再申请，退出时释放。
//! 平台不支持时静默成为空操作，不视为错误。

use std::process::Stdio;

use tokio::process::{Child, Command};

pub trait ScreenLock: Send {
    /// 申请常亮；返回是否已持有
    fn request(&mut self) -> bool;
    fn release(&mut self);
    fn is_held(&self) -> bool;
}

/// 空实现：平台无此能力
#[derive(Debug, Default)]
pub struct NoopScreenLock;

impl ScreenLock for NoopScreenLock {
    fn request(&mut self) -> bool {
        false
    }

    fn release(&mut self) {}

    fn is_held(&self) -> bool {
        false
    }
}

/// 通过 `systemd-inhibit` 子进程阻止空闲休眠；kill 子进程即释放
#[derive(Debug, Default)]
pub struct InhibitScreenLock {
    child: Option<Child>,
}

impl InhibitScreenLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScreenLock for InhibitScreenLock {
    fn request(&mut self) -> bool {
        if self.is_held() {
            return true;
        }
        let spawned = Command::new("systemd-inhibit")
            .args([
                "--what=idle:sleep",
                "--who=hcp-client",
                "--why=Waiting for stage instructions",
                "--mode=block",
                "sleep",
                "infinity",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        match spawned {
            Ok(child) => {
                tracing::info!("Wake lock acquired");
                self.child = Some(child);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Wake lock unavailable");
                false
            }
        }
    }

    fn release(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
            tracing::info!("Wake lock released");
        }
    }

    fn is_held(&self) -> bool {
        self.child.is_some()
    }
}

impl Drop for InhibitScreenLock {
    fn drop(&mut self) {
        self.release();
    }
}
