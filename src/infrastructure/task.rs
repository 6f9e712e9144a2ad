//! 后台定时任务句柄 - 基础设施层
//!
//! 持有 tokio 任务，只暴露"取消"能力

use tokio::task::JoinHandle;

/// 后台任务句柄
///
/// 职责：
/// - 唯一持有 `JoinHandle`
/// - `cancel()` 可重复调用
/// - 句柄被丢弃时同样终止任务
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn new(name: &'static str, handle: JoinHandle<()>) -> Self {
        Self {
            name,
            handle: Some(handle),
        }
    }

    /// 终止任务，之后不会再产生任何事件
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("已取消后台任务: {}", self.name);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let mut handle = TaskHandle::new("test", tokio::spawn(std::future::pending::<()>()));
        assert!(!handle.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
    }
}
