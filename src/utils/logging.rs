/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::models::{SubmissionPayload, Violation};

/// 初始化 tracing 订阅器
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug 或 info。
/// 重复调用不会报错（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `api_base_url`: 后端地址
/// - `max_violations`: 强制交卷的违规次数
pub fn log_startup(api_base_url: &str, max_violations: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 监考答题客户端");
    info!("🌐 后端地址: {}", api_base_url);
    info!("🛡️ 违规上限: {} 次", max_violations);
    info!("{}", "=".repeat(60));
}

/// 记录会话开始信息
pub fn log_session_started(prefix: &str, items: usize, allotted_secs: u32) {
    info!("\n{}", "─".repeat(60));
    info!("{} 📝 考试开始: 共 {} 题, 限时 {}", prefix, items, format_remaining(allotted_secs));
    info!("{}", "─".repeat(60));
}

/// 记录一次违规
pub fn log_violation(prefix: &str, violation: &Violation, total: usize, max: usize) {
    warn!(
        "{} ⚠️ 违规: {} (累计 {}/{})",
        prefix,
        violation.kind.wire_name(),
        total,
        max
    );
}

/// 打印最终交卷信息
pub fn print_final_stats(payload: &SubmissionPayload) {
    info!("\n{}", "=".repeat(60));
    info!("📊 交卷完成");
    info!("完成时间: {}", completion_time(payload));
    info!("{}", "=".repeat(60));
    info!("👤 学生: {} ({})", payload.student_name, payload.group);
    info!("📄 作答题目: {}", payload.answers.len());
    info!("⚠️ 违规记录: {}", payload.warnings.len());
    info!("🤖 自动交卷: {}", if payload.auto_submitted { "是" } else { "否" });
    info!("{}", "=".repeat(60));
}

/// 交卷时间取自答卷的 `endTime`，与请求体一致
pub fn completion_time(payload: &SubmissionPayload) -> String {
    payload.end_time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// 记录提交请求结果
pub fn log_dispatch_result(prefix: &str, result: &crate::error::AppResult<()>) {
    match result {
        Ok(()) => info!("{} ✓ 答卷已送达后端", prefix),
        Err(e) => error!("{} ❌ 答卷发送失败（不重试）: {}", prefix, e),
    }
}

/// 将剩余秒数格式化为 `MM:SS`
pub fn format_remaining(remaining_secs: u32) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(59), "00:59");
        assert_eq!(format_remaining(600), "10:00");
        assert_eq!(format_remaining(1805), "30:05");
    }

    #[test]
    fn test_completion_time_follows_payload_end_time() {
        use chrono::TimeZone;

        let end = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 5).unwrap();
        let payload = SubmissionPayload {
            session_name: "Весна".to_string(),
            exam_session_id: uuid::Uuid::nil(),
            student_name: "Иванов Иван".to_string(),
            group: "невролог".to_string(),
            start_time: end - chrono::Duration::minutes(30),
            end_time: end,
            warnings: Vec::new(),
            answers: Default::default(),
            auto_submitted: true,
        };
        assert_eq!(completion_time(&payload), "2026-03-01 09:30:05 UTC");
    }

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("Амитриптилин", 4), "Амит...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
